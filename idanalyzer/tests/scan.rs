//! Document scan requests against a mock HTTP server.

mod common;

use std::io::Write;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use idanalyzer::client::ReqwestTransport;
use idanalyzer::options::AuthModule;
use idanalyzer::{DocumentScanConfig, Error, ScanRequest, TransportErrorKind};
use serde_json::json;
use tempfile::NamedTempFile;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scanner_for(server: &MockServer) -> DocumentScanConfig {
    let transport = ReqwestTransport::new().expect("transport should build");
    DocumentScanConfig::with_transport(common::identity_for(server), Arc::new(transport))
}

#[tokio::test]
async fn scan_with_url_primary_posts_url_and_key() {
    common::init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "url": "https://example.com/front.jpg",
            "apikey": "test-key",
            "authenticate": true,
            "authenticate_module": 2,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "documentNumber": "X1234" },
            "authentication": { "score": 0.9 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut scanner = scanner_for(&server);
    scanner.enable_authentication(true, AuthModule::Two);
    let reply = scanner
        .scan(ScanRequest::new("https://example.com/front.jpg"))
        .await
        .expect("scan should succeed");

    assert_eq!(reply["result"]["documentNumber"], "X1234");
    let requests = server.received_requests().await.unwrap_or_default();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json body");
    assert!(body.get("file_base64").is_none());
}

#[tokio::test]
async fn scan_encodes_local_files() {
    common::init_tracing();
    let server = MockServer::start().await;

    let mut front = NamedTempFile::new().expect("temp file");
    front.write_all(b"front-bytes").expect("write");
    let mut face = NamedTempFile::new().expect("temp file");
    face.write_all(b"face-bytes").expect("write");

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "file_base64": STANDARD.encode(b"front-bytes"),
            "face_base64": STANDARD.encode(b"face-bytes"),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": {} })))
        .expect(1)
        .mount(&server)
        .await;

    scanner_for(&server)
        .scan(
            ScanRequest::new(front.path().to_string_lossy())
                .with_biometric_photo(face.path().to_string_lossy()),
        )
        .await
        .expect("scan should succeed");
}

#[tokio::test]
async fn scan_error_object_on_200_is_remote_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "code": 9, "message": "No document found" }
        })))
        .mount(&server)
        .await;

    let err = scanner_for(&server)
        .scan(ScanRequest::new("https://example.com/blank.jpg"))
        .await
        .expect_err("error object should fail");

    match err {
        Error::Remote(remote) => {
            assert_eq!(remote.code, "9");
            assert_eq!(remote.message, "No document found");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn scan_http_failure_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
        .mount(&server)
        .await;

    let err = scanner_for(&server)
        .scan(ScanRequest::new("https://example.com/front.jpg"))
        .await
        .expect_err("503 should fail");

    assert!(matches!(
        err,
        Error::Transport(ref t) if t.kind == TransportErrorKind::Status(503)
    ));
}

#[tokio::test]
async fn scan_without_primary_never_reaches_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = scanner_for(&server)
        .scan(ScanRequest::default())
        .await
        .expect_err("missing primary should fail");
    assert!(err.is_local());
}
