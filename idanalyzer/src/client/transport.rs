//! HTTP transport abstraction.
//!
//! The builders only depend on [`HttpTransport`]: a single JSON POST with a
//! per-call deadline. [`ReqwestTransport`] is the production implementation.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;

use super::config::HttpClientConfig;
use crate::error::{TransportError, TransportErrorKind};

/// Per-call request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Deadline for the whole round trip.
    pub timeout: Option<Duration>,
    /// Extra headers sent with the request.
    pub headers: HeaderMap,
}

impl RequestOptions {
    /// Create empty request options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-call deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the extra headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Raw reply from the transport: status code and decoded JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded body, `Value::Null` when the body was empty.
    pub body: Value,
}

impl HttpResponse {
    /// Create a response.
    #[must_use]
    pub const fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// The HTTP collaborator consumed by every builder.
///
/// Implementations perform exactly one POST per call and must not retry.
#[async_trait]
pub trait HttpTransport: Debug + Send + Sync {
    /// POST `body` as JSON to `url`.
    async fn post(
        &self,
        url: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the default [`HttpClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(&HttpClientConfig::default())
    }

    /// Create a transport from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_config(config: &HttpClientConfig) -> Result<Self, TransportError> {
        Ok(Self {
            http_client: config.build_client()?,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    #[must_use]
    pub const fn from_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<HttpResponse, TransportError> {
        let mut request = self
            .http_client
            .post(url)
            .headers(options.headers.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(body);

        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        if bytes.is_empty() {
            return Ok(HttpResponse::new(status, Value::Null));
        }

        match serde_json::from_slice(&bytes) {
            Ok(body) => Ok(HttpResponse::new(status, body)),
            // An HTML error page from a proxy is still a status failure.
            Err(_) if !(200..300).contains(&status) => Err(TransportError::new(
                TransportErrorKind::Status(status),
                format!("Connecting to API Server failed: HTTP {status}"),
            )),
            Err(err) => Err(TransportError::new(
                TransportErrorKind::Decode,
                "response body is not valid JSON",
            )
            .with_source(err)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_posts_json_and_decodes_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "apikey": "k" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .post(
                &format!("{}/echo", server.uri()),
                &json!({ "apikey": "k" }),
                &RequestOptions::new(),
            )
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_non_json_error_page_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let err = transport
            .post(&server.uri(), &json!({}), &RequestOptions::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind, TransportErrorKind::Status(502));
    }

    #[tokio::test]
    async fn test_deadline_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let options = RequestOptions::new().with_timeout(Duration::from_millis(50));
        let err = transport
            .post(&server.uri(), &json!({}), &options)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
    }

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, Value::Null).is_success());
        assert!(!HttpResponse::new(404, Value::Null).is_success());
    }
}
