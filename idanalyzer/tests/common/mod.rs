//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use idanalyzer::ClientIdentity;
use idanalyzer::client::MockTransport;
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use wiremock::MockServer;

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once, filtered by `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// Identity whose custom region points at the mock server.
pub fn identity_for(server: &MockServer) -> ClientIdentity {
    ClientIdentity::new("test-key", &server.uri()).expect("identity should build")
}

/// In-memory transport answering each call with the next of `replies`.
pub fn mock_transport(replies: impl IntoIterator<Item = Value>) -> Arc<MockTransport> {
    Arc::new(
        replies
            .into_iter()
            .fold(MockTransport::new(), MockTransport::with_response),
    )
}
