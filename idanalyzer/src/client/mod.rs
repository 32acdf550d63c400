//! Client identity and the shared request path.
//!
//! Every builder owns an [`ApiClient`]: the caller's [`ClientIdentity`] (API
//! key plus resolved endpoint) and an [`HttpTransport`]. [`ApiClient::post`]
//! is the single place where the API key is appended, the request is sent and
//! the reply is normalized into [`Result`].

mod config;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, warn};

pub use config::{
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT, HttpClientConfig, SESSION_REQUEST_TIMEOUT,
};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockTransport, RecordedRequest};
pub use transport::{HttpResponse, HttpTransport, RequestOptions, ReqwestTransport};

use crate::endpoint::{EndpointResolver, Region};
use crate::error::{Error, RemoteError, Result, TransportError, TransportErrorKind};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "IDANALYZER_API_KEY";

/// Environment variable holding the region code or custom endpoint.
pub const REGION_ENV: &str = "IDANALYZER_REGION";

/// API key and region of the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    api_key: Arc<str>,
    region: Region,
}

impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("api_key", &"[REDACTED]")
            .field("region", &self.region)
            .finish()
    }
}

impl ClientIdentity {
    /// Create an identity from an API key and a region code ("US", "EU") or
    /// a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if either argument is empty.
    pub fn new(api_key: impl Into<String>, region: &str) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::configuration("please provide an API key"));
        }
        Ok(Self {
            api_key: api_key.into(),
            region: region.parse()?,
        })
    }

    /// Create an identity from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `IDANALYZER_API_KEY` (required): the API key
    /// - `IDANALYZER_REGION` (optional): region code or custom URL, default "US"
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the API key is not set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| Error::configuration(format!("{API_KEY_ENV} is not set")))?;
        let region = std::env::var(REGION_ENV).unwrap_or_else(|_| "US".to_owned());
        Self::new(api_key, &region)
    }

    /// The API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The region.
    #[must_use]
    pub const fn region(&self) -> &Region {
        &self.region
    }

    /// Base URL the region resolves to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.region.base_url()
    }

    /// Full URL for an endpoint path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        EndpointResolver::join(self.base_url(), path)
    }
}

/// Identity plus transport, shared by all builders.
#[derive(Debug, Clone)]
pub struct ApiClient {
    identity: ClientIdentity,
    transport: Arc<dyn HttpTransport>,
}

impl ApiClient {
    /// Create a client from an identity and a transport.
    #[must_use]
    pub fn new(identity: ClientIdentity, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            identity,
            transport,
        }
    }

    /// Create a client that talks HTTP through [`ReqwestTransport`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_default_transport(identity: ClientIdentity) -> Result<Self> {
        Ok(Self::new(identity, Arc::new(ReqwestTransport::new()?)))
    }

    /// The caller identity.
    #[must_use]
    pub const fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// POST `payload` plus the API key to `path` and normalize the reply.
    ///
    /// A top-level `error` object fails the call even on HTTP 200. A non-2xx
    /// status without an error object is a transport failure.
    pub(crate) async fn post(
        &self,
        path: &str,
        mut payload: Map<String, Value>,
        timeout: Duration,
    ) -> Result<Value> {
        payload.insert("apikey".into(), Value::from(self.identity.api_key()));
        let url = self.identity.endpoint(path);
        debug!(url = %url, fields = payload.len(), "sending request");

        let options = RequestOptions::new().with_timeout(timeout);
        let response = self
            .transport
            .post(&url, &Value::Object(payload), &options)
            .await
            .inspect_err(|err| warn!(url = %url, error = %err, "request failed"))?;

        if let Some(err) = RemoteError::from_body(&response.body) {
            warn!(url = %url, code = %err.code, "service returned an error");
            return Err(err.into());
        }

        if !response.is_success() {
            let status = response.status;
            return Err(TransportError::new(
                TransportErrorKind::Status(status),
                format!("Connecting to API Server failed: HTTP {status}"),
            )
            .into());
        }

        debug!(url = %url, status = response.status, "request complete");
        Ok(response.body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::endpoint::US_BASE_URL;
    use serde_json::json;

    fn client(transport: &Arc<MockTransport>) -> ApiClient {
        let identity = ClientIdentity::new("test-key", "https://mock.local/").unwrap();
        ApiClient::new(identity, transport.clone())
    }

    #[test]
    fn test_identity_requires_key_and_region() {
        assert!(matches!(
            ClientIdentity::new("", "US"),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            ClientIdentity::new("key", ""),
            Err(Error::Configuration(_))
        ));
        let identity = ClientIdentity::new("key", "us").unwrap();
        assert_eq!(identity.base_url(), US_BASE_URL);
    }

    #[test]
    fn test_identity_debug_redacts_key() {
        let identity = ClientIdentity::new("super-secret", "EU").unwrap();
        let debug = format!("{identity:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[tokio::test]
    async fn test_post_appends_api_key() {
        let transport = Arc::new(MockTransport::new().with_response(json!({ "ok": 1 })));
        let body = client(&transport)
            .post("vault/get", Map::new(), DEFAULT_REQUEST_TIMEOUT)
            .await
            .unwrap();

        assert_eq!(body, json!({ "ok": 1 }));
        let request = transport.last_request().unwrap();
        assert_eq!(request.url, "https://mock.local/vault/get");
        assert_eq!(request.body["apikey"], "test-key");
        assert_eq!(request.timeout, Some(DEFAULT_REQUEST_TIMEOUT));
    }

    #[tokio::test]
    async fn test_error_object_fails_on_200() {
        let transport = Arc::new(MockTransport::new().with_response(
            json!({ "error": { "code": 8, "message": "Invalid vault entry" } }),
        ));
        let err = client(&transport)
            .post("vault/get", Map::new(), DEFAULT_REQUEST_TIMEOUT)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "8: Invalid vault entry");
    }

    #[tokio::test]
    async fn test_bad_status_without_error_object() {
        let transport = Arc::new(MockTransport::new().with_status(500, json!({})));
        let err = client(&transport)
            .post("", Map::new(), DEFAULT_REQUEST_TIMEOUT)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Transport(TransportError {
                kind: TransportErrorKind::Status(500),
                ..
            })
        ));
    }
}
