//! HTTP client configuration.

use std::time::Duration;

use crate::error::TransportError;

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("idanalyzer-rust/", env!("CARGO_PKG_VERSION"));

/// Deadline for scan, vault and AML calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Deadline for verification session calls.
pub const SESSION_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared HTTP client configuration.
///
/// Per-call deadlines are set by each action; there is no retry setting.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Connection timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// User agent string.
    pub user_agent: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: Some(10),
            user_agent: Some(DEFAULT_USER_AGENT.to_owned()),
        }
    }
}

impl HttpClientConfig {
    /// Set the connection timeout in seconds.
    #[must_use]
    pub const fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = Some(secs);
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build a reqwest client with this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built (e.g. TLS backend
    /// initialisation failure).
    pub fn build_client(&self) -> Result<reqwest::Client, TransportError> {
        let mut builder = reqwest::Client::builder();

        if let Some(secs) = self.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        if let Some(ref user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        Ok(builder.build()?)
    }
}
