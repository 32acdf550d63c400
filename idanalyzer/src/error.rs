//! Unified error types for the client.
//!
//! Every fallible operation in this crate returns [`Error`]. Setter and
//! constructor validation failures surface as [`Error::Configuration`] before
//! any network activity; failures of the round trip itself are split into
//! [`TransportError`] (the request never produced a usable reply) and
//! [`RemoteError`] (the service answered with a structured `error` object).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the client.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An invalid setter or constructor argument.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A media argument could not be classified, or mandatory media is missing.
    #[error("invalid media input: {0}")]
    InvalidMediaInput(String),

    /// Video biometrics were requested without a 4 digit passcode.
    #[error("please provide a 4 digit passcode for video biometric verification")]
    InvalidPasscode,

    /// The HTTP round trip did not complete.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service returned a structured error object.
    #[error("{0}")]
    Remote(#[from] RemoteError),

    /// Reading a local media file failed after it was classified.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid media input error with a message.
    #[must_use]
    pub fn invalid_media(msg: impl Into<String>) -> Self {
        Self::InvalidMediaInput(msg.into())
    }

    /// Returns `true` if this error was raised locally, before any request.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::InvalidMediaInput(_) | Self::InvalidPasscode
        )
    }
}

/// Structured error object returned by the service, `{ "error": { code, message } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RemoteError {
    /// Service error code.
    #[serde(deserialize_with = "code_as_string")]
    pub code: String,
    /// Human readable message.
    #[serde(default)]
    pub message: String,
}

impl RemoteError {
    /// Create a remote error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Extract the `error` object from a response body, if present.
    ///
    /// `null`, `false`, `""` and `0` mean no error.
    #[must_use]
    pub fn from_body(body: &serde_json::Value) -> Option<Self> {
        let error = body.get("error")?;
        let unset = match error {
            serde_json::Value::Null => true,
            serde_json::Value::Bool(b) => !b,
            serde_json::Value::String(s) => s.is_empty(),
            serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
            _ => false,
        };
        if unset {
            return None;
        }
        Some(
            Self::deserialize(error)
                .unwrap_or_else(|_| Self::new("unknown", error.to_string())),
        )
    }
}

/// The service sends numeric codes; accept either form.
fn code_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Transport-level error (timeouts, connectivity, unexpected HTTP status).
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    /// Broad classification of the failure.
    pub kind: TransportErrorKind,
    /// Description of the failure.
    pub message: String,
    /// Underlying cause, when one exists.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl TransportError {
    /// Create a transport error without an underlying cause.
    #[must_use]
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    /// Returns `true` if the request hit its deadline.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, TransportErrorKind::Timeout)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_decode() {
            TransportErrorKind::Decode
        } else if let Some(status) = err.status() {
            TransportErrorKind::Status(status.as_u16())
        } else {
            TransportErrorKind::Other
        };
        Self {
            kind,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Broad transport error kinds for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportErrorKind {
    /// The per-call deadline elapsed.
    Timeout,
    /// The connection could not be established.
    Connect,
    /// The server answered with a non-success status and no error object.
    Status(u16),
    /// The response body could not be decoded.
    Decode,
    /// Anything else.
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Connect => write!(f, "connect"),
            Self::Status(status) => write!(f, "HTTP {status}"),
            Self::Decode => write!(f, "decode"),
            Self::Other => write!(f, "transport"),
        }
    }
}
