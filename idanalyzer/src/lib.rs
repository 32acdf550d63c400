#![cfg_attr(docsrs, feature(doc_cfg))]
//! Async client for the ID Analyzer identity verification service.
//!
//! Four independent builders cover the service:
//!
//! - [`DocumentScanConfig`]: document OCR, authentication and face matching
//! - [`VerificationSessionConfig`]: hosted verification and e-signature sessions
//! - [`RecordStoreClient`]: vault entries and face search
//! - [`WatchlistSearchConfig`]: AML/PEP screening
//!
//! Each builder validates its setters locally and sends one JSON POST per
//! action through an [`HttpTransport`](client::HttpTransport).
//!
//! ```rust,ignore
//! use idanalyzer::prelude::*;
//!
//! let mut session = VerificationSessionConfig::new("API_KEY", "ACME", "EU")?;
//! session.set_callback_url("https://www.example.com/callback")?;
//! let descriptor = session.create_mobile().await?;
//! println!("{} {}", descriptor.reference, descriptor.url);
//! ```

pub mod client;
pub mod endpoint;
pub mod error;
pub mod media;
pub mod options;
pub mod prelude;
pub mod scan;
pub mod session;
pub mod validate;
pub mod vault;
pub mod watchlist;

pub use client::{ApiClient, ClientIdentity};
pub use endpoint::{ApiVersion, Region};
pub use error::{Error, RemoteError, Result, TransportError, TransportErrorKind};
pub use scan::{DocumentScanConfig, ScanRequest};
pub use session::{SessionDescriptor, VerificationSessionConfig};
pub use vault::{ListQuery, RecordStoreClient, VaultIds};
pub use watchlist::{WatchlistMatches, WatchlistSearchConfig};
