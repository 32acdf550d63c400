//! Common imports for working with the builders.

pub use crate::client::{ClientIdentity, HttpTransport, ReqwestTransport};
pub use crate::endpoint::ApiVersion;
pub use crate::error::{Error, Result};
pub use crate::options::{AuthModule, ContractFormat, OutputFormat};
pub use crate::scan::{DocumentScanConfig, ScanRequest};
pub use crate::session::{SessionDescriptor, SessionKind, VerificationSessionConfig};
pub use crate::vault::{ListQuery, RecordStoreClient, SortOrder, VaultIds, VaultImageKind};
pub use crate::watchlist::{EntityType, WatchlistMatches, WatchlistSearchConfig};
