//! Vault record store.
//!
//! Every operation is a POST to `vault/<action>`; a reply carrying an
//! `error` object fails with [`Error::Remote`].

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::client::{ApiClient, ClientIdentity, DEFAULT_REQUEST_TIMEOUT, HttpTransport};
use crate::error::{Error, Result};
use crate::media::{InputResolver, MediaSlot};
use crate::options::to_object;
use crate::validate;

/// Maximum number of filter expressions in a [`ListQuery`].
pub const MAX_LIST_FILTERS: usize = 5;

/// Default number of candidates returned by [`RecordStoreClient::search_face`].
pub const DEFAULT_MAX_ENTRY: u32 = 10;

/// Default similarity threshold for [`RecordStoreClient::search_face`].
pub const DEFAULT_FACE_THRESHOLD: f64 = 0.5;

/// Sort direction for [`ListQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

/// Paging and filtering for [`RecordStoreClient::list`].
///
/// Filters are expressions such as `"createtime>=2021/02/25"` or
/// `"firstName=JOHN"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    /// Up to [`MAX_LIST_FILTERS`] filter expressions.
    pub filter: Vec<String>,
    /// Field to sort by.
    #[serde(rename = "orderby")]
    pub order_by: String,
    /// Sort direction.
    pub sort: SortOrder,
    /// Page size.
    pub limit: u32,
    /// Entries to skip.
    pub offset: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filter: Vec::new(),
            order_by: "createtime".to_owned(),
            sort: SortOrder::Desc,
            limit: 10,
            offset: 0,
        }
    }
}

impl ListQuery {
    /// Query with default ordering and paging.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter expression.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter.push(filter.into());
        self
    }

    /// Sort by `field` in `order`.
    #[must_use]
    pub fn with_order(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order_by = field.into();
        self.sort = order;
        self
    }

    /// Return `limit` entries after skipping `offset`.
    #[must_use]
    pub const fn with_page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// One or several vault entry IDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VaultIds {
    /// A single entry.
    One(String),
    /// Several entries.
    Many(Vec<String>),
}

impl VaultIds {
    fn check(&self) -> Result<()> {
        let valid = match self {
            Self::One(id) => !id.is_empty(),
            Self::Many(ids) => !ids.is_empty() && ids.iter().all(|id| !id.is_empty()),
        };
        if valid {
            Ok(())
        } else {
            Err(Error::configuration("vault entry ID required"))
        }
    }
}

impl From<&str> for VaultIds {
    fn from(id: &str) -> Self {
        Self::One(id.to_owned())
    }
}

impl From<String> for VaultIds {
    fn from(id: String) -> Self {
        Self::One(id)
    }
}

impl From<Vec<String>> for VaultIds {
    fn from(ids: Vec<String>) -> Self {
        Self::Many(ids)
    }
}

/// What an image added to a vault entry shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VaultImageKind {
    /// The identity document.
    #[default]
    Document,
    /// The person's face.
    Person,
}

impl VaultImageKind {
    const fn wire_value(self) -> u8 {
        match self {
            Self::Document => 0,
            Self::Person => 1,
        }
    }
}

/// Client for vault entries.
#[derive(Debug, Clone)]
pub struct RecordStoreClient {
    client: ApiClient,
}

impl RecordStoreClient {
    /// Create a vault client for an API key and region.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an empty key or region.
    pub fn new(api_key: impl Into<String>, region: &str) -> Result<Self> {
        let identity = ClientIdentity::new(api_key, region)?;
        Ok(Self {
            client: ApiClient::with_default_transport(identity)?,
        })
    }

    /// Create a vault client with an explicit transport.
    #[must_use]
    pub fn with_transport(identity: ClientIdentity, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            client: ApiClient::new(identity, transport),
        }
    }

    /// Fetch one entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an empty ID, otherwise any
    /// round-trip failure.
    pub async fn get(&self, id: &str) -> Result<Value> {
        validate::required(id, "vault entry ID required")?;
        self.call("get", object([("id", Value::from(id))])).await
    }

    /// List entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for more than [`MAX_LIST_FILTERS`]
    /// filters, before any request.
    pub async fn list(&self, query: &ListQuery) -> Result<Value> {
        if query.filter.len() > MAX_LIST_FILTERS {
            return Err(Error::configuration(format!(
                "at most {MAX_LIST_FILTERS} filters accepted"
            )));
        }
        self.call("list", to_object(query)?).await
    }

    /// Update fields of an entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an empty ID or empty `data`.
    pub async fn update(&self, id: &str, mut data: Map<String, Value>) -> Result<Value> {
        validate::required(id, "vault entry ID required")?;
        if data.is_empty() {
            return Err(Error::configuration("data required"));
        }
        data.insert("id".into(), Value::from(id));
        self.call("update", data).await
    }

    /// Delete one or several entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no ID, or an empty ID, is given.
    pub async fn delete(&self, ids: impl Into<VaultIds>) -> Result<Value> {
        let ids = ids.into();
        ids.check()?;
        self.call("delete", object([("id", serde_json::to_value(ids)?)]))
            .await
    }

    /// Attach an image to an entry. `image` is a URL, a local path or base64.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an empty ID and
    /// [`Error::InvalidMediaInput`] for an unusable image.
    pub async fn add_image(&self, id: &str, image: &str, kind: VaultImageKind) -> Result<Value> {
        validate::required(id, "vault entry ID required")?;
        let media = InputResolver::resolve(image, MediaSlot::VaultImage)?;
        let payload = object([
            ("id", Value::from(id)),
            ("type", Value::from(kind.wire_value())),
            (media.field, Value::String(media.value)),
        ]);
        self.call("addimage", payload).await
    }

    /// Remove an image from an entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if either ID is empty.
    pub async fn delete_image(&self, vault_id: &str, image_id: &str) -> Result<Value> {
        validate::required(vault_id, "vault entry ID required")?;
        validate::required(image_id, "image ID required")?;
        let payload = object([
            ("id", Value::from(vault_id)),
            ("imageid", Value::from(image_id)),
        ]);
        self.call("deleteimage", payload).await
    }

    /// Find entries whose face matches `image`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for a zero `max_entry` or a threshold
    /// outside 0..=1, and [`Error::InvalidMediaInput`] for an unusable image.
    pub async fn search_face(&self, image: &str, max_entry: u32, threshold: f64) -> Result<Value> {
        if max_entry == 0 {
            return Err(Error::configuration("max entry must be at least 1"));
        }
        validate::unit_interval(threshold, "threshold")?;
        let media = InputResolver::resolve(image, MediaSlot::VaultImage)?;
        let payload = object([
            ("maxentry", Value::from(max_entry)),
            ("threshold", Value::from(threshold)),
            (media.field, Value::String(media.value)),
        ]);
        self.call("searchface", payload).await
    }

    /// Start training the face search index.
    ///
    /// # Errors
    ///
    /// Returns any round-trip failure.
    pub async fn train_face(&self) -> Result<Value> {
        self.call("train", Map::new()).await
    }

    /// Progress of face index training.
    ///
    /// # Errors
    ///
    /// Returns any round-trip failure.
    pub async fn training_status(&self) -> Result<Value> {
        self.call("trainstatus", Map::new()).await
    }

    /// POST `payload` to `vault/<action>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] or [`Error::Remote`].
    #[instrument(skip(self, payload), fields(base_url = %self.client.identity().base_url()))]
    pub async fn call(&self, action: &str, payload: Map<String, Value>) -> Result<Value> {
        self.client
            .post(&format!("vault/{action}"), payload, DEFAULT_REQUEST_TIMEOUT)
            .await
    }
}

fn object<const N: usize>(fields: [(&str, Value); N]) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}
