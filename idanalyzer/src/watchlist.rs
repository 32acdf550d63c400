//! AML/PEP watchlist screening.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::client::{ApiClient, ClientIdentity, DEFAULT_REQUEST_TIMEOUT, HttpTransport};
use crate::error::{Error, Result};
use crate::validate;

const AML_PATH: &str = "aml";

/// Source databases searched when none are selected explicitly.
pub const DEFAULT_AML_DATABASES: &str = "au_dfat,ca_dfatd,ch_seco,eu_fsf,fr_tresor_gels_avoir,gb_hmt,ua_sfms,un_sc,us_ofac,eu_cor,eu_meps,global_politicians,interpol_red";

/// Minimum length of a name query.
pub const MIN_NAME_LENGTH: usize = 3;

/// Minimum length of a document number query.
pub const MIN_DOCUMENT_NUMBER_LENGTH: usize = 5;

/// Kind of entity to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityType {
    /// Match any entity.
    #[default]
    Any,
    /// Natural persons only.
    Person,
    /// Companies and organizations only.
    LegalEntity,
}

impl EntityType {
    /// Wire value of the `entity` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "",
            Self::Person => "person",
            Self::LegalEntity => "legalentity",
        }
    }
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Ok(Self::Any),
            "person" => Ok(Self::Person),
            "legalentity" => Ok(Self::LegalEntity),
            _ => Err(Error::configuration(
                "entity type should be either empty, 'person' or 'legalentity'",
            )),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screening results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistMatches {
    /// Matched watchlist entries, as returned.
    #[serde(default)]
    pub items: Vec<Value>,
    /// Any other response fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WatchlistMatches {
    /// Returns `true` if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Builder for watchlist searches.
#[derive(Debug, Clone)]
pub struct WatchlistSearchConfig {
    client: ApiClient,
    database: String,
    entity: EntityType,
}

impl WatchlistSearchConfig {
    /// Create a watchlist client for an API key and region.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an empty key or region.
    pub fn new(api_key: impl Into<String>, region: &str) -> Result<Self> {
        let identity = ClientIdentity::new(api_key, region)?;
        Ok(Self::from_client(ApiClient::with_default_transport(identity)?))
    }

    /// Create a watchlist client with an explicit transport.
    #[must_use]
    pub fn with_transport(identity: ClientIdentity, transport: Arc<dyn HttpTransport>) -> Self {
        Self::from_client(ApiClient::new(identity, transport))
    }

    fn from_client(client: ApiClient) -> Self {
        Self {
            client,
            database: DEFAULT_AML_DATABASES.to_owned(),
            entity: EntityType::Any,
        }
    }

    /// Selected databases, comma separated.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Selected entity type.
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        self.entity
    }

    /// Search only these databases, comma separated; empty searches all.
    pub fn set_aml_database(&mut self, databases: &str) -> &mut Self {
        databases.clone_into(&mut self.database);
        self
    }

    /// Match only `"person"`, only `"legalentity"`, or anything (`""`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for any other value.
    pub fn set_entity_type(&mut self, entity_type: &str) -> Result<&mut Self> {
        self.entity = entity_type.parse()?;
        Ok(self)
    }

    /// Search by name, optionally narrowed by nationality and birthday.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for a name shorter than
    /// [`MIN_NAME_LENGTH`] or a malformed birthday, before any request.
    pub async fn search_by_name(
        &self,
        name: &str,
        country: Option<&str>,
        dob: Option<&str>,
    ) -> Result<WatchlistMatches> {
        if name.chars().count() < MIN_NAME_LENGTH {
            return Err(Error::configuration(format!(
                "name should contain at least {MIN_NAME_LENGTH} characters"
            )));
        }
        self.search("name", name, country, dob).await
    }

    /// Search by document or ID number, optionally narrowed by nationality and birthday.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for a number shorter than
    /// [`MIN_DOCUMENT_NUMBER_LENGTH`] or a malformed birthday, before any request.
    pub async fn search_by_id_number(
        &self,
        document_number: &str,
        country: Option<&str>,
        dob: Option<&str>,
    ) -> Result<WatchlistMatches> {
        if document_number.chars().count() < MIN_DOCUMENT_NUMBER_LENGTH {
            return Err(Error::configuration(format!(
                "document number should contain at least {MIN_DOCUMENT_NUMBER_LENGTH} characters"
            )));
        }
        self.search("documentnumber", document_number, country, dob)
            .await
    }

    #[instrument(skip(self, query, dob), fields(base_url = %self.client.identity().base_url()))]
    async fn search(
        &self,
        field: &str,
        query: &str,
        country: Option<&str>,
        dob: Option<&str>,
    ) -> Result<WatchlistMatches> {
        let dob = dob.unwrap_or_default();
        if !dob.is_empty() {
            validate::date_of_birth(dob)?;
        }

        let mut payload = Map::new();
        payload.insert("database".into(), Value::from(self.database.as_str()));
        payload.insert("entity".into(), Value::from(self.entity.as_str()));
        payload.insert(field.into(), Value::from(query));
        payload.insert("country".into(), Value::from(country.unwrap_or_default()));
        payload.insert("dob".into(), Value::from(dob));

        let body = self
            .client
            .post(AML_PATH, payload, DEFAULT_REQUEST_TIMEOUT)
            .await?;
        let matches: WatchlistMatches = serde_json::from_value(body)?;
        debug!(matches = matches.items.len(), "watchlist search complete");
        Ok(matches)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::MockTransport;
    use serde_json::json;

    fn watchlist(reply: Value) -> (WatchlistSearchConfig, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new().with_response(reply));
        let identity = ClientIdentity::new("test-key", "US").unwrap();
        (
            WatchlistSearchConfig::with_transport(identity, transport.clone()),
            transport,
        )
    }

    #[test]
    fn test_entity_type() {
        let (mut aml, _) = watchlist(json!({}));
        aml.set_entity_type("legalentity").unwrap();
        assert_eq!(aml.entity_type(), EntityType::LegalEntity);
        assert!(aml.set_entity_type("company").is_err());
        assert_eq!(aml.entity_type(), EntityType::LegalEntity);
        aml.set_entity_type("").unwrap();
        assert_eq!(aml.entity_type(), EntityType::Any);
    }

    #[tokio::test]
    async fn test_short_queries_fail_locally() {
        let (aml, transport) = watchlist(json!({}));
        assert!(aml.search_by_name("Jo", None, None).await.is_err());
        assert!(aml.search_by_id_number("1234", None, None).await.is_err());
        assert!(
            aml.search_by_name("Joe Biden", None, Some("1942-11-20"))
                .await
                .is_err()
        );
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_minimum_length_queries_are_sent() {
        let transport = Arc::new(
            MockTransport::new()
                .with_response(json!({ "items": [] }))
                .with_response(json!({ "items": [] })),
        );
        let identity = ClientIdentity::new("test-key", "US").unwrap();
        let aml = WatchlistSearchConfig::with_transport(identity, transport.clone());

        aml.search_by_name("Joe", None, None).await.unwrap();
        assert_eq!(transport.last_request().unwrap().body["name"], json!("Joe"));

        aml.search_by_id_number("12345", None, None).await.unwrap();
        assert_eq!(
            transport.last_request().unwrap().body["documentnumber"],
            json!("12345")
        );
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_search_by_name_payload() {
        let (mut aml, transport) = watchlist(json!({ "items": [{ "fullname": ["Joe Biden"] }] }));
        aml.set_aml_database("global_politicians,eu_meps");
        let matches = aml
            .search_by_name("Joe Biden", Some("US"), None)
            .await
            .unwrap();
        assert_eq!(matches.items.len(), 1);

        let request = transport.last_request().unwrap();
        assert_eq!(request.url, "https://api.idanalyzer.com/aml");
        assert_eq!(
            request.body,
            json!({
                "apikey": "test-key",
                "database": "global_politicians,eu_meps",
                "entity": "",
                "name": "Joe Biden",
                "country": "US",
                "dob": "",
            })
        );
    }

    #[tokio::test]
    async fn test_search_by_id_number_without_items() {
        let (aml, transport) = watchlist(json!({ "note": "no match" }));
        let matches = aml
            .search_by_id_number("AALH750218HBCLPC02", None, None)
            .await
            .unwrap();
        assert!(matches.is_empty());
        assert_eq!(matches.extra["note"], json!("no match"));
        let body = transport.last_request().unwrap().body;
        assert_eq!(body["documentnumber"], json!("AALH750218HBCLPC02"));
        assert_eq!(body["database"], json!(DEFAULT_AML_DATABASES));
    }
}
