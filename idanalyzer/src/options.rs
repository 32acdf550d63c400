//! Option types shared by the scan and verification session builders.
//!
//! Groups that only exist in the current schema are held as `Option<_>` in
//! the owning builder and flattened into the request, so a legacy-schema
//! builder leaves them out until a setter fills them in.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::validate;

/// Serialize `None` as an empty string, matching the service's "unset" marker.
pub(crate) fn blank_if_none<T, S>(
    value: &Option<T>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str(""),
    }
}

/// OCR accuracy level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accuracy {
    /// Fastest, least accurate.
    Fast,
    /// Balanced speed and accuracy.
    Balanced,
    /// Slowest, most accurate.
    #[default]
    Accurate,
}

impl TryFrom<u8> for Accuracy {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Fast),
            1 => Ok(Self::Balanced),
            2 => Ok(Self::Accurate),
            _ => Err(Error::configuration(
                "invalid accuracy, 0 = fast, 1 = balanced, 2 = accurate",
            )),
        }
    }
}

impl Serialize for Accuracy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(match self {
            Self::Fast => 0,
            Self::Balanced => 1,
            Self::Accurate => 2,
        })
    }
}

/// Document authentication module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthModule {
    /// Module 1.
    One,
    /// Module 2.
    Two,
    /// The quick module.
    Quick,
}

impl TryFrom<u8> for AuthModule {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            _ => Err(Error::configuration(
                "invalid authentication module, 1, 2 or 'quick' accepted",
            )),
        }
    }
}

impl FromStr for AuthModule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            "quick" => Ok(Self::Quick),
            _ => Err(Error::configuration(
                "invalid authentication module, 1, 2 or 'quick' accepted",
            )),
        }
    }
}

impl Serialize for AuthModule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::One => serializer.serialize_u8(1),
            Self::Two => serializer.serialize_u8(2),
            Self::Quick => serializer.serialize_str("quick"),
        }
    }
}

/// Format of cropped output images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Hosted image URL.
    #[default]
    Url,
    /// Inline base64.
    Base64,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "url" => Ok(Self::Url),
            "base64" => Ok(Self::Base64),
            _ => Err(Error::configuration(
                "invalid output format, 'url' or 'base64' accepted",
            )),
        }
    }
}

/// Output format of generated contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContractFormat {
    /// PDF document.
    #[default]
    Pdf,
    /// Word document.
    Docx,
    /// HTML page.
    Html,
}

impl FromStr for ContractFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PDF" => Ok(Self::Pdf),
            "DOCX" => Ok(Self::Docx),
            "HTML" => Ok(Self::Html),
            _ => Err(Error::configuration(
                "invalid contract format, PDF, DOCX or HTML accepted",
            )),
        }
    }
}

impl fmt::Display for ContractFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => write!(f, "PDF"),
            Self::Docx => write!(f, "DOCX"),
            Self::Html => write!(f, "HTML"),
        }
    }
}

/// Fields the service checks the document against. Empty means "don't check".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationTargets {
    /// Document or personal number.
    #[serde(rename = "verify_documentno")]
    pub document_number: String,
    /// Full name.
    #[serde(rename = "verify_name")]
    pub name: String,
    /// Date of birth, `YYYY/MM/DD`.
    #[serde(rename = "verify_dob")]
    pub dob: String,
    /// Age range, `min-max`.
    #[serde(rename = "verify_age")]
    pub age_range: String,
    /// Address.
    #[serde(rename = "verify_address")]
    pub address: String,
    /// Postcode.
    #[serde(rename = "verify_postcode")]
    pub postcode: String,
}

impl VerificationTargets {
    pub(crate) fn set_dob(&mut self, dob: &str) -> Result<()> {
        if !dob.is_empty() {
            validate::date_of_birth(dob)?;
        }
        dob.clone_into(&mut self.dob);
        Ok(())
    }

    pub(crate) fn set_age_range(&mut self, range: &str) -> Result<()> {
        if !range.is_empty() {
            validate::age_range(range)?;
        }
        range.clone_into(&mut self.age_range);
        Ok(())
    }
}

/// AML/PEP screening performed alongside a scan or session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AmlOptions {
    /// Screen the document holder against watchlists.
    #[serde(rename = "aml_check")]
    pub enabled: bool,
    /// Require exact name and birthday matches.
    #[serde(rename = "aml_strict_match")]
    pub strict_match: bool,
    /// Comma separated source database codes, empty means all.
    #[serde(rename = "aml_database")]
    pub database: String,
}

/// Contract generated from a template after a scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerateContract {
    /// Template ID, empty when no contract is requested.
    #[serde(rename = "contract_generate")]
    pub template_id: String,
    /// Output format.
    #[serde(rename = "contract_format", serialize_with = "blank_if_none")]
    pub format: Option<ContractFormat>,
    /// Values for template fields not read from the document.
    #[serde(rename = "contract_prefill_data", serialize_with = "blank_if_none")]
    pub prefill_data: Option<Map<String, Value>>,
}

/// Contract the user signs at the end of a verification session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignContract {
    /// Template ID, empty when no contract is requested.
    #[serde(rename = "contract_sign")]
    pub template_id: String,
    /// Output format.
    #[serde(rename = "contract_format", serialize_with = "blank_if_none")]
    pub format: Option<ContractFormat>,
    /// Values for template fields not read from the document.
    #[serde(rename = "contract_prefill_data", serialize_with = "blank_if_none")]
    pub prefill_data: Option<Map<String, Value>>,
}

/// Validate contract template arguments, returning the prefill object.
pub(crate) fn contract_args(template_id: &str, prefill_data: Value) -> Result<Map<String, Value>> {
    validate::required(template_id, "invalid template ID")?;
    match prefill_data {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(Error::configuration("contract prefill data must be a JSON object")),
    }
}

/// Free-form extra request parameters, merged after the typed options.
///
/// Keys owned by a typed option or by an action can't be set here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions(Map<String, Value>);

impl Extensions {
    /// Insert `key`, refusing keys present in `reserved`.
    pub(crate) fn insert(
        &mut self,
        key: &str,
        value: Value,
        reserved: &Map<String, Value>,
        action_keys: &[&str],
    ) -> Result<()> {
        if key.is_empty() {
            return Err(Error::configuration("parameter key must not be empty"));
        }
        if reserved.contains_key(key) || action_keys.contains(&key) {
            return Err(Error::configuration(format!(
                "'{key}' is a typed option, use its setter instead"
            )));
        }
        self.0.insert(key.to_owned(), value);
        Ok(())
    }

    /// Value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if no extension parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn merge_into(&self, target: &mut Map<String, Value>) {
        for (key, value) in &self.0 {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Serialize a typed options struct into a flat JSON object.
pub(crate) fn to_object<T: Serialize>(options: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(options)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::configuration(format!(
            "options serialized to a non-object value: {other}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_module_wire_values() {
        assert_eq!(serde_json::to_value(AuthModule::One).unwrap(), json!(1));
        assert_eq!(serde_json::to_value(AuthModule::Two).unwrap(), json!(2));
        assert_eq!(serde_json::to_value(AuthModule::Quick).unwrap(), json!("quick"));
        assert!(AuthModule::try_from(3).is_err());
        assert!("slow".parse::<AuthModule>().is_err());
    }

    #[test]
    fn test_accuracy_conversion() {
        assert_eq!(Accuracy::try_from(1).unwrap(), Accuracy::Balanced);
        assert!(Accuracy::try_from(3).is_err());
        assert_eq!(serde_json::to_value(Accuracy::default()).unwrap(), json!(2));
    }

    #[test]
    fn test_output_and_contract_formats() {
        assert_eq!("base64".parse::<OutputFormat>().unwrap(), OutputFormat::Base64);
        assert!("png".parse::<OutputFormat>().is_err());
        assert_eq!("docx".parse::<ContractFormat>().unwrap(), ContractFormat::Docx);
        assert_eq!(serde_json::to_value(ContractFormat::Html).unwrap(), json!("HTML"));
    }

    #[test]
    fn test_unset_contract_serializes_blank() {
        let map = to_object(&GenerateContract::default()).unwrap();
        assert_eq!(map["contract_generate"], json!(""));
        assert_eq!(map["contract_format"], json!(""));
        assert_eq!(map["contract_prefill_data"], json!(""));
    }

    #[test]
    fn test_verification_targets_validate_before_mutating() {
        let mut targets = VerificationTargets::default();
        targets.set_dob("1990/01/01").unwrap();
        assert!(targets.set_dob("01/01/1990").is_err());
        assert_eq!(targets.dob, "1990/01/01");
        targets.set_dob("").unwrap();
        assert!(targets.dob.is_empty());
    }

    #[test]
    fn test_contract_args() {
        assert!(contract_args("", json!({})).is_err());
        assert!(contract_args("tpl", json!([1])).is_err());
        assert_eq!(contract_args("tpl", Value::Null).unwrap(), Map::new());
    }

    #[test]
    fn test_extensions_refuse_reserved_keys() {
        let reserved = to_object(&AmlOptions::default()).unwrap();
        let mut ext = Extensions::default();
        assert!(ext.insert("aml_check", json!(true), &reserved, &[]).is_err());
        assert!(ext.insert("apikey", json!("x"), &reserved, &["apikey"]).is_err());
        ext.insert("client", json!("rust-sdk"), &reserved, &["apikey"]).unwrap();
        assert_eq!(ext.get("client"), Some(&json!("rust-sdk")));
    }
}
