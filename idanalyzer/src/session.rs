//! Hosted verification and e-signature sessions.
//!
//! A [`VerificationSessionConfig`] describes the session the service hosts
//! for the end user. Each `create_*` call returns a [`SessionDescriptor`]
//! with the reference code and the URL to hand out. Results arrive later at
//! the callback URL and should be checked with
//! [`VerificationSessionConfig::validate`] before being trusted.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::client::{ApiClient, ClientIdentity, HttpTransport, SESSION_REQUEST_TIMEOUT};
use crate::endpoint::ApiVersion;
use crate::error::{Error, Result};
use crate::options::{
    AmlOptions, AuthModule, ContractFormat, Extensions, OutputFormat, SignContract,
    VerificationTargets, blank_if_none, contract_args, to_object,
};
use crate::validate;

const CREATE_PATH: &str = "docupass/create";
const SIGN_PATH: &str = "docupass/sign";
const VALIDATE_PATH: &str = "docupass/validate";

/// Request fields written by the session actions themselves.
const SESSION_ACTION_KEYS: &[&str] = &["apikey", "type", "reference", "hash", "template_id"];

/// How the user reaches the hosted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Embedded in a web page as an iframe.
    Iframe,
    /// Opened on a phone, via link or QR code.
    Mobile,
    /// Opened in any browser, redirecting back when done.
    Redirection,
    /// Live capture on a phone.
    LiveMobile,
}

impl SessionKind {
    /// Wire value of the `type` field.
    #[must_use]
    pub const fn wire_value(self) -> u8 {
        match self {
            Self::Iframe => 0,
            Self::Mobile => 1,
            Self::Redirection => 2,
            Self::LiveMobile => 3,
        }
    }
}

/// Phone verification performed during the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhoneOptions {
    /// Ask the user for a phone number and verify it by SMS.
    #[serde(rename = "phoneverification")]
    pub enabled: bool,
    /// Number the user's phone must match, empty disables.
    pub verify_phone: String,
    /// Number the session link is sent to by SMS.
    pub sms_verification_link: String,
    /// Number the signed contract is sent to by SMS.
    pub sms_contract_link: String,
}

/// Typed session options, serialized as the flat request object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOptions {
    /// Company name shown to the user.
    #[serde(rename = "companyname")]
    pub company_name: String,
    /// Where results are posted.
    #[serde(rename = "callbackurl")]
    pub callback_url: String,
    /// 0 none, 1 photo, 2 video.
    pub biometric: u8,
    /// Minimum authentication score, 0 disables authentication.
    #[serde(rename = "authenticate_minscore")]
    pub authenticate_min_score: f64,
    /// Authentication module.
    pub authenticate_module: AuthModule,
    /// Attempts allowed per session.
    #[serde(rename = "maxattempt")]
    pub max_attempt: u8,
    /// Accepted document types.
    #[serde(rename = "documenttype")]
    pub document_type: String,
    /// Accepted issuing countries.
    #[serde(rename = "documentcountry")]
    pub document_country: String,
    /// Accepted issuing states.
    #[serde(rename = "documentregion")]
    pub document_region: String,
    /// Cross-check front and back of the document.
    #[serde(rename = "dualsidecheck")]
    pub dual_side_check: bool,
    /// Reject expired documents.
    pub verify_expiry: bool,
    /// Values checked against the document.
    #[serde(flatten)]
    pub targets: VerificationTargets,
    /// Redirect target after success.
    #[serde(rename = "successredir")]
    pub success_redirect: String,
    /// Redirect target after failure.
    #[serde(rename = "failredir")]
    pub fail_redirect: String,
    /// Caller reference echoed back in the callback.
    #[serde(rename = "customid")]
    pub custom_id: String,
    /// Save the result in the vault.
    #[serde(serialize_with = "blank_if_none")]
    pub vault_save: Option<bool>,
    /// Include the document image in the callback.
    #[serde(rename = "return_documentimage", serialize_with = "blank_if_none")]
    pub return_document_image: Option<bool>,
    /// Include the face image in the callback.
    #[serde(rename = "return_faceimage", serialize_with = "blank_if_none")]
    pub return_face_image: Option<bool>,
    /// 0 base64, 1 URL.
    #[serde(serialize_with = "blank_if_none")]
    pub return_type: Option<u8>,
    /// QR code foreground, hex.
    pub qr_color: String,
    /// QR code background, hex.
    pub qr_bgcolor: String,
    /// QR code module size.
    #[serde(serialize_with = "blank_if_none")]
    pub qr_size: Option<u8>,
    /// QR code margin.
    #[serde(serialize_with = "blank_if_none")]
    pub qr_margin: Option<u8>,
    /// Message on the first page.
    #[serde(rename = "welcomemessage")]
    pub welcome_message: String,
    /// Hide the service's branding.
    #[serde(rename = "nobranding", serialize_with = "blank_if_none")]
    pub no_branding: Option<bool>,
    /// Logo URL.
    pub logo: String,
    /// Interface language, empty means detect.
    pub language: String,
    /// Minimum face similarity.
    pub biometric_threshold: f64,
    /// One URL for any number of users.
    pub reusable: bool,
    /// AML screening, current schema only until set.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub aml: Option<AmlOptions>,
    /// Phone verification, current schema only until set.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub phone: Option<PhoneOptions>,
    /// Custom page template URL, current schema only until set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_html_url: Option<String>,
    /// Contract signed at the end, current schema only until set.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub contract: Option<SignContract>,
}

impl SessionOptions {
    /// Default option table for `version`.
    #[must_use]
    pub fn defaults(version: ApiVersion, company_name: &str) -> Self {
        let current = version.is_current();
        Self {
            company_name: company_name.to_owned(),
            callback_url: String::new(),
            biometric: 0,
            authenticate_min_score: 0.0,
            authenticate_module: AuthModule::Two,
            max_attempt: 1,
            document_type: String::new(),
            document_country: String::new(),
            document_region: String::new(),
            dual_side_check: false,
            verify_expiry: current,
            targets: VerificationTargets::default(),
            success_redirect: String::new(),
            fail_redirect: String::new(),
            custom_id: String::new(),
            vault_save: None,
            return_document_image: None,
            return_face_image: None,
            return_type: None,
            qr_color: String::new(),
            qr_bgcolor: String::new(),
            qr_size: None,
            qr_margin: None,
            welcome_message: String::new(),
            no_branding: None,
            logo: String::new(),
            language: String::new(),
            biometric_threshold: 0.4,
            reusable: false,
            aml: current.then(AmlOptions::default),
            phone: current.then(PhoneOptions::default),
            custom_html_url: current.then(String::new),
            contract: current.then(SignContract::default),
        }
    }
}

/// Session returned by the `create_*` actions.
///
/// Serializing it reproduces the response object field for field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    /// Session reference code.
    pub reference: String,
    /// URL to give to the user.
    pub url: String,
    /// QR code image URL, for the mobile kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qrcode: Option<String>,
    /// Any other response fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Builder for hosted verification sessions.
#[derive(Debug, Clone)]
pub struct VerificationSessionConfig {
    client: ApiClient,
    version: ApiVersion,
    options: SessionOptions,
    extensions: Extensions,
}

impl VerificationSessionConfig {
    /// Create a session builder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the API key, company name or region
    /// is empty.
    pub fn new(api_key: impl Into<String>, company_name: &str, region: &str) -> Result<Self> {
        let identity = ClientIdentity::new(api_key, region)?;
        Self::from_client(ApiClient::with_default_transport(identity)?, company_name)
    }

    /// Create a session builder with an explicit transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the company name is empty.
    pub fn with_transport(
        identity: ClientIdentity,
        transport: Arc<dyn HttpTransport>,
        company_name: &str,
    ) -> Result<Self> {
        Self::from_client(ApiClient::new(identity, transport), company_name)
    }

    fn from_client(client: ApiClient, company_name: &str) -> Result<Self> {
        validate::required(company_name, "please provide your company name")?;
        Ok(Self {
            client,
            version: ApiVersion::Current,
            options: SessionOptions::defaults(ApiVersion::Current, company_name),
            extensions: Extensions::default(),
        })
    }

    /// Switch schema version, resetting every option to that version's defaults.
    #[must_use]
    pub fn with_version(mut self, version: ApiVersion) -> Self {
        self.version = version;
        self.reset_config();
        self
    }

    /// Current options.
    #[must_use]
    pub const fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Extra parameters set through [`Self::set_parameter`].
    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Reset all options to defaults, keeping the company name.
    pub fn reset_config(&mut self) -> &mut Self {
        let company_name = std::mem::take(&mut self.options.company_name);
        self.options = SessionOptions::defaults(self.version, &company_name);
        self.extensions = Extensions::default();
        self
    }

    /// Attempts the user gets, 1 to 10.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] outside 1..=10.
    pub fn set_max_attempt(&mut self, max_attempt: u8) -> Result<&mut Self> {
        if !(1..=10).contains(&max_attempt) {
            return Err(Error::configuration(
                "invalid max attempt, please specify integer between 1 to 10",
            ));
        }
        self.options.max_attempt = max_attempt;
        Ok(self)
    }

    /// Reference echoed back in the callback.
    pub fn set_custom_id(&mut self, custom_id: &str) -> &mut Self {
        custom_id.clone_into(&mut self.options.custom_id);
        self
    }

    /// Message on the first page.
    pub fn set_welcome_message(&mut self, message: &str) -> &mut Self {
        message.clone_into(&mut self.options.welcome_message);
        self
    }

    /// Replace the default logo.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `url` is not empty and not URL-shaped.
    pub fn set_logo(&mut self, url: &str) -> Result<&mut Self> {
        validate::optional_url(url, "logo")?;
        url.clone_into(&mut self.options.logo);
        Ok(self)
    }

    /// Hide the service's branding.
    pub fn hide_branding_logo(&mut self, hide: bool) -> &mut Self {
        self.options.no_branding = Some(hide);
        self
    }

    /// Interface language code, empty to detect from the user's device.
    pub fn set_language(&mut self, language: &str) -> &mut Self {
        language.clone_into(&mut self.options.language);
        self
    }

    /// Where results are posted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `url` is not empty and not URL-shaped.
    pub fn set_callback_url(&mut self, url: &str) -> Result<&mut Self> {
        validate::optional_url(url, "callback URL")?;
        url.clone_into(&mut self.options.callback_url);
        Ok(self)
    }

    /// Redirect the user's browser after verification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if either URL is not empty and not
    /// URL-shaped. Neither is stored in that case.
    pub fn set_redirection_url(&mut self, success_url: &str, fail_url: &str) -> Result<&mut Self> {
        validate::optional_url(success_url, "success URL")?;
        validate::optional_url(fail_url, "fail URL")?;
        success_url.clone_into(&mut self.options.success_redirect);
        fail_url.clone_into(&mut self.options.fail_redirect);
        Ok(self)
    }

    /// Require the document to pass authentication with at least `min_score`.
    ///
    /// Disabling sets the minimum score to 0 and keeps the module.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if enabling with a score outside 0..=1.
    pub fn enable_authentication(
        &mut self,
        enabled: bool,
        module: AuthModule,
        min_score: f64,
    ) -> Result<&mut Self> {
        if !enabled {
            self.options.authenticate_min_score = 0.0;
            return Ok(self);
        }
        validate::unit_interval(min_score, "minimum score")?;
        self.options.authenticate_module = module;
        self.options.authenticate_min_score = min_score;
        Ok(self)
    }

    /// Match the document face against a photo (1) or video (2) of the user.
    ///
    /// Disabling sets `biometric` to 0 and ignores the other arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if enabling with another type, or a
    /// threshold outside (0, 1].
    pub fn enable_face_verification(
        &mut self,
        enabled: bool,
        verification_type: u8,
        threshold: f64,
    ) -> Result<&mut Self> {
        if !enabled {
            self.options.biometric = 0;
            return Ok(self);
        }
        if !matches!(verification_type, 1 | 2) {
            return Err(Error::configuration(
                "invalid verification type, 1 for photo verification, 2 for video verification",
            ));
        }
        validate::biometric_threshold(threshold)?;
        self.options.biometric = verification_type;
        self.options.biometric_threshold = threshold;
        Ok(self)
    }

    /// Allow any number of users through the same URL.
    pub fn set_reusable(&mut self, reusable: bool) -> &mut Self {
        self.options.reusable = reusable;
        self
    }

    /// Include document and face images in the callback, as URLs or base64.
    pub fn set_callback_image(
        &mut self,
        return_document_image: bool,
        return_face_image: bool,
        format: OutputFormat,
    ) -> &mut Self {
        self.options.return_document_image = Some(return_document_image);
        self.options.return_face_image = Some(return_face_image);
        self.options.return_type = Some(match format {
            OutputFormat::Base64 => 0,
            OutputFormat::Url => 1,
        });
        self
    }

    /// QR code colors (6 hex digits) and size and margin (1 to 50).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if any argument is out of range.
    pub fn set_qr_code_format(
        &mut self,
        foreground: &str,
        background: &str,
        size: u8,
        margin: u8,
    ) -> Result<&mut Self> {
        if !validate::is_hex_color(foreground) {
            return Err(Error::configuration("invalid foreground color HEX code"));
        }
        if !validate::is_hex_color(background) {
            return Err(Error::configuration("invalid background color HEX code"));
        }
        if !(1..=50).contains(&size) {
            return Err(Error::configuration("invalid image size, 1 to 50 accepted"));
        }
        if !(1..=50).contains(&margin) {
            return Err(Error::configuration("invalid margin, 1 to 50 accepted"));
        }
        foreground.clone_into(&mut self.options.qr_color);
        background.clone_into(&mut self.options.qr_bgcolor);
        self.options.qr_size = Some(size);
        self.options.qr_margin = Some(margin);
        Ok(self)
    }

    /// Save the result in the vault.
    pub fn enable_vault(&mut self, enabled: bool) -> &mut Self {
        self.options.vault_save = Some(enabled);
        self
    }

    /// Cross-check front and back of the document.
    pub fn enable_dualside_check(&mut self, enabled: bool) -> &mut Self {
        self.options.dual_side_check = enabled;
        self
    }

    /// Reject expired documents.
    pub fn verify_expiry(&mut self, enabled: bool) -> &mut Self {
        self.options.verify_expiry = enabled;
        self
    }

    /// Check the document or personal number; empty disables.
    pub fn verify_document_number(&mut self, document_number: &str) -> &mut Self {
        document_number.clone_into(&mut self.options.targets.document_number);
        self
    }

    /// Check the holder's full name; empty disables.
    pub fn verify_name(&mut self, full_name: &str) -> &mut Self {
        full_name.clone_into(&mut self.options.targets.name);
        self
    }

    /// Check the date of birth, `YYYY/MM/DD`; empty disables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] on a malformed date.
    pub fn verify_dob(&mut self, dob: &str) -> Result<&mut Self> {
        self.options.targets.set_dob(dob)?;
        Ok(self)
    }

    /// Check the holder's age is within `min-max`; empty disables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] on a malformed range.
    pub fn verify_age(&mut self, age_range: &str) -> Result<&mut Self> {
        self.options.targets.set_age_range(age_range)?;
        Ok(self)
    }

    /// Check the address; empty disables.
    pub fn verify_address(&mut self, address: &str) -> &mut Self {
        address.clone_into(&mut self.options.targets.address);
        self
    }

    /// Check the postcode; empty disables.
    pub fn verify_postcode(&mut self, postcode: &str) -> &mut Self {
        postcode.clone_into(&mut self.options.targets.postcode);
        self
    }

    /// Accept only documents issued by these countries, e.g. `"US,CA"`.
    pub fn restrict_country(&mut self, country_codes: &str) -> &mut Self {
        country_codes.clone_into(&mut self.options.document_country);
        self
    }

    /// Accept only documents issued by these states.
    pub fn restrict_state(&mut self, states: &str) -> &mut Self {
        states.clone_into(&mut self.options.document_region);
        self
    }

    /// Accept only these document types, e.g. `"PD"`.
    pub fn restrict_type(&mut self, document_type: &str) -> &mut Self {
        document_type.clone_into(&mut self.options.document_type);
        self
    }

    /// Screen the user against AML/PEP watchlists.
    pub fn enable_aml_check(&mut self, enabled: bool) -> &mut Self {
        self.options.aml.get_or_insert_with(Default::default).enabled = enabled;
        self
    }

    /// Restrict AML screening to these databases, comma separated.
    pub fn set_aml_database(&mut self, databases: &str) -> &mut Self {
        databases.clone_into(&mut self.options.aml.get_or_insert_with(Default::default).database);
        self
    }

    /// Require exact name and birthday matches in AML screening.
    pub fn enable_aml_strict_match(&mut self, enabled: bool) -> &mut Self {
        self.options
            .aml
            .get_or_insert_with(Default::default)
            .strict_match = enabled;
        self
    }

    /// Use a custom page template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `url` is not empty and not URL-shaped.
    pub fn set_custom_html(&mut self, url: &str) -> Result<&mut Self> {
        validate::optional_url(url, "custom HTML")?;
        self.options.custom_html_url = Some(url.to_owned());
        Ok(self)
    }

    /// Ask for and verify the user's phone number.
    pub fn enable_phone_verification(&mut self, enabled: bool) -> &mut Self {
        self.phone_mut().enabled = enabled;
        self
    }

    /// Require the user's phone number to match, empty disables.
    pub fn verify_phone(&mut self, phone_number: &str) -> &mut Self {
        phone_number.clone_into(&mut self.phone_mut().verify_phone);
        self
    }

    /// Send the session link to this number by SMS.
    pub fn sms_verification_link(&mut self, mobile_number: &str) -> &mut Self {
        mobile_number.clone_into(&mut self.phone_mut().sms_verification_link);
        self
    }

    /// Send the signed contract to this number by SMS.
    pub fn sms_contract_link(&mut self, mobile_number: &str) -> &mut Self {
        mobile_number.clone_into(&mut self.phone_mut().sms_contract_link);
        self
    }

    /// Have the user sign a contract generated from `template_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an empty template ID or a
    /// non-object prefill value.
    pub fn sign_contract(
        &mut self,
        template_id: &str,
        format: ContractFormat,
        prefill_data: Value,
    ) -> Result<&mut Self> {
        let prefill = contract_args(template_id, prefill_data)?;
        self.options.contract = Some(SignContract {
            template_id: template_id.to_owned(),
            format: Some(format),
            prefill_data: Some(prefill),
        });
        Ok(self)
    }

    /// Set a request parameter that has no typed setter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `key` belongs to a typed option or
    /// to a session action.
    pub fn set_parameter(&mut self, key: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let reserved = to_object(&SessionOptions::defaults(ApiVersion::Current, "-"))?;
        self.extensions
            .insert(key, value.into(), &reserved, SESSION_ACTION_KEYS)?;
        Ok(self)
    }

    /// The request object for the current options, without API key or type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_wire_format(&self) -> Result<Map<String, Value>> {
        let mut payload = to_object(&self.options)?;
        self.extensions.merge_into(&mut payload);
        Ok(payload)
    }

    /// Session to embed in a web page as an iframe.
    ///
    /// # Errors
    ///
    /// See [`Self::create`].
    pub async fn create_iframe(&self) -> Result<SessionDescriptor> {
        self.create(SessionKind::Iframe).await
    }

    /// Session to open on a phone or embed in a mobile app.
    ///
    /// # Errors
    ///
    /// See [`Self::create`].
    pub async fn create_mobile(&self) -> Result<SessionDescriptor> {
        self.create(SessionKind::Mobile).await
    }

    /// Session to open in any browser.
    ///
    /// # Errors
    ///
    /// See [`Self::create`].
    pub async fn create_redirection(&self) -> Result<SessionDescriptor> {
        self.create(SessionKind::Redirection).await
    }

    /// Live capture session on a phone.
    ///
    /// # Errors
    ///
    /// See [`Self::create`].
    pub async fn create_live_mobile(&self) -> Result<SessionDescriptor> {
        self.create(SessionKind::LiveMobile).await
    }

    /// Create a session of `kind` with the current options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] or [`Error::Remote`] if the round trip
    /// fails, or [`Error::Json`] if the reply lacks `reference` or `url`.
    #[instrument(skip(self), fields(base_url = %self.client.identity().base_url()))]
    pub async fn create(&self, kind: SessionKind) -> Result<SessionDescriptor> {
        let mut payload = self.to_wire_format()?;
        payload.insert("type".into(), Value::from(kind.wire_value()));

        let body = self
            .client
            .post(CREATE_PATH, payload, SESSION_REQUEST_TIMEOUT)
            .await?;
        let session: SessionDescriptor = serde_json::from_value(body)?;
        debug!(reference = %session.reference, "session created");
        Ok(session)
    }

    /// Create a signature-only session for `template_id`.
    ///
    /// Returns the decoded response body unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an empty template ID or non-object
    /// prefill, otherwise [`Error::Transport`] or [`Error::Remote`].
    #[instrument(skip(self, prefill_data), fields(base_url = %self.client.identity().base_url()))]
    pub async fn create_signature(
        &self,
        template_id: &str,
        format: ContractFormat,
        prefill_data: Value,
    ) -> Result<Value> {
        let prefill = contract_args(template_id, prefill_data)?;

        let mut payload = self.to_wire_format()?;
        payload.insert("template_id".into(), Value::from(template_id));
        payload.insert("contract_format".into(), serde_json::to_value(format)?);
        payload.insert("contract_prefill_data".into(), Value::Object(prefill));

        self.client
            .post(SIGN_PATH, payload, SESSION_REQUEST_TIMEOUT)
            .await
    }

    /// Check callback data against the service.
    ///
    /// Returns `true` only when the service answers `success: true`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an empty argument. Transport and
    /// remote failures are errors, never `false`.
    #[instrument(skip(self, hash), fields(base_url = %self.client.identity().base_url()))]
    pub async fn validate(&self, reference: &str, hash: &str) -> Result<bool> {
        validate::required(reference, "reference code required")?;
        validate::required(hash, "hash required")?;

        let mut payload = Map::new();
        payload.insert("reference".into(), Value::from(reference));
        payload.insert("hash".into(), Value::from(hash));

        let body = self
            .client
            .post(VALIDATE_PATH, payload, SESSION_REQUEST_TIMEOUT)
            .await?;
        Ok(body.get("success") == Some(&Value::Bool(true)))
    }

    fn phone_mut(&mut self) -> &mut PhoneOptions {
        self.options.phone.get_or_insert_with(PhoneOptions::default)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::MockTransport;
    use serde_json::json;

    fn session(reply: Value) -> (VerificationSessionConfig, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new().with_response(reply));
        let identity = ClientIdentity::new("test-key", "EU").unwrap();
        let config =
            VerificationSessionConfig::with_transport(identity, transport.clone(), "ACME").unwrap();
        (config, transport)
    }

    #[test]
    fn test_company_name_required() {
        let identity = ClientIdentity::new("k", "US").unwrap();
        let transport = Arc::new(MockTransport::new());
        assert!(matches!(
            VerificationSessionConfig::with_transport(identity, transport, ""),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_version_defaults() {
        let (config, _) = session(json!({}));
        let wire = config.to_wire_format().unwrap();
        assert_eq!(wire["companyname"], json!("ACME"));
        assert_eq!(wire["authenticate_module"], json!(2));
        assert_eq!(wire["maxattempt"], json!(1));
        assert_eq!(wire["verify_expiry"], json!(true));
        assert_eq!(wire["qr_size"], json!(""));
        assert_eq!(wire["phoneverification"], json!(false));
        assert_eq!(wire["custom_html_url"], json!(""));
        assert_eq!(wire["contract_sign"], json!(""));

        let legacy = config.with_version(ApiVersion::Legacy);
        let wire = legacy.to_wire_format().unwrap();
        assert_eq!(wire["verify_expiry"], json!(false));
        assert_eq!(wire["companyname"], json!("ACME"));
        for key in ["aml_check", "phoneverification", "custom_html_url", "contract_sign"] {
            assert!(!wire.contains_key(key), "{key} should be absent");
        }
    }

    #[test]
    fn test_max_attempt_range() {
        let (mut config, _) = session(json!({}));
        assert!(config.set_max_attempt(0).is_err());
        assert!(config.set_max_attempt(11).is_err());
        config.set_max_attempt(10).unwrap();
        assert_eq!(config.options().max_attempt, 10);
    }

    #[test]
    fn test_qr_code_format_checks_both_colors() {
        let (mut config, _) = session(json!({}));
        assert!(config.set_qr_code_format("000000", "XYZXYZ", 5, 1).is_err());
        assert!(config.set_qr_code_format("00000", "FFFFFF", 5, 1).is_err());
        assert!(config.set_qr_code_format("000000", "FFFFFF", 0, 1).is_err());
        assert!(config.set_qr_code_format("000000", "FFFFFF", 5, 51).is_err());
        assert!(config.options().qr_color.is_empty());

        config.set_qr_code_format("000000", "FFFFFF", 5, 1).unwrap();
        let wire = config.to_wire_format().unwrap();
        assert_eq!(wire["qr_bgcolor"], json!("FFFFFF"));
        assert_eq!(wire["qr_size"], json!(5));
    }

    #[test]
    fn test_redirection_urls_validated_together() {
        let (mut config, _) = session(json!({}));
        assert!(
            config
                .set_redirection_url("https://example.com/ok", "not a url")
                .is_err()
        );
        assert!(config.options().success_redirect.is_empty());
        config
            .set_redirection_url("https://example.com/ok", "https://example.com/fail")
            .unwrap();
        assert_eq!(config.options().fail_redirect, "https://example.com/fail");
    }

    #[test]
    fn test_authentication_and_face_verification() {
        let (mut config, _) = session(json!({}));
        assert!(config.enable_authentication(true, AuthModule::One, 1.5).is_err());
        config.enable_authentication(true, AuthModule::Quick, 0.5).unwrap();
        assert_eq!(config.options().authenticate_module, AuthModule::Quick);
        config.enable_authentication(false, AuthModule::One, 9.0).unwrap();
        assert!(config.options().authenticate_min_score.abs() < f64::EPSILON);
        assert_eq!(config.options().authenticate_module, AuthModule::Quick);

        assert!(config.enable_face_verification(true, 3, 0.4).is_err());
        config.enable_face_verification(true, 2, 0.6).unwrap();
        assert_eq!(config.options().biometric, 2);
        config.enable_face_verification(false, 9, 9.0).unwrap();
        assert_eq!(config.options().biometric, 0);
    }

    #[test]
    fn test_face_verification_threshold_range() {
        let (mut config, _) = session(json!({}));
        assert!(config.enable_face_verification(true, 1, 0.0).is_err());
        assert!(config.enable_face_verification(true, 1, 1.5).is_err());
        assert_eq!(config.options().biometric, 0);
        assert!((config.options().biometric_threshold - 0.4).abs() < f64::EPSILON);

        config.enable_face_verification(true, 1, 1.0).unwrap();
        assert_eq!(config.options().biometric, 1);
        assert!((config.options().biometric_threshold - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_callback_image_return_type() {
        let (mut config, _) = session(json!({}));
        config.set_callback_image(true, false, OutputFormat::Base64);
        let wire = config.to_wire_format().unwrap();
        assert_eq!(wire["return_documentimage"], json!(true));
        assert_eq!(wire["return_faceimage"], json!(false));
        assert_eq!(wire["return_type"], json!(0));
    }

    #[test]
    fn test_legacy_phone_setters_add_group() {
        let (config, _) = session(json!({}));
        let mut config = config.with_version(ApiVersion::Legacy);
        config.sms_verification_link("+1333444555");
        let wire = config.to_wire_format().unwrap();
        assert_eq!(wire["sms_verification_link"], json!("+1333444555"));
        assert_eq!(wire["phoneverification"], json!(false));
    }

    #[test]
    fn test_reset_keeps_company_name() {
        let (mut config, _) = session(json!({}));
        config.set_custom_id("abc").set_reusable(true);
        config.reset_config();
        assert_eq!(config.options().company_name, "ACME");
        assert!(config.options().custom_id.is_empty());
        assert!(!config.options().reusable);
    }

    #[test]
    fn test_set_parameter_rejects_action_keys() {
        let (mut config, _) = session(json!({}));
        assert!(config.set_parameter("type", 3).is_err());
        assert!(config.set_parameter("companyname", "x").is_err());
        config.set_parameter("theme", "dark").unwrap();
        assert_eq!(config.to_wire_format().unwrap()["theme"], json!("dark"));
    }

    #[tokio::test]
    async fn test_create_sends_type() {
        let reply = json!({ "reference": "ABC", "url": "https://docupass.app/ABC" });
        let (config, transport) = session(reply);
        let descriptor = config.create_redirection().await.unwrap();
        assert_eq!(descriptor.reference, "ABC");
        assert!(descriptor.qrcode.is_none());

        let request = transport.last_request().unwrap();
        assert_eq!(request.url, "https://api-eu.idanalyzer.com/docupass/create");
        assert_eq!(request.body["type"], json!(2));
        assert_eq!(request.timeout, Some(SESSION_REQUEST_TIMEOUT));
    }

    #[tokio::test]
    async fn test_create_variants_send_their_type() {
        let reply = json!({ "reference": "ABC", "url": "https://docupass.app/ABC" });
        let transport = Arc::new(
            MockTransport::new()
                .with_response(reply.clone())
                .with_response(reply.clone())
                .with_response(reply.clone())
                .with_response(reply),
        );
        let identity = ClientIdentity::new("test-key", "EU").unwrap();
        let config =
            VerificationSessionConfig::with_transport(identity, transport.clone(), "ACME").unwrap();

        let cases = [
            (SessionKind::Iframe, 0),
            (SessionKind::Mobile, 1),
            (SessionKind::Redirection, 2),
            (SessionKind::LiveMobile, 3),
        ];
        for (kind, expected) in cases {
            let descriptor = match kind {
                SessionKind::Iframe => config.create_iframe().await,
                SessionKind::Mobile => config.create_mobile().await,
                SessionKind::Redirection => config.create_redirection().await,
                SessionKind::LiveMobile => config.create_live_mobile().await,
            }
            .unwrap();
            assert_eq!(descriptor.reference, "ABC");
            assert_eq!(kind.wire_value(), expected);
            let body = transport.last_request().unwrap().body;
            assert_eq!(body["type"], json!(expected), "{kind:?}");
        }
        assert_eq!(transport.request_count(), 4);
    }

    #[tokio::test]
    async fn test_create_signature_payload() {
        let (config, transport) = session(json!({ "reference": "S1" }));
        assert!(
            config
                .create_signature("", ContractFormat::Pdf, Value::Null)
                .await
                .is_err()
        );
        assert_eq!(transport.request_count(), 0);

        config
            .create_signature("tpl", ContractFormat::Html, json!({ "a": 1 }))
            .await
            .unwrap();
        let request = transport.last_request().unwrap();
        assert_eq!(request.url, "https://api-eu.idanalyzer.com/docupass/sign");
        assert_eq!(request.body["template_id"], json!("tpl"));
        assert_eq!(request.body["contract_format"], json!("HTML"));
        assert_eq!(request.body["contract_prefill_data"], json!({ "a": 1 }));
        assert!(request.body.get("type").is_none());
    }

    #[tokio::test]
    async fn test_validate_sends_only_reference_and_hash() {
        let (config, transport) = session(json!({ "success": true }));
        assert!(config.validate("REF", "HASH").await.unwrap());

        let request = transport.last_request().unwrap();
        assert_eq!(
            request.body,
            json!({ "reference": "REF", "hash": "HASH", "apikey": "test-key" })
        );
    }

    #[tokio::test]
    async fn test_validate_non_boolean_success_is_false() {
        let (config, _) = session(json!({ "success": "true" }));
        assert!(!config.validate("REF", "HASH").await.unwrap());
    }
}
