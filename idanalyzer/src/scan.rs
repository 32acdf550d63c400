//! Document and biometric scanning.
//!
//! [`DocumentScanConfig`] accumulates OCR, authentication, verification,
//! vault, AML and contract options, then [`DocumentScanConfig::scan`] posts
//! them together with the classified document and face media in one request.
//!
//! # Example
//!
//! ```rust,ignore
//! use idanalyzer::scan::{DocumentScanConfig, ScanRequest};
//!
//! let mut scanner = DocumentScanConfig::new("API_KEY", "US")?;
//! scanner
//!     .enable_authentication(true, AuthModule::Two)
//!     .verify_dob("1990/01/01")?
//!     .verify_age("18-99")?;
//!
//! let result = scanner
//!     .scan(ScanRequest::new("https://example.com/front.jpg")
//!         .with_biometric_photo("/path/to/selfie.jpg"))
//!     .await?;
//! ```

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::client::{ApiClient, ClientIdentity, DEFAULT_REQUEST_TIMEOUT, HttpTransport};
use crate::endpoint::ApiVersion;
use crate::error::{Error, Result};
use crate::media::{InputResolver, MediaSlot};
use crate::options::{
    Accuracy, AmlOptions, AuthModule, ContractFormat, Extensions, GenerateContract, OutputFormat,
    VerificationTargets, blank_if_none, contract_args, to_object,
};
use crate::validate;

/// Maximum number of custom vault data strings.
pub const MAX_VAULT_DATA: usize = 5;

/// Request fields written by [`DocumentScanConfig::scan`] itself.
const SCAN_ACTION_KEYS: &[&str] = &[
    "apikey",
    "url",
    "file_base64",
    "url_back",
    "file_back_base64",
    "faceurl",
    "face_base64",
    "videourl",
    "video_base64",
    "passcode",
];

/// Typed scan options, serialized as the flat request object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOptions {
    /// OCR accuracy.
    pub accuracy: Accuracy,
    /// Authenticate the document.
    pub authenticate: bool,
    /// Authentication module.
    pub authenticate_module: AuthModule,
    /// Maximum image dimension before OCR, 0 disables resizing.
    #[serde(rename = "ocr_scaledown")]
    pub ocr_scale_down: u32,
    /// Return a cropped document image.
    #[serde(rename = "outputimage")]
    pub output_image: bool,
    /// Return a cropped face image.
    #[serde(rename = "outputface")]
    pub output_face: bool,
    /// Format of returned images.
    #[serde(rename = "outputmode")]
    pub output_mode: OutputFormat,
    /// Cross-check front and back of the document.
    #[serde(rename = "dualsidecheck")]
    pub dual_side_check: bool,
    /// Reject expired documents.
    pub verify_expiry: bool,
    /// Values checked against the document.
    #[serde(flatten)]
    pub targets: VerificationTargets,
    /// Accepted issuing countries, ISO alpha-2, comma separated.
    pub country: String,
    /// Accepted issuing states, comma separated.
    pub region: String,
    /// Accepted document types, e.g. `"PD"`.
    #[serde(rename = "type")]
    pub document_type: String,
    /// Check the document against the blocklist.
    #[serde(rename = "checkblocklist", serialize_with = "blank_if_none")]
    pub check_blocklist: Option<bool>,
    /// Save the scan in the vault.
    #[serde(serialize_with = "blank_if_none")]
    pub vault_save: Option<bool>,
    /// Save to the vault even if the document is unrecognized.
    #[serde(rename = "vault_saveunrecognized", serialize_with = "blank_if_none")]
    pub vault_save_unrecognized: Option<bool>,
    /// Skip duplicate images.
    #[serde(rename = "vault_noduplicate", serialize_with = "blank_if_none")]
    pub vault_no_duplicate: Option<bool>,
    /// Merge entries with the same document number.
    #[serde(rename = "vault_automerge", serialize_with = "blank_if_none")]
    pub vault_auto_merge: Option<bool>,
    /// Custom vault data 1.
    pub vault_customdata1: String,
    /// Custom vault data 2.
    pub vault_customdata2: String,
    /// Custom vault data 3.
    pub vault_customdata3: String,
    /// Custom vault data 4.
    pub vault_customdata4: String,
    /// Custom vault data 5.
    pub vault_customdata5: String,
    /// Read AAMVA barcodes only.
    #[serde(rename = "barcodemode")]
    pub barcode_mode: bool,
    /// Minimum face similarity, in (0, 1].
    pub biometric_threshold: f64,
    /// AML screening, absent from the legacy schema until set.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub aml: Option<AmlOptions>,
    /// Contract generation, absent from the legacy schema until set.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub contract: Option<GenerateContract>,
}

impl ScanOptions {
    /// Default option table for `version`.
    #[must_use]
    pub fn defaults(version: ApiVersion) -> Self {
        Self {
            accuracy: Accuracy::Accurate,
            authenticate: false,
            authenticate_module: AuthModule::One,
            ocr_scale_down: 1500,
            output_image: false,
            output_face: false,
            output_mode: OutputFormat::Url,
            dual_side_check: false,
            verify_expiry: true,
            targets: VerificationTargets::default(),
            country: String::new(),
            region: String::new(),
            document_type: String::new(),
            check_blocklist: None,
            vault_save: None,
            vault_save_unrecognized: None,
            vault_no_duplicate: None,
            vault_auto_merge: None,
            vault_customdata1: String::new(),
            vault_customdata2: String::new(),
            vault_customdata3: String::new(),
            vault_customdata4: String::new(),
            vault_customdata5: String::new(),
            barcode_mode: false,
            biometric_threshold: 0.4,
            aml: version.is_current().then(AmlOptions::default),
            contract: version.is_current().then(GenerateContract::default),
        }
    }
}

/// Media for one scan. Only the primary document image is mandatory.
///
/// Each input may be a URL, a local file path or inline base64 content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRequest {
    /// Front of the document.
    pub document_primary: Option<String>,
    /// Back of the document.
    pub document_secondary: Option<String>,
    /// Face photo.
    pub biometric_photo: Option<String>,
    /// Face video.
    pub biometric_video: Option<String>,
    /// 4 digit passcode spoken in the face video.
    pub biometric_video_passcode: Option<String>,
}

impl ScanRequest {
    /// Create a request for a primary document image.
    #[must_use]
    pub fn new(document_primary: impl Into<String>) -> Self {
        Self {
            document_primary: Some(document_primary.into()),
            ..Self::default()
        }
    }

    /// Set the back of the document.
    #[must_use]
    pub fn with_document_secondary(mut self, input: impl Into<String>) -> Self {
        self.document_secondary = Some(input.into());
        self
    }

    /// Set the face photo.
    #[must_use]
    pub fn with_biometric_photo(mut self, input: impl Into<String>) -> Self {
        self.biometric_photo = Some(input.into());
        self
    }

    /// Set the face video and its passcode.
    #[must_use]
    pub fn with_biometric_video(
        mut self,
        input: impl Into<String>,
        passcode: impl Into<String>,
    ) -> Self {
        self.biometric_video = Some(input.into());
        self.biometric_video_passcode = Some(passcode.into());
        self
    }
}

/// Builder for document scan requests.
#[derive(Debug, Clone)]
pub struct DocumentScanConfig {
    client: ApiClient,
    version: ApiVersion,
    options: ScanOptions,
    extensions: Extensions,
}

impl DocumentScanConfig {
    /// Create a scanner for an API key and region ("US", "EU" or a custom URL).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an empty key or region, or a
    /// transport error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, region: &str) -> Result<Self> {
        let identity = ClientIdentity::new(api_key, region)?;
        Ok(Self::from_client(ApiClient::with_default_transport(identity)?))
    }

    /// Create a scanner with an explicit transport.
    #[must_use]
    pub fn with_transport(identity: ClientIdentity, transport: Arc<dyn HttpTransport>) -> Self {
        Self::from_client(ApiClient::new(identity, transport))
    }

    fn from_client(client: ApiClient) -> Self {
        Self {
            client,
            version: ApiVersion::Current,
            options: ScanOptions::defaults(ApiVersion::Current),
            extensions: Extensions::default(),
        }
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
    pub const fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Extra parameters set through [`Self::set_parameter`].
    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Schema version in use.
    #[must_use]
    pub const fn version(&self) -> ApiVersion {
        self.version
    }

    /// Reset all options to defaults, keeping the API key and region.
    pub fn reset_config(&mut self) -> &mut Self {
        self.options = ScanOptions::defaults(self.version);
        self.extensions = Extensions::default();
        self
    }

    /// Set OCR accuracy: 0 = fast, 1 = balanced, 2 = accurate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for any other value.
    pub fn set_accuracy(&mut self, accuracy: u8) -> Result<&mut Self> {
        self.options.accuracy = Accuracy::try_from(accuracy)?;
        Ok(self)
    }

    /// Check whether the document is authentic, using `module`.
    ///
    /// The module is kept as-is when authentication is disabled.
    pub fn enable_authentication(&mut self, enabled: bool, module: AuthModule) -> &mut Self {
        self.options.authenticate = enabled;
        self.options.authenticate_module = module;
        self
    }

    /// Scale large images down to `max_scale` pixels before OCR; 0 disables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] unless `max_scale` is 0 or 500..=4000.
    pub fn set_ocr_image_resize(&mut self, max_scale: u32) -> Result<&mut Self> {
        if max_scale != 0 && !(500..=4000).contains(&max_scale) {
            return Err(Error::configuration(
                "invalid scale value, 0, or 500 to 4000 accepted",
            ));
        }
        self.options.ocr_scale_down = max_scale;
        Ok(self)
    }

    /// Minimum confidence score for two faces to be considered identical.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] unless `0 < threshold <= 1`.
    pub fn set_biometric_threshold(&mut self, threshold: f64) -> Result<&mut Self> {
        validate::biometric_threshold(threshold)?;
        self.options.biometric_threshold = threshold;
        Ok(self)
    }

    /// Return cropped document and/or face images in `format`.
    pub fn enable_image_output(
        &mut self,
        crop_document: bool,
        crop_face: bool,
        format: OutputFormat,
    ) -> &mut Self {
        self.options.output_image = crop_document;
        self.options.output_face = crop_face;
        self.options.output_mode = format;
        self
    }

    /// Cross-check names, number and type between front and back.
    pub fn enable_dualside_check(&mut self, enabled: bool) -> &mut Self {
        self.options.dual_side_check = enabled;
        self
    }

    /// Reject documents past their expiry date.
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
        country_codes.clone_into(&mut self.options.country);
        self
    }

    /// Accept only documents issued by these states, e.g. `"CA,TX"`.
    pub fn restrict_state(&mut self, states: &str) -> &mut Self {
        states.clone_into(&mut self.options.region);
        self
    }

    /// Accept only these document types: P passport, D driver's license, I identity card.
    pub fn restrict_type(&mut self, document_type: &str) -> &mut Self {
        document_type.clone_into(&mut self.options.document_type);
        self
    }

    /// Read data from AAMVA barcodes only, skipping visual OCR.
    pub fn enable_barcode_mode(&mut self, enabled: bool) -> &mut Self {
        self.options.barcode_mode = enabled;
        self
    }

    /// Check the document against the blocklist.
    pub fn enable_blocklist_check(&mut self, enabled: bool) -> &mut Self {
        self.options.check_blocklist = Some(enabled);
        self
    }

    /// Save the scan in the vault.
    pub fn enable_vault(
        &mut self,
        enabled: bool,
        save_unrecognized: bool,
        no_duplicate_image: bool,
        auto_merge_document: bool,
    ) -> &mut Self {
        self.options.vault_save = Some(enabled);
        self.options.vault_save_unrecognized = Some(save_unrecognized);
        self.options.vault_no_duplicate = Some(no_duplicate_image);
        self.options.vault_auto_merge = Some(auto_merge_document);
        self
    }

    /// Attach up to five custom strings to the vault entry. Missing slots are cleared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for more than five strings.
    pub fn set_vault_data<S: AsRef<str>>(&mut self, data: &[S]) -> Result<&mut Self> {
        if data.len() > MAX_VAULT_DATA {
            return Err(Error::configuration(format!(
                "at most {MAX_VAULT_DATA} custom vault data strings accepted"
            )));
        }
        let slot = |i: usize| data.get(i).map(|s| s.as_ref().to_owned()).unwrap_or_default();
        self.options.vault_customdata1 = slot(0);
        self.options.vault_customdata2 = slot(1);
        self.options.vault_customdata3 = slot(2);
        self.options.vault_customdata4 = slot(3);
        self.options.vault_customdata5 = slot(4);
        Ok(self)
    }

    /// Screen the document holder against AML/PEP watchlists.
    pub fn enable_aml_check(&mut self, enabled: bool) -> &mut Self {
        self.aml_mut().enabled = enabled;
        self
    }

    /// Restrict AML screening to these source databases, comma separated; empty means all.
    pub fn set_aml_database(&mut self, databases: &str) -> &mut Self {
        databases.clone_into(&mut self.aml_mut().database);
        self
    }

    /// Require exact name and birthday matches in AML screening.
    pub fn enable_aml_strict_match(&mut self, enabled: bool) -> &mut Self {
        self.aml_mut().strict_match = enabled;
        self
    }

    /// Generate a contract from `template_id` with the scanned data.
    ///
    /// `prefill_data` fills template fields not read from the document and
    /// must be a JSON object (or null).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an empty template ID or a
    /// non-object prefill value.
    pub fn generate_contract(
        &mut self,
        template_id: &str,
        format: ContractFormat,
        prefill_data: Value,
    ) -> Result<&mut Self> {
        let prefill = contract_args(template_id, prefill_data)?;
        self.options.contract = Some(GenerateContract {
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
    /// to the scan request itself.
    pub fn set_parameter(&mut self, key: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let reserved = to_object(&ScanOptions::defaults(ApiVersion::Current))?;
        self.extensions
            .insert(key, value.into(), &reserved, SCAN_ACTION_KEYS)?;
        Ok(self)
    }

    /// The request object for the current options, without media or API key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_wire_format(&self) -> Result<Map<String, Value>> {
        let mut payload = to_object(&self.options)?;
        self.extensions.merge_into(&mut payload);
        Ok(payload)
    }

    /// Scan a document, with optional back side, face photo and face video.
    ///
    /// Returns the decoded response body unchanged.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidMediaInput`] if the primary image is missing or any
    ///   input can't be classified
    /// - [`Error::InvalidPasscode`] if a face video has no 4 digit passcode
    /// - [`Error::Transport`] or [`Error::Remote`] if the round trip fails
    #[instrument(skip(self, request), fields(base_url = %self.client.identity().base_url()))]
    pub async fn scan(&self, request: ScanRequest) -> Result<Value> {
        let mut payload = self.to_wire_format()?;

        let primary = request
            .document_primary
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::invalid_media("primary document image required"))?;

        let mut media = vec![InputResolver::resolve(primary, MediaSlot::DocumentPrimary)?];

        if let Some(secondary) = request.document_secondary.as_deref().filter(|s| !s.is_empty()) {
            media.push(InputResolver::resolve(secondary, MediaSlot::DocumentSecondary)?);
        }

        if let Some(photo) = request.biometric_photo.as_deref().filter(|s| !s.is_empty()) {
            media.push(InputResolver::resolve(photo, MediaSlot::BiometricPhoto)?);
        }

        if let Some(video) = request.biometric_video.as_deref().filter(|s| !s.is_empty()) {
            let passcode = request
                .biometric_video_passcode
                .as_deref()
                .filter(|p| validate::is_passcode(p))
                .ok_or(Error::InvalidPasscode)?;
            media.push(InputResolver::resolve(video, MediaSlot::BiometricVideo)?);
            payload.insert("passcode".into(), Value::from(passcode));
        }

        for item in media {
            debug!(field = item.field, "attaching media");
            payload.insert(item.field.into(), Value::String(item.value));
        }

        self.client.post("", payload, DEFAULT_REQUEST_TIMEOUT).await
    }

    fn aml_mut(&mut self) -> &mut AmlOptions {
        self.options.aml.get_or_insert_with(AmlOptions::default)
    }
}
