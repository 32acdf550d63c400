//! Region to endpoint resolution and API schema versions.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Production endpoint for the US data-residency region.
pub const US_BASE_URL: &str = "https://api.idanalyzer.com/";

/// Production endpoint for the EU data-residency region.
pub const EU_BASE_URL: &str = "https://api-eu.idanalyzer.com/";

/// Data-residency region, or a custom endpoint override.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Region {
    /// United States production endpoint.
    Us,
    /// European Union production endpoint.
    Eu,
    /// Any other base URL, used verbatim.
    Custom(String),
}

impl Region {
    /// Base URL this region resolves to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match self {
            Self::Us => US_BASE_URL,
            Self::Eu => EU_BASE_URL,
            Self::Custom(url) => url,
        }
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::configuration("please set an API region (US, EU)"));
        }
        if s.eq_ignore_ascii_case("US") {
            Ok(Self::Us)
        } else if s.eq_ignore_ascii_case("EU") {
            Ok(Self::Eu)
        } else {
            Ok(Self::Custom(s.to_owned()))
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Us => write!(f, "US"),
            Self::Eu => write!(f, "EU"),
            Self::Custom(url) => write!(f, "{url}"),
        }
    }
}

/// Maps region codes to base URLs and joins endpoint paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointResolver;

impl EndpointResolver {
    /// Resolve a region code to a base URL.
    ///
    /// "US" and "EU" (any case) map to the production endpoints, any other
    /// non-empty string is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `region` is empty.
    pub fn resolve(region: &str) -> Result<String> {
        Ok(region.parse::<Region>()?.base_url().to_owned())
    }

    /// Join a path suffix onto a base URL with exactly one separating `/`.
    ///
    /// An empty suffix yields the base URL unchanged.
    #[must_use]
    pub fn join(base: &str, path: &str) -> String {
        if path.is_empty() {
            return base.to_owned();
        }
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Request schema version, selecting the default option tables.
///
/// `Legacy` reproduces the older default set: options introduced later (AML,
/// contracts, phone verification, custom HTML) are left out of the request
/// unless explicitly set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    /// The older schema.
    Legacy,
    /// The current schema.
    #[default]
    Current,
}

impl ApiVersion {
    /// Returns `true` for the current schema.
    #[must_use]
    pub const fn is_current(self) -> bool {
        matches!(self, Self::Current)
    }
}
