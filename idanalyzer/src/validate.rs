//! Argument validators shared by the builders.
//!
//! Each validator returns [`Error::Configuration`] with a descriptive message
//! and never has side effects, so setters can validate everything before
//! touching their options.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// URL-shaped heuristic: optional scheme, optional `www.`, a dotted domain
/// with a 2-6 letter TLD, then any tail without whitespace. Not RFC compliant.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(https?://)?(www\.)?[-a-zA-Z0-9@:%._+~#=]{2,256}\.[a-z]{2,6}\b\S*$",
    )
    .expect("URL pattern is valid")
});

static DOB_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}/\d{2}/\d{2}$").expect("DOB pattern is valid"));

static AGE_RANGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+-\d+$").expect("age range pattern is valid"));

static PASSCODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("passcode pattern is valid"));

/// Returns `true` if `input` looks like a remote URL.
#[must_use]
pub fn is_url(input: &str) -> bool {
    URL_PATTERN.is_match(input)
}

/// Returns `true` if `hex` is exactly six hexadecimal digits.
#[must_use]
pub fn is_hex_color(hex: &str) -> bool {
    hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Returns `true` if `passcode` is exactly four ASCII digits.
#[must_use]
pub fn is_passcode(passcode: &str) -> bool {
    PASSCODE_PATTERN.is_match(passcode)
}

/// Validate a date of birth in `YYYY/MM/DD` form with a plausible month and day.
///
/// # Errors
///
/// Returns [`Error::Configuration`] on a malformed date.
pub fn date_of_birth(dob: &str) -> Result<()> {
    let invalid = || Error::configuration("invalid birthday format (YYYY/MM/DD)");
    if !DOB_PATTERN.is_match(dob) {
        return Err(invalid());
    }
    let month: u8 = dob[5..7].parse().map_err(|_| invalid())?;
    let day: u8 = dob[8..10].parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(invalid());
    }
    Ok(())
}

/// Validate an age range such as `18-40`.
///
/// # Errors
///
/// Returns [`Error::Configuration`] unless the range is `<int>-<int>`.
pub fn age_range(range: &str) -> Result<()> {
    if AGE_RANGE_PATTERN.is_match(range) {
        Ok(())
    } else {
        Err(Error::configuration("invalid age range format (minAge-maxAge)"))
    }
}

/// Validate an optional URL option: empty clears, anything else must look like a URL.
///
/// # Errors
///
/// Returns [`Error::Configuration`] naming `what` when the URL test fails.
pub fn optional_url(url: &str, what: &str) -> Result<()> {
    if url.is_empty() || is_url(url) {
        Ok(())
    } else {
        Err(Error::configuration(format!("invalid URL format for {what}")))
    }
}

/// Validate a score in the closed unit interval.
///
/// # Errors
///
/// Returns [`Error::Configuration`] naming `what` when out of range or NaN.
pub fn unit_interval(value: f64, what: &str) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::configuration(format!(
            "invalid {what}, please specify a float between 0 and 1"
        )))
    }
}

/// Validate a face similarity threshold: above 0, at most 1.
///
/// # Errors
///
/// Returns [`Error::Configuration`] when out of range or NaN.
pub fn biometric_threshold(threshold: f64) -> Result<()> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(Error::configuration(
            "invalid threshold value, float between 0 to 1 accepted",
        ))
    }
}

/// Validate a non-empty identifier.
///
/// # Errors
///
/// Returns [`Error::Configuration`] with `message` when `value` is empty.
pub fn required(value: &str, message: &str) -> Result<()> {
    if value.is_empty() {
        Err(Error::configuration(message))
    } else {
        Ok(())
    }
}
