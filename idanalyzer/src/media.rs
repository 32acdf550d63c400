//! Classification of caller-supplied media strings.
//!
//! A media argument is one of three things, tested in this order:
//!
//! 1. a remote URL (see [`crate::validate::is_url`]), sent as-is;
//! 2. an existing local file, read and base64-encoded;
//! 3. inline content longer than [`INLINE_CONTENT_THRESHOLD`] characters,
//!    assumed to be base64 already and sent as-is.
//!
//! This is a best-effort heuristic. A bare relative file name such as
//! `id.jpg` is URL-shaped and classifies as [`MediaInput::RemoteUrl`]; pass
//! an absolute or `./`-prefixed path to force the file test. A long string
//! that is neither a URL nor a file is treated as inline content.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::error::{Error, Result};
use crate::validate;

/// Length an unclassified string must exceed to be taken as inline content.
pub const INLINE_CONTENT_THRESHOLD: usize = 100;

/// Classified media input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaInput {
    /// A remote URL, passed through unchanged.
    RemoteUrl(String),
    /// An existing local file.
    LocalFile(PathBuf),
    /// Already-encoded content, passed through unchanged.
    InlineContent(String),
}

/// Where a media input goes in the request, which fixes its wire field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSlot {
    /// Front of the document.
    DocumentPrimary,
    /// Back of the document.
    DocumentSecondary,
    /// Face photo for biometric matching.
    BiometricPhoto,
    /// Face video for liveness and biometric matching.
    BiometricVideo,
    /// Image attached to, or searched against, vault entries.
    VaultImage,
}

impl MediaSlot {
    /// Wire field carrying a URL.
    #[must_use]
    pub const fn url_field(self) -> &'static str {
        match self {
            Self::DocumentPrimary => "url",
            Self::DocumentSecondary => "url_back",
            Self::BiometricPhoto => "faceurl",
            Self::BiometricVideo => "videourl",
            Self::VaultImage => "imageurl",
        }
    }

    /// Wire field carrying base64 content.
    #[must_use]
    pub const fn content_field(self) -> &'static str {
        match self {
            Self::DocumentPrimary => "file_base64",
            Self::DocumentSecondary => "file_back_base64",
            Self::BiometricPhoto => "face_base64",
            Self::BiometricVideo => "video_base64",
            Self::VaultImage => "image",
        }
    }

    const fn describe(self) -> &'static str {
        match self {
            Self::DocumentPrimary => "primary document image",
            Self::DocumentSecondary => "secondary document image",
            Self::BiometricPhoto => "face image",
            Self::BiometricVideo => "face video",
            Self::VaultImage => "image",
        }
    }
}

/// A media input ready to be merged into a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedMedia {
    /// Wire field name.
    pub field: &'static str,
    /// Field value: a URL or base64 content.
    pub value: String,
}

/// Classifies and materializes media inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputResolver;

impl InputResolver {
    /// Classify `input` as URL, local file or inline content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMediaInput`] if no variant applies.
    pub fn classify(input: &str) -> Result<MediaInput> {
        if validate::is_url(input) {
            return Ok(MediaInput::RemoteUrl(input.to_owned()));
        }

        let path = Path::new(input);
        if !input.is_empty() && path.is_file() {
            return Ok(MediaInput::LocalFile(path.to_path_buf()));
        }

        if input.chars().count() > INLINE_CONTENT_THRESHOLD {
            return Ok(MediaInput::InlineContent(input.to_owned()));
        }

        Err(Error::invalid_media(
            "file not found, malformed URL or content too short",
        ))
    }

    /// Turn a classification into the field and value for `slot`.
    ///
    /// Local files are read fully into memory and base64-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if a local file cannot be read.
    pub fn materialize(media: &MediaInput, slot: MediaSlot) -> Result<MaterializedMedia> {
        let materialized = match media {
            MediaInput::RemoteUrl(url) => MaterializedMedia {
                field: slot.url_field(),
                value: url.clone(),
            },
            MediaInput::LocalFile(path) => {
                let bytes = std::fs::read(path)?;
                debug!(path = %path.display(), bytes = bytes.len(), "encoding local media file");
                MaterializedMedia {
                    field: slot.content_field(),
                    value: STANDARD.encode(bytes),
                }
            }
            MediaInput::InlineContent(content) => MaterializedMedia {
                field: slot.content_field(),
                value: content.clone(),
            },
        };
        Ok(materialized)
    }

    /// Classify then materialize, naming the slot in any classification error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMediaInput`] or [`Error::Io`].
    pub fn resolve(input: &str, slot: MediaSlot) -> Result<MaterializedMedia> {
        let media = Self::classify(input).map_err(|_| {
            Error::invalid_media(format!(
                "invalid {}, file not found or malformed URL",
                slot.describe()
            ))
        })?;
        Self::materialize(&media, slot)
    }
}
