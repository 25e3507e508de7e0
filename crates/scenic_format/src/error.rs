//! Errors raised while reading or writing document text

use thiserror::Error;

/// Hard failures of the document format layer.
///
/// Anything reported here leaves no usable document. Dangling references are
/// not errors; see [`crate::validate::ReferenceIssue`].
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported format version {found} (expected {expected}.x)")]
    UnsupportedVersion { found: f64, expected: u32 },

    #[error("Unterminated string literal starting at byte {0}")]
    UnterminatedString(usize),
}

pub type Result<T> = std::result::Result<T, FormatError>;
