//! Error types for document extraction

use crate::format::DocumentFormat;
use thiserror::Error;

/// Errors that can occur while reading a document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The extension does not map to a supported format
    #[error("unsupported format: .{0}")]
    UnsupportedFormat(String),

    /// The bytes could not be read as the claimed format
    #[error("extraction failed ({format}): {reason}")]
    ExtractionFailure {
        /// Format the bytes were read as
        format: DocumentFormat,
        /// What went wrong
        reason: String,
    },
}

impl DocumentError {
    pub(crate) fn failure(format: DocumentFormat, reason: impl Into<String>) -> Self {
        DocumentError::ExtractionFailure {
            format,
            reason: reason.into(),
        }
    }
}
