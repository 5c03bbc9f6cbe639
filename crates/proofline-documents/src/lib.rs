//! Proofline Documents
//!
//! Turns raw document bytes into an ordered list of clean paragraph strings.
//!
//! # Overview
//!
//! Each supported format has its own adapter behind the closed
//! [`DocumentFormat`] enum. Every adapter produces raw paragraphs, which then
//! go through the same normalization pass (control characters, whitespace,
//! page numbers, separator rules, bare links).
//!
//! ```text
//! bytes + extension → DocumentFormat → adapter → normalize → Vec<String>
//! ```
//!
//! # Example Usage
//!
//! ```
//! use proofline_documents::{extract, DocumentFormat};
//!
//! let format = DocumentFormat::from_extension("txt").unwrap();
//! let paragraphs = extract(b"First line\ncontinues.\n\nSecond paragraph.", format).unwrap();
//!
//! assert_eq!(paragraphs, vec!["First line continues.", "Second paragraph."]);
//! ```

#![warn(missing_docs)]

mod delimited;
mod error;
mod format;
mod markdown;
mod normalize;
mod pdf;
mod presentation;
mod spreadsheet;
mod text;
mod word;

pub use error::DocumentError;
pub use format::DocumentFormat;
pub use normalize::normalize_paragraphs;

use tracing::debug;

/// Extract normalized paragraphs from a document
///
/// The input buffer is never modified. A readable document without any text
/// yields an empty list rather than an error.
///
/// # Errors
///
/// Returns `ExtractionFailure` when the bytes cannot be decoded as `format`.
pub fn extract(bytes: &[u8], format: DocumentFormat) -> Result<Vec<String>, DocumentError> {
    let raw = match format {
        DocumentFormat::PlainText => text::paragraphs(bytes)?,
        DocumentFormat::Markdown => markdown::paragraphs(bytes)?,
        DocumentFormat::Csv => delimited::paragraphs(bytes)?,
        DocumentFormat::Pdf => pdf::paragraphs(bytes)?,
        DocumentFormat::WordProcessing => word::paragraphs(bytes)?,
        DocumentFormat::Spreadsheet => spreadsheet::paragraphs(bytes)?,
        DocumentFormat::Presentation => presentation::paragraphs(bytes)?,
    };

    let raw_count = raw.len();
    let paragraphs = normalize_paragraphs(raw);
    debug!(
        "Extracted {} paragraphs from {} ({} before normalization)",
        paragraphs.len(),
        format,
        raw_count
    );

    Ok(paragraphs)
}

/// Resolve the format from an extension and extract in one step
///
/// # Errors
///
/// Returns `UnsupportedFormat` for unknown extensions, otherwise as [`extract`].
pub fn extract_with_extension(bytes: &[u8], extension: &str) -> Result<Vec<String>, DocumentError> {
    let format = DocumentFormat::from_extension(extension)?;
    extract(bytes, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_text() {
        let paragraphs = extract(
            b"  Hello   world.\n\n\n12\n\nSecond\tparagraph here.\n",
            DocumentFormat::PlainText,
        )
        .unwrap();
        assert_eq!(paragraphs, vec!["Hello world.", "Second paragraph here."]);
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        assert!(extract(b"", DocumentFormat::PlainText).unwrap().is_empty());
        assert!(extract(b"\n\n   \n", DocumentFormat::Markdown).unwrap().is_empty());
    }

    #[test]
    fn test_undecodable_text_is_an_extraction_failure() {
        let bytes = [0xFE, 0xFF, 0xDC, 0x00, 0xDC, 0x00, 0xDC, 0x00, 0xDC, 0x00];
        let result = extract_with_extension(&bytes, "txt");
        assert!(matches!(
            result,
            Err(DocumentError::ExtractionFailure {
                format: DocumentFormat::PlainText,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_extension() {
        let result = extract_with_extension(b"data", ".exe");
        assert!(matches!(result, Err(DocumentError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_corrupt_archive_fails() {
        let result = extract(b"definitely not a zip file", DocumentFormat::WordProcessing);
        assert!(matches!(result, Err(DocumentError::ExtractionFailure { .. })));
    }

    #[test]
    fn test_input_is_not_modified() {
        let bytes = b"Some text\n\nMore text".to_vec();
        let before = bytes.clone();
        let _ = extract(&bytes, DocumentFormat::PlainText).unwrap();
        assert_eq!(bytes, before);
    }
}
