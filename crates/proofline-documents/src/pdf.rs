//! PDF text extraction using pdf-extract

use crate::error::DocumentError;
use crate::format::DocumentFormat;
use crate::text::split_paragraphs;
use std::panic;
use tracing::warn;

/// Paragraphs of a PDF document
///
/// Page breaks and blank lines both end a paragraph.
pub(crate) fn paragraphs(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    // pdf-extract panics on some malformed inputs
    let extracted = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));

    let text = match extracted {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            return Err(DocumentError::failure(DocumentFormat::Pdf, e.to_string()));
        }
        Err(_) => {
            warn!("PDF parser panicked on a {} byte input", bytes.len());
            return Err(DocumentError::failure(
                DocumentFormat::Pdf,
                "document structure could not be parsed",
            ));
        }
    };

    Ok(split_paragraphs(&text.replace('\u{000C}', "\n\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_an_extraction_failure() {
        let result = paragraphs(b"%PDF-1.4 this is not really a pdf");
        assert!(matches!(
            result,
            Err(DocumentError::ExtractionFailure {
                format: DocumentFormat::Pdf,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_bytes_fail() {
        assert!(paragraphs(b"").is_err());
    }
}
