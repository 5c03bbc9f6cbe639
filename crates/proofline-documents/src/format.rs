//! Supported document formats

use crate::error::DocumentError;
use std::fmt;

/// Closed set of document formats the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// `.txt`, `.text`
    PlainText,
    /// `.md`, `.markdown`
    Markdown,
    /// `.csv`
    Csv,
    /// `.pdf`
    Pdf,
    /// `.docx`, `.docm`, `.dotx`, `.dotm`
    WordProcessing,
    /// `.xlsx`, `.xlsm`, `.xls`, `.ods`
    Spreadsheet,
    /// `.pptx`, `.pptm`
    Presentation,
}

impl DocumentFormat {
    /// All formats, in a stable order
    pub const ALL: [DocumentFormat; 7] = [
        DocumentFormat::PlainText,
        DocumentFormat::Markdown,
        DocumentFormat::Csv,
        DocumentFormat::Pdf,
        DocumentFormat::WordProcessing,
        DocumentFormat::Spreadsheet,
        DocumentFormat::Presentation,
    ];

    /// Resolve a format from a file extension
    ///
    /// Matching ignores case and an optional leading dot.
    ///
    /// # Examples
    ///
    /// ```
    /// use proofline_documents::DocumentFormat;
    ///
    /// assert_eq!(DocumentFormat::from_extension(".DOCX").unwrap(), DocumentFormat::WordProcessing);
    /// assert!(DocumentFormat::from_extension("doc").is_err());
    /// ```
    pub fn from_extension(extension: &str) -> Result<Self, DocumentError> {
        let ext = normalize_extension(extension);
        match ext.as_str() {
            "txt" | "text" => Ok(DocumentFormat::PlainText),
            "md" | "markdown" => Ok(DocumentFormat::Markdown),
            "csv" => Ok(DocumentFormat::Csv),
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" | "docm" | "dotx" | "dotm" => Ok(DocumentFormat::WordProcessing),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(DocumentFormat::Spreadsheet),
            "pptx" | "pptm" => Ok(DocumentFormat::Presentation),
            _ => Err(DocumentError::UnsupportedFormat(ext)),
        }
    }

    /// Extensions that resolve to this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            DocumentFormat::PlainText => &["txt", "text"],
            DocumentFormat::Markdown => &["md", "markdown"],
            DocumentFormat::Csv => &["csv"],
            DocumentFormat::Pdf => &["pdf"],
            DocumentFormat::WordProcessing => &["docx", "docm", "dotx", "dotm"],
            DocumentFormat::Spreadsheet => &["xlsx", "xlsm", "xls", "ods"],
            DocumentFormat::Presentation => &["pptx", "pptm"],
        }
    }

    /// Every extension the extractor accepts
    pub fn all_extensions() -> Vec<&'static str> {
        Self::ALL.iter().flat_map(|f| f.extensions().iter().copied()).collect()
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentFormat::PlainText => "plain text",
            DocumentFormat::Markdown => "markdown",
            DocumentFormat::Csv => "csv",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::WordProcessing => "word processing",
            DocumentFormat::Spreadsheet => "spreadsheet",
            DocumentFormat::Presentation => "presentation",
        };
        f.write_str(name)
    }
}

/// Lowercase an extension and strip a leading dot
pub(crate) fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_extension_resolves_back() {
        for format in DocumentFormat::ALL {
            for ext in format.extensions() {
                assert_eq!(DocumentFormat::from_extension(ext).unwrap(), format);
            }
        }
    }

    #[test]
    fn test_legacy_binaries_are_unsupported() {
        for ext in ["doc", ".ppt", "rtf", ""] {
            assert!(matches!(
                DocumentFormat::from_extension(ext),
                Err(DocumentError::UnsupportedFormat(_))
            ));
        }
    }

    #[test]
    fn test_unsupported_message_has_dot() {
        let err = DocumentFormat::from_extension("XYZ").unwrap_err();
        assert_eq!(err.to_string(), "unsupported format: .xyz");
    }
}
