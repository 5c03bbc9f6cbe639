//! Paragraph cleanup shared by every format
//!
//! Normalization never rewrites words. It only removes characters and whole
//! paragraphs that carry no prose: control characters, runs of whitespace,
//! page numbers, separator rules, bare links and file paths.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PAGE_NUMBER_REGEX: Regex =
        Regex::new(r"(?i)^(?:page\s*)?[-–—\s]*\d+(?:\s*(?:/|of)\s*\d+)?[-–—\s]*$").unwrap();
    static ref SEPARATOR_REGEX: Regex = Regex::new(r"^[-=_*~]{5,}$").unwrap();
    static ref LINK_REGEX: Regex =
        Regex::new(r"(?i)^(?:https?://|ftp://|www\.|file://|[a-z]:\\|\\\\|/)\S*$").unwrap();
}

/// Normalize raw paragraphs, dropping the ones without prose
///
/// # Examples
///
/// ```
/// use proofline_documents::normalize_paragraphs;
///
/// let cleaned = normalize_paragraphs(vec![
///     "  Some\u{0007}   text ".to_string(),
///     "- 3 -".to_string(),
///     "----------".to_string(),
///     "https://example.com/paper.pdf".to_string(),
/// ]);
/// assert_eq!(cleaned, vec!["Some text"]);
/// ```
pub fn normalize_paragraphs<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    raw.into_iter()
        .map(|p| clean(&p))
        .filter(|p| keep(p))
        .collect()
}

/// Strip control and zero-width characters, collapse whitespace
fn clean(paragraph: &str) -> String {
    let filtered: String = paragraph
        .chars()
        .filter(|c| !is_invisible(*c))
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_invisible(c: char) -> bool {
    (c.is_control() && !c.is_whitespace())
        || matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}')
}

fn keep(paragraph: &str) -> bool {
    if paragraph.is_empty() {
        return false;
    }
    !(PAGE_NUMBER_REGEX.is_match(paragraph)
        || SEPARATOR_REGEX.is_match(paragraph)
        || LINK_REGEX.is_match(paragraph))
}
