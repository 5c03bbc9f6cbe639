//! Markdown to plain paragraphs
//!
//! Markup is stripped line by line. Headings become paragraphs of their own,
//! fenced code blocks are dropped, and inline syntax is reduced to its text.

use crate::error::DocumentError;
use crate::format::DocumentFormat;
use crate::text::{decode, split_paragraphs};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IMAGE: Regex = Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap();
    static ref LINK: Regex = Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap();
    static ref CODE: Regex = Regex::new(r"`([^`]+)`").unwrap();
    static ref STRONG: Regex = Regex::new(r"(\*\*|__)(.+?)(\*\*|__)").unwrap();
    static ref EMPHASIS: Regex = Regex::new(r"\*([^*\s][^*]*)\*").unwrap();
    static ref STRIKE: Regex = Regex::new(r"~~(.+?)~~").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"</?[A-Za-z][^>]*>").unwrap();

    static ref HEADING: Regex = Regex::new(r"^#{1,6}\s+(.*?)\s*#*$").unwrap();
    static ref LIST_MARKER: Regex = Regex::new(r"^(?:[-*+]|\d+[.)])\s+(?:\[[ xX]\]\s+)?").unwrap();
    static ref QUOTE: Regex = Regex::new(r"^(?:>\s?)+").unwrap();
    static ref RULE: Regex = Regex::new(r"^(?:[-*_]\s*){3,}$").unwrap();
    static ref TABLE_DIVIDER: Regex =
        Regex::new(r"^\|?\s*:?-{3,}:?\s*(?:\|\s*:?-{3,}:?\s*)*\|?$").unwrap();
}

/// Reduce inline markup to its visible text
fn strip_inline(line: &str) -> String {
    let line = IMAGE.replace_all(line, "$1");
    let line = LINK.replace_all(&line, "$1");
    let line = CODE.replace_all(&line, "$1");
    let line = STRONG.replace_all(&line, "$2");
    let line = EMPHASIS.replace_all(&line, "$1");
    let line = STRIKE.replace_all(&line, "$1");
    let line = HTML_TAG.replace_all(&line, "");
    line.into_owned()
}

/// Strip markdown syntax, keeping paragraph boundaries as blank lines
pub(crate) fn to_plain_text(source: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_fence = false;

    for raw in source.lines() {
        let line = raw.trim();

        if line.starts_with("```") || line.starts_with("~~~") {
            in_fence = !in_fence;
            out.push(String::new());
            continue;
        }
        if in_fence || RULE.is_match(line) || TABLE_DIVIDER.is_match(line) {
            out.push(String::new());
            continue;
        }

        if let Some(caps) = HEADING.captures(line) {
            let title = caps.get(1).map_or("", |m| m.as_str());
            out.push(String::new());
            out.push(strip_inline(title));
            out.push(String::new());
            continue;
        }

        let line = QUOTE.replace(line, "");
        let line = LIST_MARKER.replace(&line, "");
        let line = if line.contains('|') {
            line.split('|')
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            line.into_owned()
        };

        out.push(strip_inline(&line));
    }

    out.join("\n")
}

/// Paragraphs of a markdown document
pub(crate) fn paragraphs(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    let source = decode(bytes, DocumentFormat::Markdown)?;
    Ok(split_paragraphs(&to_plain_text(&source)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_is_own_paragraph() {
        let md = "# Introduction\nThis study examines *novel* methods.";
        assert_eq!(
            paragraphs(md.as_bytes()).unwrap(),
            vec!["Introduction", "This study examines novel methods."]
        );
    }

    #[test]
    fn test_inline_markup_stripped() {
        let md = "See [the docs](https://x.org) and **bold** text with `code` and ~~old~~ <b>tags</b>.";
        assert_eq!(
            paragraphs(md.as_bytes()).unwrap(),
            vec!["See the docs and bold text with code and old tags."]
        );
    }

    #[test]
    fn test_code_fences_dropped() {
        let md = "Before.\n\n```rust\nfn main() {}\n```\n\nAfter.";
        assert_eq!(paragraphs(md.as_bytes()).unwrap(), vec!["Before.", "After."]);
    }

    #[test]
    fn test_lists_and_quotes() {
        let md = "- first item\n- [x] second item\n\n> quoted line\n1. numbered";
        assert_eq!(
            paragraphs(md.as_bytes()).unwrap(),
            vec!["first item second item", "quoted line numbered"]
        );
    }

    #[test]
    fn test_tables_flattened() {
        let md = "| Name | Score |\n|------|------:|\n| Ann | 3 |";
        assert_eq!(paragraphs(md.as_bytes()).unwrap(), vec!["Name Score", "Ann 3"]);
    }

    #[test]
    fn test_snake_case_survives() {
        let md = "The variable my_value_name is used.";
        assert_eq!(paragraphs(md.as_bytes()).unwrap(), vec![md]);
    }

    #[test]
    fn test_patterns_compile() {
        lazy_static::initialize(&IMAGE);
        lazy_static::initialize(&LINK);
        lazy_static::initialize(&CODE);
        lazy_static::initialize(&STRONG);
        lazy_static::initialize(&EMPHASIS);
        lazy_static::initialize(&STRIKE);
        lazy_static::initialize(&HTML_TAG);
        lazy_static::initialize(&HEADING);
        lazy_static::initialize(&LIST_MARKER);
        lazy_static::initialize(&QUOTE);
        lazy_static::initialize(&RULE);
        lazy_static::initialize(&TABLE_DIVIDER);
    }

    #[test]
    fn test_unreadable_markdown_fails() {
        let bytes = [0xFF, 0xFE, 0x00, 0xD8, 0x00, 0xD8, 0x00, 0xD8];
        assert!(matches!(
            paragraphs(&bytes),
            Err(DocumentError::ExtractionFailure {
                format: DocumentFormat::Markdown,
                ..
            })
        ));
    }
}
