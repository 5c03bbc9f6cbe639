//! Merge paragraphs into correction units

use proofline_domain::CorrectionUnit;
use tracing::{debug, warn};

/// Paragraph separator inside a unit
const SEPARATOR: char = '\n';

/// Greedily packs consecutive paragraphs into units under a character budget
///
/// Lengths are counted in Unicode scalar values, separators included. A
/// paragraph longer than the budget is never split; it becomes a unit of its
/// own.
pub struct ParagraphMerger {
    max_chars: usize,
}

impl ParagraphMerger {
    /// Create a new merger with the given budget
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Merge paragraphs, in order, into units indexed from 0
    ///
    /// # Examples
    ///
    /// ```
    /// use proofline_corrector::ParagraphMerger;
    ///
    /// let paragraphs = vec!["One.".to_string(), "Two.".to_string(), "Three.".to_string()];
    /// let units = ParagraphMerger::new(10).merge(&paragraphs);
    ///
    /// assert_eq!(units.len(), 2);
    /// assert_eq!(units[0].source_text, "One.\nTwo.");
    /// assert_eq!(units[1].paragraphs, 2..3);
    /// ```
    pub fn merge(&self, paragraphs: &[String]) -> Vec<CorrectionUnit> {
        let mut units = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;
        let mut start = 0usize;
        let mut end = 0usize;

        for (idx, paragraph) in paragraphs.iter().enumerate() {
            if paragraph.trim().is_empty() {
                continue;
            }
            let len = paragraph.chars().count();

            if !current.is_empty() && current_len + 1 + len > self.max_chars {
                self.push_unit(&mut units, std::mem::take(&mut current), start..end);
                current_len = 0;
            }

            if current.is_empty() {
                start = idx;
                current_len = len;
            } else {
                current.push(SEPARATOR);
                current_len += 1 + len;
            }
            current.push_str(paragraph);
            end = idx + 1;
        }

        if !current.is_empty() {
            self.push_unit(&mut units, current, start..end);
        }

        debug!("Merged {} paragraphs into {} units", paragraphs.len(), units.len());
        units
    }

    fn push_unit(&self, units: &mut Vec<CorrectionUnit>, text: String, range: std::ops::Range<usize>) {
        let unit = CorrectionUnit::new(units.len(), text, range);
        if unit.char_len() > self.max_chars {
            warn!(
                "Unit {} is {} chars, over the {} char budget; sending it whole",
                unit.index + 1,
                unit.char_len(),
                self.max_chars
            );
        }
        units.push(unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn owned(paragraphs: &[&str]) -> Vec<String> {
        paragraphs.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(ParagraphMerger::new(100).merge(&[]).is_empty());
    }

    #[test]
    fn test_everything_fits_in_one_unit() {
        let units = ParagraphMerger::new(100).merge(&owned(&["a", "b", "c"]));
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].source_text, "a\nb\nc");
        assert_eq!(units[0].paragraphs, 0..3);
    }

    #[test]
    fn test_separator_counts_toward_budget() {
        // "aaaa\nbbbb" is 9 chars
        let units = ParagraphMerger::new(8).merge(&owned(&["aaaa", "bbbb"]));
        assert_eq!(units.len(), 2);

        let units = ParagraphMerger::new(9).merge(&owned(&["aaaa", "bbbb"]));
        assert_eq!(units.len(), 1);
    }

    #[test]
    fn test_oversized_paragraph_kept_whole() {
        let long = "x".repeat(50);
        let units = ParagraphMerger::new(10).merge(&owned(&["short", &long, "tail"]));

        assert_eq!(units.len(), 3);
        assert_eq!(units[1].source_text, long);
        assert_eq!(units[1].paragraphs, 1..2);
        assert_eq!(units[2].index, 2);
    }

    #[test]
    fn test_blank_paragraphs_skipped_but_counted() {
        let units = ParagraphMerger::new(100).merge(&owned(&["", "first", "  ", "second", ""]));
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].source_text, "first\nsecond");
        assert_eq!(units[0].paragraphs, 1..4);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // 4 chars, 12 bytes each
        let units = ParagraphMerger::new(9).merge(&owned(&["日本語文", "中文文本"]));
        assert_eq!(units.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_merge_round_trips(
            paragraphs in prop::collection::vec("[a-zA-Z .,]{0,60}", 0..40),
            max_chars in 1usize..200,
        ) {
            let units = ParagraphMerger::new(max_chars).merge(&paragraphs);

            let joined: Vec<String> = units
                .iter()
                .flat_map(|u| u.source_text.split(SEPARATOR).map(str::to_string).collect::<Vec<_>>())
                .collect();
            let expected: Vec<String> = paragraphs
                .iter()
                .filter(|p| !p.trim().is_empty())
                .cloned()
                .collect();
            prop_assert_eq!(joined, expected);
        }

        #[test]
        fn prop_units_respect_budget(
            paragraphs in prop::collection::vec("[a-z ]{1,80}", 0..40),
            max_chars in 1usize..200,
        ) {
            let units = ParagraphMerger::new(max_chars).merge(&paragraphs);

            for (position, unit) in units.iter().enumerate() {
                prop_assert_eq!(unit.index, position);
                let single_paragraph = !unit.source_text.contains(SEPARATOR);
                prop_assert!(unit.char_len() <= max_chars || single_paragraph);
            }

            for pair in units.windows(2) {
                prop_assert!(pair[0].paragraphs.end <= pair[1].paragraphs.start);
            }
        }
    }
}
