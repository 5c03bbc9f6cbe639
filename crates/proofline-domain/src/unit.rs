//! Correction units and the corrections they produce

use std::ops::Range;

/// Half-open range of source paragraph indices a unit was merged from
pub type ParagraphRange = Range<usize>;

/// A batch of adjacent paragraphs sent to the backend as one request
///
/// Units are immutable once built. `index` is 0-based and contiguous
/// across a task; it fixes both result ordering and progress counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionUnit {
    /// Position in the processing sequence
    pub index: usize,

    /// Merged paragraph text sent to the backend
    pub source_text: String,

    /// Source paragraphs covered by this unit
    pub paragraphs: ParagraphRange,
}

impl CorrectionUnit {
    /// Create a new unit
    pub fn new(index: usize, source_text: impl Into<String>, paragraphs: ParagraphRange) -> Self {
        Self {
            index,
            source_text: source_text.into(),
            paragraphs,
        }
    }

    /// Length in Unicode scalar values
    pub fn char_len(&self) -> usize {
        self.source_text.chars().count()
    }
}

/// A single replacement suggested by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    /// Text as it appears in the source
    pub original: String,

    /// Suggested replacement
    pub corrected: String,

    /// Optional explanation from the backend
    pub reason: Option<String>,

    /// Unit that produced this correction
    pub unit_index: usize,
}

impl Correction {
    /// Create a correction without a reason
    pub fn new(unit_index: usize, original: impl Into<String>, corrected: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            corrected: corrected.into(),
            reason: None,
            unit_index,
        }
    }

    /// Attach a reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// A correction that changes nothing
    pub fn is_noop(&self) -> bool {
        self.original == self.corrected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_char_len_counts_scalars() {
        let unit = CorrectionUnit::new(0, "héllo 世界", 0..1);
        assert_eq!(unit.char_len(), 8);
    }

    #[test]
    fn test_correction_noop() {
        assert!(Correction::new(0, "same", "same").is_noop());
        assert!(!Correction::new(0, "teh", "the").is_noop());
    }

    #[test]
    fn test_correction_with_reason() {
        let c = Correction::new(3, "teh", "the").with_reason("spelling");
        assert_eq!(c.reason.as_deref(), Some("spelling"));
        assert_eq!(c.unit_index, 3);
    }
}
