//! Proofreading rules sent to the backend with every unit

use crate::error::CorrectorError;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

/// Rules used when no rules file is configured or found
pub const DEFAULT_RULES: &str = "\
1. Fix grammatical errors in academic writing, including punctuation, spelling and sentence structure
2. Replace inappropriate academic expressions with more professional and precise wording
3. Correct inconsistent tense and voice
4. Smooth out incoherent or awkward sentences
5. Revise inaccurate or vague statements
6. Remove redundant or repeated content";

/// Free-form proofreading instructions
///
/// A rule set is immutable. Tasks hold it behind an `Arc`, so replacing the
/// active rules never affects a task that is already running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    text: String,
}

impl RuleSet {
    /// Create a rule set from instruction text
    pub fn new(text: impl Into<String>) -> Result<Self, CorrectorError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(CorrectorError::RuleSet("rule text is empty".to_string()));
        }
        Ok(Self { text })
    }

    /// Load rules from a file, falling back to the defaults when it does not exist
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CorrectorError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => {
                let rules = Self::new(text).map_err(|_| {
                    CorrectorError::RuleSet(format!("{} contains no rules", path.display()))
                })?;
                info!("Loaded {} chars of rules from {}", rules.text.len(), path.display());
                Ok(rules)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Rules file {} not found, using default rules", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(CorrectorError::RuleSet(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// The instruction text
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            text: DEFAULT_RULES.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_new_trims_and_rejects_empty() {
        assert_eq!(RuleSet::new("  be terse \n").unwrap().text(), "be terse");
        assert!(matches!(RuleSet::new(" \n "), Err(CorrectorError::RuleSet(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1. Use British spelling").unwrap();

        let rules = RuleSet::from_file(file.path()).unwrap();
        assert_eq!(rules.text(), "1. Use British spelling");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let rules = RuleSet::from_file(dir.path().join("absent.txt")).unwrap();
        assert_eq!(rules, RuleSet::default());
    }

    #[test]
    fn test_empty_file_is_an_error() {
        let file = NamedTempFile::new().unwrap();
        assert!(RuleSet::from_file(file.path()).is_err());
    }

    #[test]
    fn test_default_rules() {
        let rules = RuleSet::default();
        assert_eq!(rules.text().lines().count(), 6);
    }
}
