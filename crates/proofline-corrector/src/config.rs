//! Configuration for the correction pipeline

use proofline_documents::DocumentFormat;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Extensions accepted at submission unless configured otherwise
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "docx", "docm", "dotm", "pdf", "txt", "text", "csv", "xls", "xlsx", "xlsm", "md", "markdown",
    "pptx", "pptm",
];

/// Configuration for the correction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectorConfig {
    /// Maximum number of units in flight per task
    pub max_concurrency: usize,

    /// Backend attempts per unit, including the first
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds); doubles on every retry
    pub retry_backoff_ms: u64,

    /// Upper bound on the retry delay (milliseconds)
    pub max_backoff_ms: u64,

    /// Maximum time for a single backend call (seconds)
    pub unit_timeout_secs: u64,

    /// Character budget when merging paragraphs into units
    pub max_chars_per_unit: usize,

    /// File extensions accepted at submission, without the leading dot
    pub allowed_extensions: Vec<String>,

    /// Progress events buffered per subscriber before the oldest are dropped
    pub event_buffer: usize,
}

impl CorrectorConfig {
    /// Get the per-call timeout as a Duration
    pub fn unit_timeout(&self) -> Duration {
        Duration::from_secs(self.unit_timeout_secs)
    }

    /// Delay before retrying after the given failed attempt (1-based)
    ///
    /// # Examples
    ///
    /// ```
    /// use proofline_corrector::CorrectorConfig;
    /// use std::time::Duration;
    ///
    /// let config = CorrectorConfig::default();
    /// assert_eq!(config.backoff_for(1), Duration::from_millis(1000));
    /// assert_eq!(config.backoff_for(2), Duration::from_millis(2000));
    /// assert_eq!(config.backoff_for(10), Duration::from_millis(8000));
    /// ```
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let delay = self.retry_backoff_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(delay.min(self.max_backoff_ms))
    }

    /// Whether an extension may be submitted
    ///
    /// Matching is case-insensitive and ignores a leading dot.
    pub fn allows_extension(&self, extension: &str) -> bool {
        let ext = extension.trim().trim_start_matches('.');
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim().trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.unit_timeout_secs == 0 {
            return Err("unit_timeout_secs must be greater than 0".to_string());
        }
        if self.max_chars_per_unit == 0 {
            return Err("max_chars_per_unit must be greater than 0".to_string());
        }
        if self.retry_backoff_ms > self.max_backoff_ms {
            return Err("retry_backoff_ms cannot exceed max_backoff_ms".to_string());
        }
        if self.event_buffer == 0 {
            return Err("event_buffer must be greater than 0".to_string());
        }
        if self.allowed_extensions.is_empty() {
            return Err("allowed_extensions cannot be empty".to_string());
        }
        for ext in &self.allowed_extensions {
            if DocumentFormat::from_extension(ext).is_err() {
                return Err(format!("allowed extension '{}' has no extractor", ext));
            }
        }
        Ok(())
    }
}

impl Default for CorrectorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            max_attempts: 3,
            retry_backoff_ms: 1000,
            max_backoff_ms: 8000,
            unit_timeout_secs: 120,
            max_chars_per_unit: 3000,
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            event_buffer: 256,
        }
    }
}

impl CorrectorConfig {
    /// Aggressive preset: more parallelism, fewer retries, smaller units
    pub fn aggressive() -> Self {
        Self {
            max_concurrency: 10,
            max_attempts: 2,
            retry_backoff_ms: 250,
            max_backoff_ms: 2000,
            unit_timeout_secs: 60,
            max_chars_per_unit: 2000,
            ..Self::default()
        }
    }

    /// Lenient preset: gentle on the backend, patient with slow responses
    pub fn lenient() -> Self {
        Self {
            max_concurrency: 2,
            max_attempts: 5,
            retry_backoff_ms: 2000,
            max_backoff_ms: 30_000,
            unit_timeout_secs: 300,
            max_chars_per_unit: 5000,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CorrectorConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_aggressive_config_is_valid() {
        assert!(CorrectorConfig::aggressive().validate().is_ok());
    }

    #[test]
    fn test_lenient_config_is_valid() {
        assert!(CorrectorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_concurrency() {
        let mut config = CorrectorConfig::default();
        config.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_cannot_exceed_cap() {
        let mut config = CorrectorConfig::default();
        config.retry_backoff_ms = config.max_backoff_ms + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_allowed_extension() {
        let mut config = CorrectorConfig::default();
        config.allowed_extensions.push("doc".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let config = CorrectorConfig::default();
        let delays: Vec<u64> = (1..=5).map(|n| config.backoff_for(n).as_millis() as u64).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 8000]);
        assert_eq!(config.backoff_for(u32::MAX), Duration::from_millis(8000));
    }

    #[test]
    fn test_allows_extension() {
        let config = CorrectorConfig::default();
        assert!(config.allows_extension("docx"));
        assert!(config.allows_extension(".PDF"));
        assert!(!config.allows_extension("doc"));
        assert!(!config.allows_extension("exe"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = CorrectorConfig::from_toml("max_concurrency = 2\n").unwrap();
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.allowed_extensions.len(), DEFAULT_EXTENSIONS.len());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CorrectorConfig::lenient();
        let toml_str = config.to_toml().unwrap();
        let parsed = CorrectorConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }
}
