//! Configuration management for the CLI.

use crate::cli::Cli;
use crate::error::{CliError, Result};
use proofline_corrector::{CorrectorConfig, RuleSet};
use proofline_llm::BackendConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database holding tasks and results
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Proofreading rules; the built-in rules when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output settings
    #[serde(default)]
    pub settings: Settings,

    /// Language backend
    #[serde(default)]
    pub backend: BackendConfig,

    /// Pipeline tuning
    #[serde(default)]
    pub corrector: CorrectorConfig,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl AppConfig {
    /// Load configuration from a file, or use defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    CliError::Config(format!("Could not read {}: {}", path.display(), e))
                })?;
                Ok(toml::from_str(&contents)?)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line flags and their environment variables.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(database) = &cli.database {
            self.database_path = database.clone();
        }
        if let Some(rules_file) = &cli.rules_file {
            self.rules_file = Some(rules_file.clone());
        }
        if let Some(api_key) = &cli.api_key {
            self.backend.api_key = Some(api_key.clone());
        }
        if let Some(model) = &cli.model {
            self.backend.model = model.clone();
        }
        if let Some(endpoint) = &cli.endpoint {
            self.backend.endpoint = endpoint.clone();
        }
        if let Some(max_chars) = cli.max_chars {
            self.corrector.max_chars_per_unit = max_chars;
        }
        if !cli.allowed_extensions.is_empty() {
            self.corrector.allowed_extensions = cli
                .allowed_extensions
                .iter()
                .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect();
        }
        if cli.verbose {
            self.log_level = "debug".to_string();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.trim().is_empty() {
            return Err(CliError::Config("database_path must not be empty".into()));
        }
        self.backend
            .validate()
            .map_err(|e| CliError::Config(format!("[backend] {}", e)))?;
        self.corrector
            .validate()
            .map_err(|e| CliError::Config(format!("[corrector] {}", e)))?;
        Ok(())
    }

    /// Load the configured rules.
    pub fn rule_set(&self) -> Result<RuleSet> {
        match &self.rules_file {
            Some(path) => Ok(RuleSet::from_file(path)?),
            None => Ok(RuleSet::default()),
        }
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            rules_file: None,
            log_level: default_log_level(),
            settings: Settings::default(),
            backend: BackendConfig::default(),
            corrector: CorrectorConfig::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_database_path() -> String {
    "proofline.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.database_path, "proofline.db");
        assert_eq!(config.log_level, "info");
        assert!(config.rules_file.is_none());
        assert!(config.settings.color);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
database_path = "/var/lib/proofline/tasks.db"

[backend]
model = "local-model"
endpoint = "http://localhost:8080/v1"

[corrector]
max_concurrency = 2
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.database_path, "/var/lib/proofline/tasks.db");
        assert_eq!(config.backend.model, "local-model");
        assert_eq!(config.corrector.max_concurrency, 2);
        assert_eq!(
            config.corrector.max_chars_per_unit,
            CorrectorConfig::default().max_chars_per_unit
        );
        assert_eq!(config.settings.format, OutputFormat::Table);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load(Some(dir.path().join("absent.toml").as_path()));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database_path = [").unwrap();
        assert!(matches!(AppConfig::load(Some(file.path())), Err(CliError::Toml(_))));
    }

    #[test]
    fn test_flags_override_file_values() {
        let cli = Cli::parse_from([
            "proofline",
            "--database",
            "other.db",
            "--model",
            "bigger-model",
            "--max-chars",
            "1200",
            "--allowed-extensions",
            ".TXT, md",
            "-v",
            "recover",
        ]);

        let mut config = AppConfig::default();
        config.apply_overrides(&cli);

        assert_eq!(config.database_path, "other.db");
        assert_eq!(config.backend.model, "bigger-model");
        assert_eq!(config.corrector.max_chars_per_unit, 1200);
        assert_eq!(config.corrector.allowed_extensions, vec!["txt", "md"]);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_validate_reports_section() {
        let mut config = AppConfig::default();
        config.corrector.max_concurrency = 0;
        match config.validate() {
            Err(CliError::Config(message)) => assert!(message.starts_with("[corrector]")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_toml_roundtrip_keeps_settings() {
        let mut config = AppConfig::default();
        config.settings.format = OutputFormat::Json;
        config.rules_file = Some(PathBuf::from("rules.txt"));

        let parsed: AppConfig = toml::from_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.settings.format, OutputFormat::Json);
        assert_eq!(parsed.rules_file, Some(PathBuf::from("rules.txt")));
        assert_eq!(parsed.corrector, config.corrector);
    }
}
