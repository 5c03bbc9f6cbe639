//! Proofline CLI library.
//!
//! Configuration, command execution and output formatting for the
//! `proofline` command-line tool.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::AppConfig;
pub use error::{CliError, Result};
pub use output::Formatter;

use proofline_corrector::{CorrectionService, RuleSet};
use proofline_llm::ChatProvider;
use proofline_store::SqliteStore;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Correction service backed by the on-disk task database.
pub type Service<L> = CorrectionService<L, SqliteStore>;

/// Install the stderr log subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

/// Open the task database and connect the configured backend.
pub fn open_service(config: &AppConfig, rules: RuleSet) -> Result<Service<ChatProvider>> {
    if config.backend.api_key.is_none() {
        warn!("No API key configured, requests are sent unauthenticated");
    }

    let provider = ChatProvider::new(config.backend.clone())?;
    let store = SqliteStore::new(&config.database_path)?;

    Ok(CorrectionService::new(provider, store, config.corrector.clone(), rules)?)
}
