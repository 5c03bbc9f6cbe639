//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use proofline_domain::TaskStatus;
use std::path::PathBuf;

/// Proofline - Proofread documents with a language model.
#[derive(Debug, Parser)]
#[command(name = "proofline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Task database path
    #[arg(long, global = true, env = "PROOFLINE_DATABASE")]
    pub database: Option<String>,

    /// Proofreading rules file
    #[arg(long, global = true, env = "PROOFLINE_RULES_FILE")]
    pub rules_file: Option<PathBuf>,

    /// Backend API key
    #[arg(long, global = true, env = "PROOFLINE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Backend model name
    #[arg(long, global = true, env = "PROOFLINE_MODEL")]
    pub model: Option<String>,

    /// Backend base URL
    #[arg(long, global = true, env = "PROOFLINE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Character budget per correction unit
    #[arg(long, global = true, env = "PROOFLINE_MAX_CHARS")]
    pub max_chars: Option<usize>,

    /// Accepted file extensions (comma separated)
    #[arg(long, global = true, env = "PROOFLINE_ALLOWED_EXTENSIONS", value_delimiter = ',')]
    pub allowed_extensions: Vec<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Correct a document and wait for the result
    Correct(CorrectArgs),

    /// Show a task and its corrections
    Status(StatusArgs),

    /// List tasks, newest first
    List(ListArgs),

    /// Mark tasks abandoned by an earlier run as failed
    Recover,

    /// Show the active proofreading rules
    Rules(RulesArgs),
}

/// Arguments for the correct command.
#[derive(Debug, Parser)]
pub struct CorrectArgs {
    /// Document to correct
    pub file: PathBuf,

    /// Maximum units in flight
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Do not print progress while waiting
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the status command.
#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Task ID
    pub id: String,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Filter by status
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,

    /// Maximum number of results
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

/// Arguments for the rules command.
#[derive(Debug, Parser)]
pub struct RulesArgs {
    /// Show the full system prompt instead of the rules alone
    #[arg(long)]
    pub prompt: bool,
}

/// Task status argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StatusArg {
    /// Accepted, not started
    Pending,
    /// In progress
    Running,
    /// Finished with a result
    Completed,
    /// Finished without a result
    Failed,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<StatusArg> for TaskStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Pending => TaskStatus::Pending,
            StatusArg::Running => TaskStatus::Running,
            StatusArg::Completed => TaskStatus::Completed,
            StatusArg::Failed => TaskStatus::Failed,
        }
    }
}
