//! Error types for the correction pipeline

use proofline_documents::DocumentError;
use proofline_domain::TaskId;
use thiserror::Error;

/// Errors that can occur while submitting or running a task
///
/// The display form of the task-level variants doubles as the failure cause
/// stored on the task.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorrectorError {
    /// The extension is unknown or not allowed
    #[error("unsupported format: .{0}")]
    UnsupportedFormat(String),

    /// The document could not be read
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The document contains no text
    #[error("empty document")]
    EmptyDocument,

    /// Task store error
    #[error("storage failure: {0}")]
    Storage(String),

    /// No task with this id
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The rule set could not be loaded
    #[error("Rule set error: {0}")]
    RuleSet(String),
}

impl From<DocumentError> for CorrectorError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::UnsupportedFormat(ext) => CorrectorError::UnsupportedFormat(ext),
            DocumentError::ExtractionFailure { format, reason } => {
                CorrectorError::Extraction(format!("{} ({})", reason, format))
            }
        }
    }
}

/// Why a single unit contributed nothing to the result
///
/// A unit failure is recorded as a gap; it never fails the task.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitFailure {
    /// Every attempt hit a transient error
    #[error("gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Error from the final attempt
        last_error: String,
    },

    /// Retrying cannot help
    #[error("{0}")]
    Permanent(String),
}
