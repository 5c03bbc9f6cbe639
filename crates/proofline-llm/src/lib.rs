//! Proofline LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `proofline-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scriptable mock for testing
//! - `ChatProvider`: OpenAI-compatible chat-completions API (DeepSeek by default)
//!
//! Providers make exactly one request per call. Retrying is left to the caller,
//! which uses [`LlmError::kind`] to decide whether another attempt can help.
//!
//! # Examples
//!
//! ```
//! use proofline_llm::MockProvider;
//! use proofline_domain::traits::LlmProvider;
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new("[]");
//! let result = provider.generate("system", "text").await.unwrap();
//! assert_eq!(result, "[]");
//! # });
//! ```

#![warn(missing_docs)]

pub mod chat;
pub mod config;
pub mod mock;

use proofline_domain::traits::{ClassifiedError, FailureKind};
use thiserror::Error;

pub use chat::ChatProvider;
pub use config::BackendConfig;
pub use mock::MockProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The request did not finish in time
    #[error("Request timed out")]
    Timeout,

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The backend failed on its side
    #[error("Server error (HTTP {status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Body or reason returned by the backend
        message: String,
    },

    /// The backend refused the request as malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or rejected credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The backend declined to process the content
    #[error("Content rejected: {0}")]
    ContentRejected(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),
}

impl ClassifiedError for LlmError {
    fn kind(&self) -> FailureKind {
        match self {
            LlmError::Communication(_)
            | LlmError::Timeout
            | LlmError::RateLimited
            | LlmError::Server { .. } => FailureKind::Transient,
            LlmError::InvalidRequest(_)
            | LlmError::Authentication(_)
            | LlmError::ContentRejected(_)
            | LlmError::InvalidResponse(_)
            | LlmError::ModelNotAvailable(_) => FailureKind::Permanent,
        }
    }
}
