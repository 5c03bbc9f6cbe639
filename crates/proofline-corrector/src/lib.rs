//! Proofline Corrector
//!
//! Turns an uploaded document into a list of suggested corrections.
//!
//! # Overview
//!
//! A submitted document becomes a task. The task's text is extracted, merged
//! into correction units under a character budget, and every unit is sent to
//! a language backend by a bounded pool of workers. Each resolved unit is
//! persisted at once together with the task's progress, and a progress event
//! is published. Units that fail after retries leave a gap in the result
//! but never fail the task.
//!
//! # Architecture
//!
//! ```text
//! DocumentUpload → CorrectionService → CorrectionOrchestrator
//!                                        ├─ extract (proofline-documents)
//!                                        ├─ ParagraphMerger
//!                                        ├─ CorrectionClient ×N → LlmProvider
//!                                        └─ coordinator → TaskStore + ProgressHub
//! ```
//!
//! # Example Usage
//!
//! ```
//! use proofline_corrector::{CorrectionService, CorrectorConfig, DocumentUpload, RuleSet};
//! use proofline_domain::TaskStatus;
//! use proofline_llm::MockProvider;
//! use proofline_store::SqliteStore;
//!
//! # tokio_test::block_on(async {
//! let service = CorrectionService::new(
//!     MockProvider::new(r#"[{"original": "recieve", "corrected": "receive"}]"#),
//!     SqliteStore::new(":memory:").unwrap(),
//!     CorrectorConfig::default(),
//!     RuleSet::default(),
//! )
//! .unwrap();
//!
//! let upload = DocumentUpload::new("letter.txt", b"We recieve many letters.".to_vec());
//! let task_id = service.submit_document(upload).unwrap();
//!
//! let task = service.wait(task_id).await.unwrap();
//! assert_eq!(task.status, TaskStatus::Completed);
//! assert_eq!(task.result[0].corrected, "receive");
//! # });
//! ```

#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod merger;
mod orchestrator;
mod parser;
mod progress;
mod prompt;
mod rules;
mod service;


pub use client::CorrectionClient;
pub use config::{CorrectorConfig, DEFAULT_EXTENSIONS};
pub use error::{CorrectorError, UnitFailure};
pub use merger::ParagraphMerger;
pub use orchestrator::{CorrectionOrchestrator, Document};
pub use parser::parse_corrections;
pub use progress::{ProgressEvent, ProgressHub, ProgressStream};
pub use prompt::PromptBuilder;
pub use rules::{RuleSet, DEFAULT_RULES};
pub use service::{CorrectionService, DocumentUpload, INTERRUPTED_CAUSE};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in unix seconds
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
