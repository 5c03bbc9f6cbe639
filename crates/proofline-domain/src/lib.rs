//! Proofline Domain Layer
//!
//! This crate contains the core model of the document-correction pipeline.
//! Its only external dependency is `uuid`, used for task identifiers. It defines
//! the value objects and the trait interfaces that all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Task**: One submitted document and its lifecycle (pending → running → completed/failed)
//! - **Correction Unit**: A batch of adjacent paragraphs sent to the backend as one request
//! - **Correction**: A single original → corrected replacement suggested by the backend
//! - **Progress Snapshot**: Counters plus elapsed time and an estimate of the remaining time
//!
//! ## Architecture
//!
//! - Pure data and rules only
//! - Infrastructure implementations (storage, LLM backends) live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod progress;
pub mod task;
pub mod traits;
pub mod unit;

// Re-exports for convenience
pub use progress::ProgressSnapshot;
pub use task::{Task, TaskId, TaskStatus};
pub use unit::{Correction, CorrectionUnit, ParagraphRange};
