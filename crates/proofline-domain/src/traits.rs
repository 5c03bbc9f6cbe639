//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{Correction, ProgressSnapshot, Task, TaskId, TaskStatus};
use std::fmt::Display;
use std::future::Future;

/// Trait for durable task persistence
///
/// Implemented by the infrastructure layer (proofline-store).
///
/// Every state transition is atomic: a reader never observes a completed task
/// with an incomplete result, nor a processed count without the matching
/// corrections.
pub trait TaskStore {
    /// Error type for store operations
    type Error;

    /// Persist a new pending task
    fn create_task(&mut self, task: &Task) -> Result<(), Self::Error>;

    /// Get a task by ID, including its result
    fn get_task(&self, id: TaskId) -> Result<Option<Task>, Self::Error>;

    /// List tasks matching criteria, newest first, without results
    fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, Self::Error>;

    /// Claim a pending task and fix its unit count
    fn mark_running(&mut self, id: TaskId, total_units: u32, at: u64) -> Result<(), Self::Error>;

    /// Record the outcome of one unit together with the new progress
    fn record_unit(&mut self, id: TaskId, record: &UnitRecord) -> Result<(), Self::Error>;

    /// Finish a running task whose units have all been recorded
    fn mark_completed(&mut self, id: TaskId, at: u64) -> Result<(), Self::Error>;

    /// Finish a pending or running task with a cause
    fn mark_failed(&mut self, id: TaskId, cause: &str, at: u64) -> Result<(), Self::Error>;

    /// Tasks left pending or running, e.g. by a previous process
    fn interrupted_tasks(&self) -> Result<Vec<TaskId>, Self::Error>;
}

/// Query criteria for listing tasks
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    /// Filter by status
    pub status: Option<TaskStatus>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

/// Outcome of a single correction unit
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    /// The backend answered; may be empty when the text needs no change
    Corrected(Vec<Correction>),

    /// The unit is a gap in the result
    Failed(String),
}

/// Everything persisted when one unit resolves
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRecord {
    /// Index of the resolved unit
    pub unit_index: usize,

    /// What the unit produced
    pub outcome: UnitOutcome,

    /// Progress after counting this unit
    pub progress: ProgressSnapshot,

    /// Wall-clock time of the write (unix seconds)
    pub recorded_at: u64,
}

/// Whether retrying a failed backend call can help
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network trouble, timeouts, throttling, server-side errors
    Transient,
    /// Rejected input, bad credentials, unusable responses
    Permanent,
}

/// Errors that know whether they are worth retrying
pub trait ClassifiedError: Display {
    /// Classification of this error
    fn kind(&self) -> FailureKind;

    /// Shorthand for `kind() == Transient`
    fn is_transient(&self) -> bool {
        self.kind() == FailureKind::Transient
    }
}

/// Trait for language-analysis backends
///
/// Implemented by the infrastructure layer (proofline-llm). One call is one
/// request; retries belong to the caller.
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error: ClassifiedError + Send;

    /// Generate a completion for a system prompt and a user message
    fn generate(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}
