//! Task module - one submitted document and its correction lifecycle

use crate::progress::ProgressSnapshot;
use crate::unit::Correction;
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a task based on UUIDv7
///
/// UUIDv7 gives chronological sortability, so listing tasks by id
/// also lists them by submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u128);

impl TaskId {
    /// Generate a new UUIDv7-based TaskId
    ///
    /// # Examples
    ///
    /// ```
    /// use proofline_domain::TaskId;
    ///
    /// let id = TaskId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a TaskId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a TaskId from its hyphenated string form
    ///
    /// # Examples
    ///
    /// ```
    /// use proofline_domain::TaskId;
    ///
    /// let id = TaskId::new();
    /// let parsed = TaskId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid task id '{}': {}", s, e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Milliseconds since Unix epoch encoded in the UUIDv7 prefix
    pub fn timestamp(&self) -> u64 {
        (self.0 >> 80) as u64
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

/// Lifecycle state of a task
///
/// `Pending -> Running -> {Completed, Failed}`. A pending task may also fail
/// directly (extraction failure, empty document, interrupted before start).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Accepted, not yet claimed by an orchestrator
    Pending,
    /// Units are being dispatched
    Running,
    /// Every unit was processed; the result is final
    Completed,
    /// Terminated with a task-level cause
    Failed,
}

impl TaskStatus {
    /// Stable lowercase name, used in storage and output
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Pending, TaskStatus::Failed)
                | (TaskStatus::Running, TaskStatus::Completed)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "running" => Ok(TaskStatus::Running),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(format!("Unknown task status: {}", other)),
        }
    }
}

/// A correction task for one uploaded document
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique identifier, assigned at creation
    pub id: TaskId,

    /// Name given at upload
    pub filename: String,

    /// Current lifecycle state
    pub status: TaskStatus,

    /// When the upload was accepted (unix seconds)
    pub created_at: u64,

    /// When the orchestrator claimed the task
    pub started_at: Option<u64>,

    /// When the task reached a terminal state
    pub completed_at: Option<u64>,

    /// Last persisted write
    pub updated_at: u64,

    /// Number of correction units the document was split into
    pub total_units: u32,

    /// Units resolved so far, successful or not
    pub processed_units: u32,

    /// Units that contributed no corrections because they failed
    pub failed_units: u32,

    /// Seconds spent processing units at the last progress update
    pub elapsed_secs: f64,

    /// Estimated seconds left at the last progress update
    pub estimated_remaining_secs: f64,

    /// Corrections ordered by unit index, then by position within the unit
    pub result: Vec<Correction>,

    /// Short human-readable cause, set only when failed
    pub error: Option<String>,
}

impl Task {
    /// Create a new pending task
    pub fn new(filename: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: TaskId::new(),
            filename: filename.into(),
            status: TaskStatus::Pending,
            created_at,
            started_at: None,
            completed_at: None,
            updated_at: created_at,
            total_units: 0,
            processed_units: 0,
            failed_units: 0,
            elapsed_secs: 0.0,
            estimated_remaining_secs: 0.0,
            result: Vec::new(),
            error: None,
        }
    }

    /// Whether the task has finished, successfully or not
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Last persisted progress
    pub fn progress(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            processed_units: self.processed_units,
            total_units: self.total_units,
            elapsed_secs: self.elapsed_secs,
            estimated_remaining_secs: self.estimated_remaining_secs,
        }
    }
}
