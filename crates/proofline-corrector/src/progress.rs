//! Progress events and their fan-out to subscribers
//!
//! Events go out on a `tokio::sync::broadcast` channel. Publishing never
//! waits for subscribers; one that falls behind loses its oldest events.

use proofline_domain::{ProgressSnapshot, Task, TaskId, TaskStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{trace, warn};

/// A change in the state of one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The document was split into units and dispatch began
    Started {
        /// Task the event belongs to
        #[serde(with = "task_id_format")]
        task_id: TaskId,
        /// Units in the task
        total_units: u32,
    },

    /// One more unit resolved
    Progress {
        /// Task the event belongs to
        #[serde(with = "task_id_format")]
        task_id: TaskId,
        /// Units resolved so far
        processed_units: u32,
        /// Units in the task
        total_units: u32,
        /// Seconds since dispatch began
        elapsed_seconds: f64,
        /// Estimated seconds left
        estimated_remaining_seconds: f64,
        /// Completion percentage, two decimals
        percent: f64,
    },

    /// Every unit resolved; the result is final
    Completed {
        /// Task the event belongs to
        #[serde(with = "task_id_format")]
        task_id: TaskId,
        /// Corrections in the result
        correction_count: usize,
        /// Units that left a gap
        failed_units: u32,
        /// Seconds spent on units
        elapsed_seconds: f64,
    },

    /// The task ended without a result
    Failed {
        /// Task the event belongs to
        #[serde(with = "task_id_format")]
        task_id: TaskId,
        /// Short human-readable cause
        cause: String,
    },
}

impl ProgressEvent {
    /// Progress event for a snapshot
    pub fn progress(task_id: TaskId, snapshot: &ProgressSnapshot) -> Self {
        ProgressEvent::Progress {
            task_id,
            processed_units: snapshot.processed_units,
            total_units: snapshot.total_units,
            elapsed_seconds: snapshot.elapsed_secs,
            estimated_remaining_seconds: snapshot.estimated_remaining_secs,
            percent: snapshot.percent(),
        }
    }

    /// The terminal event matching a finished task, if it is finished
    pub fn terminal_for(task: &Task) -> Option<Self> {
        match task.status {
            TaskStatus::Completed => Some(ProgressEvent::Completed {
                task_id: task.id,
                correction_count: task.result.len(),
                failed_units: task.failed_units,
                elapsed_seconds: task.elapsed_secs,
            }),
            TaskStatus::Failed => Some(ProgressEvent::Failed {
                task_id: task.id,
                cause: task.error.clone().unwrap_or_default(),
            }),
            TaskStatus::Pending | TaskStatus::Running => None,
        }
    }

    /// Task the event belongs to
    pub fn task_id(&self) -> TaskId {
        match self {
            ProgressEvent::Started { task_id, .. }
            | ProgressEvent::Progress { task_id, .. }
            | ProgressEvent::Completed { task_id, .. }
            | ProgressEvent::Failed { task_id, .. } => *task_id,
        }
    }

    /// Whether this is the last event of its task
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Completed { .. } | ProgressEvent::Failed { .. })
    }

    /// Serialize to a JSON object string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Task ids travel as their hyphenated string form
mod task_id_format {
    use proofline_domain::TaskId;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &TaskId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TaskId, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Broadcast hub shared by every orchestrator of a service
#[derive(Debug, Clone)]
pub struct ProgressHub {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressHub {
    /// Create a hub buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event; never blocks
    pub fn publish(&self, event: ProgressEvent) {
        trace!("Publishing {:?}", event);
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    /// Events of every task
    pub fn subscribe(&self) -> ProgressStream {
        ProgressStream::new(self.sender.subscribe(), None)
    }

    /// Events of one task, ending after its terminal event
    pub fn subscribe_task(&self, task_id: TaskId) -> ProgressStream {
        ProgressStream::new(self.sender.subscribe(), Some(task_id))
    }
}

/// Reads the persisted state of the task a stream follows
pub(crate) type TaskLookup = Box<dyn Fn() -> Option<Task> + Send + Sync>;

/// A subscription to progress events
pub struct ProgressStream {
    receiver: broadcast::Receiver<ProgressEvent>,
    task_id: Option<TaskId>,
    lookup: Option<TaskLookup>,
    pending: Option<ProgressEvent>,
    started: bool,
    processed_units: u32,
    finished: bool,
}

impl ProgressStream {
    fn new(receiver: broadcast::Receiver<ProgressEvent>, task_id: Option<TaskId>) -> Self {
        Self {
            receiver,
            task_id,
            lookup: None,
            pending: None,
            started: false,
            processed_units: 0,
            finished: false,
        }
    }

    /// Resume from the stored state of the followed task
    ///
    /// A finished task yields its terminal event and ends. A running task
    /// first yields its last persisted progress; live events it already
    /// covers are skipped. `lookup` is consulted again whenever the stream
    /// falls behind, so a terminal event lost to lag is still delivered.
    pub(crate) fn resume(mut self, task: &Task, lookup: TaskLookup) -> Self {
        self.lookup = Some(lookup);
        self.pending = match task.status {
            TaskStatus::Completed | TaskStatus::Failed => ProgressEvent::terminal_for(task),
            TaskStatus::Running if task.processed_units > 0 => Some(ProgressEvent::progress(task.id, &task.progress())),
            TaskStatus::Running => Some(ProgressEvent::Started {
                task_id: task.id,
                total_units: task.total_units,
            }),
            TaskStatus::Pending => None,
        };
        self
    }

    /// Next event, or `None` once the stream has ended
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        if self.finished {
            return None;
        }
        if let Some(event) = self.pending.take() {
            return Some(self.observe(event));
        }

        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.task_id.is_some_and(|id| id != event.task_id()) || self.already_seen(&event) {
                        continue;
                    }
                    return Some(self.observe(event));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Progress subscriber fell behind, {} events dropped", skipped);
                    if let Some(event) = self.stored_terminal() {
                        return Some(self.observe(event));
                    }
                }
                Err(RecvError::Closed) => {
                    self.finished = true;
                    return None;
                }
            }
        }
    }

    fn already_seen(&self, event: &ProgressEvent) -> bool {
        if self.task_id.is_none() {
            return false;
        }
        match event {
            ProgressEvent::Started { .. } => self.started,
            ProgressEvent::Progress { processed_units, .. } => *processed_units <= self.processed_units,
            ProgressEvent::Completed { .. } | ProgressEvent::Failed { .. } => false,
        }
    }

    fn stored_terminal(&self) -> Option<ProgressEvent> {
        self.task_id?;
        let task = (self.lookup.as_ref()?)()?;
        ProgressEvent::terminal_for(&task)
    }

    fn observe(&mut self, event: ProgressEvent) -> ProgressEvent {
        match &event {
            ProgressEvent::Started { .. } => self.started = true,
            ProgressEvent::Progress { processed_units, .. } => {
                self.started = true;
                self.processed_units = *processed_units;
            }
            ProgressEvent::Completed { .. } | ProgressEvent::Failed { .. } => {
                if self.task_id.is_some() {
                    self.finished = true;
                }
            }
        }
        event
    }
}

impl fmt::Debug for ProgressStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStream")
            .field("task_id", &self.task_id)
            .field("processed_units", &self.processed_units)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
