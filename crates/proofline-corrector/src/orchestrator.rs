//! Runs one task from document bytes to a final result
//!
//! ```text
//! extract → merge → mark_running → workers ⇉ coordinator → mark_completed
//! ```
//!
//! Workers pull unit indices from a shared cursor, so every unit is dispatched
//! exactly once, and send each outcome over a channel. A single coordinator
//! owns the counters, persists every outcome and publishes progress.

use crate::client::CorrectionClient;
use crate::config::CorrectorConfig;
use crate::error::{CorrectorError, UnitFailure};
use crate::merger::ParagraphMerger;
use crate::progress::{ProgressEvent, ProgressHub};
use crate::rules::RuleSet;
use crate::unix_now;
use proofline_documents::{extract, DocumentFormat};
use proofline_domain::traits::{LlmProvider, TaskStore, UnitOutcome, UnitRecord};
use proofline_domain::{Correction, CorrectionUnit, ProgressSnapshot, TaskId, TaskStatus};
use std::fmt::Display;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Document bytes together with their resolved format
#[derive(Debug, Clone)]
pub struct Document {
    /// How to read the bytes
    pub format: DocumentFormat,

    /// Raw file content
    pub bytes: Vec<u8>,
}

/// Outcome of one unit, as sent from a worker to the coordinator
struct UnitResult {
    index: usize,
    result: Result<Vec<Correction>, UnitFailure>,
}

/// Counters owned by the coordinator
#[derive(Default)]
struct Tally {
    processed: u32,
    failed: u32,
    corrections: usize,
}

/// Drives a single task through its lifecycle
pub struct CorrectionOrchestrator<L, S>
where
    L: LlmProvider,
    S: TaskStore,
{
    client: CorrectionClient<L>,
    store: Arc<Mutex<S>>,
    hub: ProgressHub,
    config: CorrectorConfig,
}

impl<L, S> CorrectionOrchestrator<L, S>
where
    L: LlmProvider + 'static,
    S: TaskStore,
    S::Error: Display,
{
    /// Create a new orchestrator
    pub fn new(llm_provider: Arc<L>, store: Arc<Mutex<S>>, hub: ProgressHub, config: CorrectorConfig) -> Self {
        Self {
            client: CorrectionClient::new(llm_provider, config.clone()),
            store,
            hub,
            config,
        }
    }

    /// Run a pending task to a terminal state
    ///
    /// Unit failures leave gaps but never fail the task. Returns the status
    /// that was persisted.
    ///
    /// # Errors
    ///
    /// Returns `Storage` when the final state could not be persisted. A
    /// `Failed` event is published even then.
    pub async fn run(
        &self,
        task_id: TaskId,
        document: Document,
        rule_set: Arc<RuleSet>,
        cancel: CancellationToken,
    ) -> Result<TaskStatus, CorrectorError> {
        info!("Starting task {} ({}, {} bytes)", task_id, document.format, document.bytes.len());

        let paragraphs = match Self::extract_paragraphs(document).await {
            Ok(paragraphs) if paragraphs.is_empty() => {
                return self.fail(task_id, &CorrectorError::EmptyDocument.to_string());
            }
            Ok(paragraphs) => paragraphs,
            Err(e) => return self.fail(task_id, &e.to_string()),
        };

        let units = ParagraphMerger::new(self.config.max_chars_per_unit).merge(&paragraphs);
        let total_units = match u32::try_from(units.len()) {
            Ok(total) => total,
            Err(_) => return self.fail(task_id, "document has too many units"),
        };

        if let Err(e) = self.with_store(|store| store.mark_running(task_id, total_units, unix_now())) {
            return self.fail(task_id, &e.to_string());
        }
        info!(
            "Task {}: {} paragraphs merged into {} units",
            task_id,
            paragraphs.len(),
            total_units
        );
        self.hub.publish(ProgressEvent::Started { task_id, total_units });

        let started = Instant::now();
        let stop = cancel.child_token();
        let (workers, mut results) = self.spawn_workers(units, rule_set, stop.clone());

        let mut tally = Tally::default();
        let mut storage_error = None;
        while let Some(UnitResult { index, result }) = results.recv().await {
            tally.processed += 1;
            let outcome = match result {
                Ok(corrections) => {
                    debug!("Unit {} of task {}: {} corrections", index + 1, task_id, corrections.len());
                    tally.corrections += corrections.len();
                    UnitOutcome::Corrected(corrections)
                }
                Err(failure) => {
                    warn!("Unit {} of task {} failed: {}", index + 1, task_id, failure);
                    tally.failed += 1;
                    UnitOutcome::Failed(failure.to_string())
                }
            };

            let progress = ProgressSnapshot::measure(tally.processed, total_units, started.elapsed().as_secs_f64());
            let record = UnitRecord {
                unit_index: index,
                outcome,
                progress,
                recorded_at: unix_now(),
            };
            if let Err(e) = self.with_store(|store| store.record_unit(task_id, &record)) {
                error!("Task {}: could not record unit {}: {}", task_id, index + 1, e);
                stop.cancel();
                storage_error = Some(e);
                break;
            }
            self.hub.publish(ProgressEvent::progress(task_id, &progress));
        }

        drop(results);
        Self::join_workers(workers, storage_error.is_some()).await;

        if let Some(e) = storage_error {
            return self.fail(task_id, &e.to_string());
        }

        if tally.processed < total_units {
            let cause = if cancel.is_cancelled() {
                "cancelled".to_string()
            } else {
                format!("workers stopped after {} of {} units", tally.processed, total_units)
            };
            return self.fail(task_id, &cause);
        }

        if let Err(e) = self.with_store(|store| store.mark_completed(task_id, unix_now())) {
            return self.fail(task_id, &e.to_string());
        }

        let elapsed_seconds = started.elapsed().as_secs_f64();
        info!(
            "Task {} completed: {} corrections, {} of {} units failed, {:.1}s",
            task_id, tally.corrections, tally.failed, total_units, elapsed_seconds
        );
        self.hub.publish(ProgressEvent::Completed {
            task_id,
            correction_count: tally.corrections,
            failed_units: tally.failed,
            elapsed_seconds,
        });

        Ok(TaskStatus::Completed)
    }

    /// Extraction is CPU-bound, so it runs off the async workers
    async fn extract_paragraphs(document: Document) -> Result<Vec<String>, CorrectorError> {
        let Document { format, bytes } = document;
        tokio::task::spawn_blocking(move || extract(&bytes, format))
            .await
            .map_err(|e| CorrectorError::Extraction(format!("extractor stopped: {}", e)))?
            .map_err(CorrectorError::from)
    }

    /// Start `min(max_concurrency, units)` workers sharing one cursor
    fn spawn_workers(
        &self,
        units: Vec<CorrectionUnit>,
        rule_set: Arc<RuleSet>,
        stop: CancellationToken,
    ) -> (JoinSet<()>, mpsc::Receiver<UnitResult>) {
        let worker_count = self.config.max_concurrency.min(units.len()).max(1);
        let (sender, receiver) = mpsc::channel(worker_count);
        let units = Arc::new(units);
        let cursor = Arc::new(AtomicUsize::new(0));
        let mut workers = JoinSet::new();

        for _ in 0..worker_count {
            let client = self.client.clone();
            let units = Arc::clone(&units);
            let cursor = Arc::clone(&cursor);
            let rule_set = Arc::clone(&rule_set);
            let sender = sender.clone();
            let stop = stop.clone();

            workers.spawn(async move {
                while !stop.is_cancelled() {
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(unit) = units.get(index) else {
                        break;
                    };
                    let result = client.submit(unit, &rule_set).await;
                    if sender.send(UnitResult { index, result }).await.is_err() {
                        break;
                    }
                }
            });
        }

        (workers, receiver)
    }

    /// Wait for every worker; after a storage failure nothing in flight is kept
    async fn join_workers(mut workers: JoinSet<()>, abort: bool) {
        if abort {
            workers.abort_all();
        }
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    error!("Unit worker panicked: {}", e);
                }
            }
        }
    }

    /// Persist a failure and publish the terminal event
    fn fail(&self, task_id: TaskId, cause: &str) -> Result<TaskStatus, CorrectorError> {
        warn!("Task {} failed: {}", task_id, cause);
        let persisted = self.with_store(|store| store.mark_failed(task_id, cause, unix_now()));

        self.hub.publish(ProgressEvent::Failed {
            task_id,
            cause: cause.to_string(),
        });

        match persisted {
            Ok(()) => Ok(TaskStatus::Failed),
            Err(e) => {
                error!("Task {}: could not record failure '{}': {}", task_id, cause, e);
                Err(e)
            }
        }
    }

    fn with_store<T>(&self, op: impl FnOnce(&mut S) -> Result<T, S::Error>) -> Result<T, CorrectorError> {
        let mut store = self
            .store
            .lock()
            .map_err(|e| CorrectorError::Storage(format!("store lock poisoned: {}", e)))?;
        op(&mut store).map_err(|e| CorrectorError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofline_domain::Task;
    use proofline_llm::MockProvider;
    use proofline_store::SqliteStore;

    fn setup(provider: MockProvider) -> (CorrectionOrchestrator<MockProvider, SqliteStore>, Arc<Mutex<SqliteStore>>, TaskId) {
        let store = Arc::new(Mutex::new(SqliteStore::new(":memory:").unwrap()));
        let task = Task::new("doc.txt", unix_now());
        store.lock().unwrap().create_task(&task).unwrap();

        let orchestrator = CorrectionOrchestrator::new(
            Arc::new(provider),
            Arc::clone(&store),
            ProgressHub::new(64),
            CorrectorConfig::default(),
        );
        (orchestrator, store, task.id)
    }

    fn text(bytes: &[u8]) -> Document {
        Document {
            format: DocumentFormat::PlainText,
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_run_completes() {
        let provider = MockProvider::default();
        provider.add_response("Its fine.", r#"[{"original": "Its", "corrected": "It's"}]"#);
        let (orchestrator, store, id) = setup(provider);

        let status = orchestrator
            .run(id, text(b"Its fine."), Arc::new(RuleSet::default()), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(status, TaskStatus::Completed);

        let task = store.lock().unwrap().get_task(id).unwrap().unwrap();
        assert_eq!(task.total_units, 1);
        assert_eq!(task.processed_units, 1);
        assert_eq!(task.result, vec![Correction::new(0, "Its", "It's")]);
    }

    #[tokio::test]
    async fn test_corrupt_document_fails_task() {
        let (orchestrator, store, id) = setup(MockProvider::default());
        let document = Document {
            format: DocumentFormat::WordProcessing,
            bytes: b"not a zip".to_vec(),
        };

        let status = orchestrator
            .run(id, document, Arc::new(RuleSet::default()), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(status, TaskStatus::Failed);

        let task = store.lock().unwrap().get_task(id).unwrap().unwrap();
        assert!(task.error.unwrap().starts_with("extraction failed"));
        assert_eq!(task.total_units, 0);
    }

    #[tokio::test]
    async fn test_already_cancelled_dispatches_nothing() {
        let provider = MockProvider::default();
        let (orchestrator, store, id) = setup(provider.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let status = orchestrator
            .run(id, text(b"One.\n\nTwo."), Arc::new(RuleSet::default()), cancel)
            .await
            .unwrap();
        assert_eq!(status, TaskStatus::Failed);
        assert_eq!(provider.call_count(), 0);

        let task = store.lock().unwrap().get_task(id).unwrap().unwrap();
        assert_eq!(task.error.as_deref(), Some("cancelled"));
    }

    #[tokio::test]
    async fn test_unknown_task_is_a_storage_error() {
        let (orchestrator, _store, _id) = setup(MockProvider::default());

        let result = orchestrator
            .run(TaskId::new(), text(b"Text."), Arc::new(RuleSet::default()), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(CorrectorError::Storage(_))));
    }
}
