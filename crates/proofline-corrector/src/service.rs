//! Entry point for submitting documents and following their tasks

use crate::config::CorrectorConfig;
use crate::error::CorrectorError;
use crate::orchestrator::{CorrectionOrchestrator, Document};
use crate::progress::{ProgressEvent, ProgressHub, ProgressStream};
use crate::rules::RuleSet;
use crate::unix_now;
use proofline_documents::DocumentFormat;
use proofline_domain::traits::{LlmProvider, TaskQuery, TaskStore};
use proofline_domain::{Task, TaskId};
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Cause recorded on tasks abandoned by a previous process
pub const INTERRUPTED_CAUSE: &str = "interrupted by restart";

/// An uploaded file
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Name given at upload; its extension selects the extractor
    pub filename: String,

    /// Raw file content
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    /// Create a new upload
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Extension of the filename, without the dot
    pub fn extension(&self) -> &str {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
    }
}

type RunningTasks = Arc<Mutex<HashMap<TaskId, CancellationToken>>>;

/// Accepts documents, runs them in the background and reports on them
///
/// Every submission runs as its own tokio task, so several documents can be
/// corrected at once. Must be used from within a tokio runtime.
pub struct CorrectionService<L, S>
where
    L: LlmProvider,
    S: TaskStore,
{
    llm_provider: Arc<L>,
    store: Arc<Mutex<S>>,
    hub: ProgressHub,
    config: CorrectorConfig,
    rules: RwLock<Arc<RuleSet>>,
    running: RunningTasks,
}

impl<L, S> CorrectionService<L, S>
where
    L: LlmProvider + 'static,
    S: TaskStore + Send + 'static,
    S::Error: Display,
{
    /// Create a new service
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration does not validate.
    pub fn new(llm_provider: L, store: S, config: CorrectorConfig, rules: RuleSet) -> Result<Self, CorrectorError> {
        config.validate().map_err(CorrectorError::Config)?;

        Ok(Self {
            llm_provider: Arc::new(llm_provider),
            store: Arc::new(Mutex::new(store)),
            hub: ProgressHub::new(config.event_buffer),
            config,
            rules: RwLock::new(Arc::new(rules)),
            running: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// The default configuration for submissions
    pub fn config(&self) -> &CorrectorConfig {
        &self.config
    }

    /// Submit a document with the current rules and configuration
    pub fn submit_document(&self, upload: DocumentUpload) -> Result<TaskId, CorrectorError> {
        self.submit_document_with(upload, self.rule_set(), self.config.clone())
    }

    /// Submit a document with explicit rules and configuration
    ///
    /// The task is created as pending and runs in the background; the id is
    /// returned at once.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` when the extension is unknown or not
    /// allowed. No task is created in that case.
    pub fn submit_document_with(
        &self,
        upload: DocumentUpload,
        rule_set: Arc<RuleSet>,
        config: CorrectorConfig,
    ) -> Result<TaskId, CorrectorError> {
        config.validate().map_err(CorrectorError::Config)?;

        let extension = upload.extension().to_ascii_lowercase();
        if !config.allows_extension(&extension) {
            return Err(CorrectorError::UnsupportedFormat(extension));
        }
        let format = DocumentFormat::from_extension(&extension)?;

        let task = Task::new(upload.filename.clone(), unix_now());
        let task_id = task.id;
        self.with_store(|store| store.create_task(&task))?;
        info!(
            "Accepted {} ({} bytes) as task {}",
            upload.filename,
            upload.bytes.len(),
            task_id
        );

        let cancel = CancellationToken::new();
        if let Ok(mut running) = self.running.lock() {
            running.insert(task_id, cancel.clone());
        }

        let orchestrator = CorrectionOrchestrator::new(
            Arc::clone(&self.llm_provider),
            Arc::clone(&self.store),
            self.hub.clone(),
            config,
        );
        let running = Arc::clone(&self.running);
        let document = Document {
            format,
            bytes: upload.bytes,
        };

        tokio::spawn(async move {
            if let Err(e) = orchestrator.run(task_id, document, rule_set, cancel).await {
                error!("Task {} ended without a persisted state: {}", task_id, e);
            }
            if let Ok(mut running) = running.lock() {
                running.remove(&task_id);
            }
        });

        Ok(task_id)
    }

    /// Get a task with its result
    pub fn get_task(&self, task_id: TaskId) -> Result<Task, CorrectorError> {
        self.with_store(|store| store.get_task(task_id))?
            .ok_or(CorrectorError::NotFound(task_id))
    }

    /// List tasks, newest first, without results
    pub fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, CorrectorError> {
        self.with_store(|store| store.list_tasks(query))
    }

    /// Events of every task
    pub fn subscribe(&self) -> ProgressStream {
        self.hub.subscribe()
    }

    /// Events of one task, ending after its terminal event
    ///
    /// A task that already finished yields its terminal event and ends. A
    /// running task starts with its last persisted progress.
    pub fn subscribe_task(&self, task_id: TaskId) -> Result<ProgressStream, CorrectorError> {
        let stream = self.hub.subscribe_task(task_id);
        let task = self.get_task(task_id)?;

        let store = Arc::clone(&self.store);
        let lookup = Box::new(move || {
            let store = store.lock().ok()?;
            store.get_task(task_id).ok().flatten()
        });
        Ok(stream.resume(&task, lookup))
    }

    /// Request cancellation of a running task
    ///
    /// Units already in flight finish and are recorded; then the task fails
    /// with `cancelled`. Returns `false` if the task is not running here.
    pub fn cancel(&self, task_id: TaskId) -> bool {
        let token = self
            .running
            .lock()
            .ok()
            .and_then(|running| running.get(&task_id).cloned());

        match token {
            Some(token) => {
                info!("Cancelling task {}", task_id);
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Wait until a task stops running and return it
    ///
    /// A task that is not running in this service is returned as stored.
    pub async fn wait(&self, task_id: TaskId) -> Result<Task, CorrectorError> {
        let mut stream = self.subscribe_task(task_id)?;
        if self.is_running(task_id) {
            while stream.next().await.is_some() {}
        }
        self.get_task(task_id)
    }

    /// Whether a task is running in this service
    pub fn is_running(&self, task_id: TaskId) -> bool {
        self.running
            .lock()
            .map(|running| running.contains_key(&task_id))
            .unwrap_or(false)
    }

    /// Replace the rules used by later submissions
    pub fn reload_rules(&self, rule_set: RuleSet) {
        let rule_set = Arc::new(rule_set);
        match self.rules.write() {
            Ok(mut rules) => *rules = rule_set,
            Err(poisoned) => *poisoned.into_inner() = rule_set,
        }
        info!("Rules reloaded");
    }

    /// Rules used by new submissions
    pub fn rule_set(&self) -> Arc<RuleSet> {
        match self.rules.read() {
            Ok(rules) => Arc::clone(&rules),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Fail tasks left pending or running by a previous process
    ///
    /// Call once at startup. Returns the ids that were marked.
    pub fn recover_interrupted(&self) -> Result<Vec<TaskId>, CorrectorError> {
        let stale = self.with_store(|store| store.interrupted_tasks())?;

        let mut recovered = Vec::new();
        for task_id in stale {
            if self.is_running(task_id) {
                continue;
            }
            match self.with_store(|store| store.mark_failed(task_id, INTERRUPTED_CAUSE, unix_now())) {
                Ok(()) => {
                    self.hub.publish(ProgressEvent::Failed {
                        task_id,
                        cause: INTERRUPTED_CAUSE.to_string(),
                    });
                    recovered.push(task_id);
                }
                Err(e) => warn!("Could not recover task {}: {}", task_id, e),
            }
        }

        if !recovered.is_empty() {
            info!("Marked {} interrupted tasks as failed", recovered.len());
        }
        Ok(recovered)
    }

    fn with_store<T>(&self, op: impl FnOnce(&mut S) -> Result<T, S::Error>) -> Result<T, CorrectorError> {
        let mut store = self
            .store
            .lock()
            .map_err(|e| CorrectorError::Storage(format!("store lock poisoned: {}", e)))?;
        op(&mut store).map_err(|e| CorrectorError::Storage(e.to_string()))
    }
}
