//! Proofline Storage Layer
//!
//! Implements the `TaskStore` trait on SQLite.
//!
//! # Architecture
//!
//! - `tasks` holds identity, status, timestamps and progress counters
//! - `unit_outcomes` holds one row per resolved unit (success or gap)
//! - `corrections` holds the suggested replacements, keyed by unit and position
//!
//! Each lifecycle transition runs in a single transaction, so readers only
//! ever see fully committed snapshots.
//!
//! # Examples
//!
//! ```no_run
//! use proofline_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for task operations
//! ```

#![warn(missing_docs)]

use proofline_domain::traits::{TaskQuery, TaskStore, UnitOutcome, UnitRecord};
use proofline_domain::{Correction, Task, TaskId, TaskStatus};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Task not found
    #[error("Task not found: {0}")]
    NotFound(String),

    /// The requested lifecycle transition is not allowed
    #[error("Invalid transition for task {id}: {reason}")]
    InvalidTransition {
        /// Task the transition was attempted on
        id: String,
        /// Why it was refused
        reason: String,
    },

    /// The unit was already recorded for this run
    #[error("Unit {1} already recorded for task {0}")]
    DuplicateUnit(String, usize),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of TaskStore
///
/// # Thread Safety
///
/// SQLite connections are not `Sync`. Share a store between tasks behind a
/// `Mutex`, or open one store per thread on the same file.
pub struct SqliteStore {
    conn: Connection,
}

const TASK_COLUMNS: &str = "id, filename, status, created_at, started_at, completed_at, updated_at,
     total_units, processed_units, failed_units, elapsed_secs, estimated_remaining_secs, error";

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use proofline_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("proofline.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let mode: String = self
            .conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("SQLite journal mode: {}", mode);

        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;

        Ok(())
    }

    /// Convert TaskId to bytes for storage
    fn task_id_to_bytes(id: TaskId) -> Vec<u8> {
        id.value().to_be_bytes().to_vec()
    }

    /// Convert bytes to TaskId
    fn bytes_to_task_id(bytes: &[u8]) -> Result<TaskId, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for TaskId, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(TaskId::from_value(u128::from_be_bytes(arr)))
    }

    /// Map a `tasks` row (selected with `TASK_COLUMNS`) to a Task without its result
    fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let id = Self::bytes_to_task_id(&id_bytes).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Blob, Box::new(e))
        })?;

        let status_str: String = row.get(2)?;
        let status = status_str.parse::<TaskStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                Box::new(StoreError::InvalidData(e)),
            )
        })?;

        let started_at: Option<i64> = row.get(4)?;
        let completed_at: Option<i64> = row.get(5)?;

        Ok(Task {
            id,
            filename: row.get(1)?,
            status,
            created_at: row.get::<_, i64>(3)? as u64,
            started_at: started_at.map(|t| t as u64),
            completed_at: completed_at.map(|t| t as u64),
            updated_at: row.get::<_, i64>(6)? as u64,
            total_units: row.get::<_, i64>(7)? as u32,
            processed_units: row.get::<_, i64>(8)? as u32,
            failed_units: row.get::<_, i64>(9)? as u32,
            elapsed_secs: row.get(10)?,
            estimated_remaining_secs: row.get(11)?,
            result: Vec::new(),
            error: row.get(12)?,
        })
    }

    /// Load the ordered result of a task
    fn load_corrections(&self, id_bytes: &[u8]) -> Result<Vec<Correction>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT unit_index, original, corrected, reason
             FROM corrections WHERE task_id = ?1
             ORDER BY unit_index, position",
        )?;

        let corrections = stmt
            .query_map(params![id_bytes], |row| {
                Ok(Correction {
                    unit_index: row.get::<_, i64>(0)? as usize,
                    original: row.get(1)?,
                    corrected: row.get(2)?,
                    reason: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(corrections)
    }

    /// Read the status of a task inside a transaction
    fn status_in(tx: &Transaction<'_>, id: TaskId, id_bytes: &[u8]) -> Result<TaskStatus, StoreError> {
        let status: Option<String> = tx
            .query_row(
                "SELECT status FROM tasks WHERE id = ?1",
                params![id_bytes],
                |row| row.get(0),
            )
            .optional()?;

        let status = status.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        status.parse::<TaskStatus>().map_err(StoreError::InvalidData)
    }

    /// Refuse a transition the lifecycle does not allow
    fn check_transition(id: TaskId, from: TaskStatus, to: TaskStatus) -> Result<(), StoreError> {
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(StoreError::InvalidTransition {
                id: id.to_string(),
                reason: format!("{} -> {}", from, to),
            })
        }
    }
}

impl TaskStore for SqliteStore {
    type Error = StoreError;

    fn create_task(&mut self, task: &Task) -> Result<(), Self::Error> {
        if task.status != TaskStatus::Pending {
            return Err(StoreError::InvalidTransition {
                id: task.id.to_string(),
                reason: format!("new tasks must be pending, got {}", task.status),
            });
        }

        self.conn.execute(
            "INSERT INTO tasks (id, filename, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Self::task_id_to_bytes(task.id),
                &task.filename,
                task.status.as_str(),
                task.created_at as i64,
                task.updated_at as i64,
            ],
        )?;

        debug!("Created task {} ({})", task.id, task.filename);
        Ok(())
    }

    fn get_task(&self, id: TaskId) -> Result<Option<Task>, Self::Error> {
        let id_bytes = Self::task_id_to_bytes(id);

        let task = self
            .conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                params![&id_bytes],
                Self::row_to_task,
            )
            .optional()?;

        match task {
            Some(mut task) => {
                task.result = self.load_corrections(&id_bytes)?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, Self::Error> {
        let mut sql = format!("SELECT {} FROM tasks WHERE 1=1", TASK_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.as_str()));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let tasks = stmt
            .query_map(&param_refs[..], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    fn mark_running(&mut self, id: TaskId, total_units: u32, at: u64) -> Result<(), Self::Error> {
        let id_bytes = Self::task_id_to_bytes(id);
        let tx = self.conn.transaction()?;

        let status = Self::status_in(&tx, id, &id_bytes)?;
        Self::check_transition(id, status, TaskStatus::Running)?;

        tx.execute(
            "UPDATE tasks SET status = 'running', total_units = ?2, started_at = ?3, updated_at = ?3
             WHERE id = ?1",
            params![&id_bytes, total_units as i64, at as i64],
        )?;
        tx.commit()?;

        debug!("Task {} running with {} units", id, total_units);
        Ok(())
    }

    fn record_unit(&mut self, id: TaskId, record: &UnitRecord) -> Result<(), Self::Error> {
        let id_bytes = Self::task_id_to_bytes(id);
        let tx = self.conn.transaction()?;

        let (status, total, processed): (String, i64, i64) = tx
            .query_row(
                "SELECT status, total_units, processed_units FROM tasks WHERE id = ?1",
                params![&id_bytes],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let status = status.parse::<TaskStatus>().map_err(StoreError::InvalidData)?;
        if status != TaskStatus::Running {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                reason: format!("cannot record units while {}", status),
            });
        }
        if record.unit_index as i64 >= total {
            return Err(StoreError::InvalidData(format!(
                "unit index {} out of range for {} units",
                record.unit_index, total
            )));
        }
        if processed >= total {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                reason: "all units already processed".to_string(),
            });
        }

        let already: bool = tx
            .query_row(
                "SELECT 1 FROM unit_outcomes WHERE task_id = ?1 AND unit_index = ?2",
                params![&id_bytes, record.unit_index as i64],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if already {
            return Err(StoreError::DuplicateUnit(id.to_string(), record.unit_index));
        }

        let failure = match &record.outcome {
            UnitOutcome::Corrected(_) => None,
            UnitOutcome::Failed(cause) => Some(cause.as_str()),
        };

        tx.execute(
            "INSERT INTO unit_outcomes (task_id, unit_index, failure, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                &id_bytes,
                record.unit_index as i64,
                failure,
                record.recorded_at as i64
            ],
        )?;

        if let UnitOutcome::Corrected(corrections) = &record.outcome {
            let mut stmt = tx.prepare(
                "INSERT INTO corrections (task_id, unit_index, position, original, corrected, reason)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, correction) in corrections.iter().enumerate() {
                stmt.execute(params![
                    &id_bytes,
                    record.unit_index as i64,
                    position as i64,
                    &correction.original,
                    &correction.corrected,
                    &correction.reason,
                ])?;
            }
        }

        tx.execute(
            "UPDATE tasks SET
                processed_units = processed_units + 1,
                failed_units = failed_units + ?2,
                elapsed_secs = ?3,
                estimated_remaining_secs = ?4,
                updated_at = ?5
             WHERE id = ?1",
            params![
                &id_bytes,
                failure.is_some() as i64,
                record.progress.elapsed_secs,
                record.progress.estimated_remaining_secs,
                record.recorded_at as i64,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn mark_completed(&mut self, id: TaskId, at: u64) -> Result<(), Self::Error> {
        let id_bytes = Self::task_id_to_bytes(id);
        let tx = self.conn.transaction()?;

        let status = Self::status_in(&tx, id, &id_bytes)?;
        Self::check_transition(id, status, TaskStatus::Completed)?;

        let (total, processed): (i64, i64) = tx.query_row(
            "SELECT total_units, processed_units FROM tasks WHERE id = ?1",
            params![&id_bytes],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        if processed != total {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                reason: format!("only {} of {} units processed", processed, total),
            });
        }

        tx.execute(
            "UPDATE tasks SET status = 'completed', completed_at = ?2, updated_at = ?2,
                estimated_remaining_secs = 0
             WHERE id = ?1",
            params![&id_bytes, at as i64],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn mark_failed(&mut self, id: TaskId, cause: &str, at: u64) -> Result<(), Self::Error> {
        let id_bytes = Self::task_id_to_bytes(id);
        let tx = self.conn.transaction()?;

        let status = Self::status_in(&tx, id, &id_bytes)?;
        Self::check_transition(id, status, TaskStatus::Failed)?;

        tx.execute(
            "UPDATE tasks SET status = 'failed', error = ?2, completed_at = ?3, updated_at = ?3
             WHERE id = ?1",
            params![&id_bytes, cause, at as i64],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn interrupted_tasks(&self) -> Result<Vec<TaskId>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM tasks WHERE status IN ('pending', 'running') ORDER BY created_at",
        )?;

        let ids = stmt
            .query_map([], |row| row.get::<_, Vec<u8>>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        ids.iter().map(|bytes| Self::bytes_to_task_id(bytes)).collect()
    }
}
