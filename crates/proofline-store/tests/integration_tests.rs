//! Integration tests for proofline-store
//!
//! These tests walk tasks through their lifecycle and verify the
//! transition guards and result ordering.

use proofline_domain::traits::{TaskQuery, TaskStore, UnitOutcome, UnitRecord};
use proofline_domain::{Correction, ProgressSnapshot, Task, TaskStatus};
use proofline_store::{SqliteStore, StoreError};

fn record(unit_index: usize, processed: u32, total: u32, outcome: UnitOutcome) -> UnitRecord {
    UnitRecord {
        unit_index,
        outcome,
        progress: ProgressSnapshot::measure(processed, total, processed as f64 * 2.0),
        recorded_at: 2000 + processed as u64,
    }
}

fn running_task(store: &mut SqliteStore, total: u32) -> Task {
    let task = Task::new("paper.txt", 1000);
    store.create_task(&task).unwrap();
    store.mark_running(task.id, total, 1001).unwrap();
    task
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_create_and_get_task() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let task = Task::new("thesis.docx", 1000);

    store.create_task(&task).unwrap();

    let loaded = store.get_task(task.id).unwrap().expect("task should exist");
    assert_eq!(loaded, task);
}

#[test]
fn test_get_missing_task() {
    let store = SqliteStore::new(":memory:").unwrap();
    let missing = store.get_task(proofline_domain::TaskId::new()).unwrap();
    assert!(missing.is_none());
}

#[test]
fn test_full_lifecycle_orders_results_by_unit() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let task = running_task(&mut store, 3);

    // Units complete out of order
    store
        .record_unit(
            task.id,
            &record(
                2,
                1,
                3,
                UnitOutcome::Corrected(vec![
                    Correction::new(2, "c1", "C1"),
                    Correction::new(2, "c2", "C2"),
                ]),
            ),
        )
        .unwrap();
    store
        .record_unit(task.id, &record(0, 2, 3, UnitOutcome::Corrected(vec![Correction::new(0, "a", "A")])))
        .unwrap();
    store
        .record_unit(task.id, &record(1, 3, 3, UnitOutcome::Failed("timeout".into())))
        .unwrap();

    store.mark_completed(task.id, 3000).unwrap();

    let done = store.get_task(task.id).unwrap().unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.processed_units, 3);
    assert_eq!(done.failed_units, 1);
    assert_eq!(done.started_at, Some(1001));
    assert_eq!(done.completed_at, Some(3000));
    assert!(done.error.is_none());

    let originals: Vec<&str> = done.result.iter().map(|c| c.original.as_str()).collect();
    assert_eq!(originals, vec!["a", "c1", "c2"]);
    assert!(done.result.windows(2).all(|w| w[0].unit_index <= w[1].unit_index));
}

#[test]
fn test_duplicate_unit_rejected() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let task = running_task(&mut store, 2);

    store
        .record_unit(task.id, &record(0, 1, 2, UnitOutcome::Corrected(vec![])))
        .unwrap();
    let result = store.record_unit(task.id, &record(0, 2, 2, UnitOutcome::Corrected(vec![])));

    assert!(matches!(result, Err(StoreError::DuplicateUnit(_, 0))));
    let loaded = store.get_task(task.id).unwrap().unwrap();
    assert_eq!(loaded.processed_units, 1);
}

#[test]
fn test_record_requires_running() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let task = Task::new("a.txt", 1);
    store.create_task(&task).unwrap();

    let result = store.record_unit(task.id, &record(0, 1, 1, UnitOutcome::Corrected(vec![])));
    assert!(matches!(result, Err(StoreError::InvalidTransition { .. })));
}

#[test]
fn test_record_rejects_out_of_range_unit() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let task = running_task(&mut store, 1);

    let result = store.record_unit(task.id, &record(5, 1, 1, UnitOutcome::Corrected(vec![])));
    assert!(matches!(result, Err(StoreError::InvalidData(_))));
}

#[test]
fn test_complete_requires_all_units() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let task = running_task(&mut store, 2);
    store
        .record_unit(task.id, &record(0, 1, 2, UnitOutcome::Corrected(vec![])))
        .unwrap();

    let result = store.mark_completed(task.id, 5);
    assert!(matches!(result, Err(StoreError::InvalidTransition { .. })));
    assert_eq!(store.get_task(task.id).unwrap().unwrap().status, TaskStatus::Running);
}

#[test]
fn test_terminal_states_are_final() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let task = running_task(&mut store, 1);
    store.mark_failed(task.id, "cancelled", 10).unwrap();

    assert!(store.mark_running(task.id, 1, 11).is_err());
    assert!(store.mark_failed(task.id, "again", 12).is_err());
    assert!(store.mark_completed(task.id, 13).is_err());

    let loaded = store.get_task(task.id).unwrap().unwrap();
    assert_eq!(loaded.status, TaskStatus::Failed);
    assert_eq!(loaded.error.as_deref(), Some("cancelled"));
    assert_eq!(loaded.completed_at, Some(10));
}

#[test]
fn test_pending_task_can_fail() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let task = Task::new("empty.txt", 1);
    store.create_task(&task).unwrap();

    store.mark_failed(task.id, "empty document", 2).unwrap();
    let loaded = store.get_task(task.id).unwrap().unwrap();
    assert_eq!(loaded.status, TaskStatus::Failed);
    assert!(loaded.started_at.is_none());
}

#[test]
fn test_missing_task_transitions() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = proofline_domain::TaskId::new();

    assert!(matches!(store.mark_running(id, 1, 1), Err(StoreError::NotFound(_))));
    assert!(matches!(store.mark_failed(id, "x", 1), Err(StoreError::NotFound(_))));
}

#[test]
fn test_list_tasks_by_status() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let first = Task::new("one.txt", 100);
    let second = Task::new("two.txt", 200);
    let third = Task::new("three.txt", 300);
    for task in [&first, &second, &third] {
        store.create_task(task).unwrap();
    }
    store.mark_running(second.id, 1, 201).unwrap();
    store.mark_failed(third.id, "empty document", 301).unwrap();

    let all = store.list_tasks(&TaskQuery::default()).unwrap();
    let names: Vec<&str> = all.iter().map(|t| t.filename.as_str()).collect();
    assert_eq!(names, vec!["three.txt", "two.txt", "one.txt"]);

    let failed = store
        .list_tasks(&TaskQuery {
            status: Some(TaskStatus::Failed),
            limit: None,
        })
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].id, third.id);

    let limited = store
        .list_tasks(&TaskQuery {
            status: None,
            limit: Some(1),
        })
        .unwrap();
    assert_eq!(limited.len(), 1);

    let interrupted = store.interrupted_tasks().unwrap();
    assert_eq!(interrupted, vec![first.id, second.id]);
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");

    let task_id = {
        let mut store = SqliteStore::new(&path).unwrap();
        let task = running_task(&mut store, 2);
        store
            .record_unit(
                task.id,
                &record(0, 1, 2, UnitOutcome::Corrected(vec![Correction::new(0, "teh", "the")])),
            )
            .unwrap();
        task.id
    };

    let store = SqliteStore::new(&path).unwrap();
    let task = store.get_task(task_id).unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Running);
    assert_eq!(task.processed_units, 1);
    assert_eq!(task.result.len(), 1);
    assert_eq!(task.elapsed_secs, 2.0);
    assert_eq!(task.estimated_remaining_secs, 2.0);
    assert_eq!(store.interrupted_tasks().unwrap(), vec![task_id]);
}
