//! Integration tests for the task lifecycle.
//!
//! Covers creation through completion, soft delete, restore and purge on a
//! file-backed store, plus how the derived schedule follows the task list.

use chrono::{Duration, NaiveDate, Utc};
use focusflow_core::{
    generate_time_blocks, BlockType, CoreError, NewTask, ProgressOutcome, ScheduleConfig,
    SqliteTaskStore, Task, TaskRepository, TaskSet, ValidationError, ViewMode,
};

fn new_task(name: &str, hours: f64) -> NewTask {
    NewTask {
        name: name.into(),
        duration_hours: hours,
        ..Default::default()
    }
}

#[test]
fn test_task_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focusflow.db");

    let id = {
        let store = SqliteTaskStore::open_at(&path).unwrap();
        let task = Task::new(
            NewTask {
                tags: vec!["urgent".into(), " deep work ".into()],
                ..new_task("Thesis chapter", 1.5)
            },
            "alice",
            Utc::now(),
        )
        .unwrap();
        store.create_task(&task).unwrap();
        task.id
    };

    let store = SqliteTaskStore::open_at(&path).unwrap();
    let task = store.get_task("alice", TaskSet::Active, &id).unwrap().unwrap();
    assert_eq!(task.total_sessions, 3);
    assert_eq!(task.tags, vec!["urgent".to_string(), "deep work".to_string()]);
    assert!(store.list_tasks("bob", TaskSet::Active).unwrap().is_empty());
}

#[test]
fn test_full_progress_to_completion() {
    let store = SqliteTaskStore::open_memory().unwrap();
    let task = Task::new(new_task("Lab report", 1.0), "alice", Utc::now()).unwrap();
    store.create_task(&task).unwrap();

    let first = store.record_progress("alice", &task.id).unwrap();
    assert!(matches!(first, ProgressOutcome::Progressed(ref t) if t.completed_sessions == 1));

    let second = store.record_progress("alice", &task.id).unwrap();
    assert!(second.is_completed());
    assert_eq!(second.task().progress_pct(), 100);

    assert!(store.list_tasks("alice", TaskSet::Active).unwrap().is_empty());
    let done = store.list_tasks("alice", TaskSet::Completed).unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].completed_sessions, 2);

    // No longer active, so further progress is a not-found.
    let err = store.record_progress("alice", &task.id).unwrap_err();
    assert!(matches!(err, CoreError::NotFound { set: TaskSet::Active, .. }));
}

#[test]
fn test_delete_restore_purge_workflow() {
    let store = SqliteTaskStore::open_memory().unwrap();
    let now = Utc::now();
    let keep = Task::new(new_task("Keep", 0.5), "alice", now).unwrap();
    let gone = Task::new(new_task("Drop", 0.5), "alice", now).unwrap();
    store.create_task(&keep).unwrap();
    store.create_task(&gone).unwrap();

    store.delete_task("alice", &keep.id, now).unwrap();
    store.delete_task("alice", &gone.id, now).unwrap();
    assert_eq!(store.list_tasks("alice", TaskSet::Deleted).unwrap().len(), 2);

    let restored = store.restore_task("alice", &keep.id).unwrap();
    assert_eq!(restored.name, "Keep");

    let retention = Duration::hours(24);
    assert_eq!(
        store
            .purge_deleted("alice", now + Duration::hours(23), retention)
            .unwrap(),
        0
    );
    assert_eq!(
        store
            .purge_deleted("alice", now + Duration::hours(25), retention)
            .unwrap(),
        1
    );
    assert!(store.list_tasks("alice", TaskSet::Deleted).unwrap().is_empty());
    assert_eq!(store.list_tasks("alice", TaskSet::Active).unwrap().len(), 1);
}

#[test]
fn test_invalid_tasks_never_reach_storage() {
    let err = Task::new(new_task("   ", 1.0), "alice", Utc::now()).unwrap_err();
    assert_eq!(err, ValidationError::EmptyName);
    let err = Task::new(new_task("Zero", 0.0), "alice", Utc::now()).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidDuration(_)));
}

#[test]
fn test_schedule_tracks_progress() {
    let store = SqliteTaskStore::open_memory().unwrap();
    let day = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
    let task = Task::new(
        NewTask {
            due_date: day.and_hms_opt(18, 0, 0),
            ..new_task("Revise", 1.0)
        },
        "alice",
        Utc::now(),
    )
    .unwrap();
    store.create_task(&task).unwrap();

    let config = ScheduleConfig::default();
    let tasks = store.list_tasks("alice", TaskSet::Active).unwrap();
    let blocks = generate_time_blocks(&tasks, day, ViewMode::Daily, &config);
    assert_eq!(
        blocks.iter().filter(|b| b.block_type == BlockType::Focus).count(),
        2
    );

    store.record_progress("alice", &task.id).unwrap();
    let tasks = store.list_tasks("alice", TaskSet::Active).unwrap();
    let blocks = generate_time_blocks(&tasks, day, ViewMode::Daily, &config);
    assert_eq!(blocks.len(), 2);

    store.record_progress("alice", &task.id).unwrap();
    let tasks = store.list_tasks("alice", TaskSet::Active).unwrap();
    assert!(generate_time_blocks(&tasks, day, ViewMode::Daily, &config).is_empty());
}
