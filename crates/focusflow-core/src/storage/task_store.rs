//! Per-user task collections backed by SQLite.
//!
//! Each [`TaskSet`] maps to its own table so that moving a task between
//! sets is a delete + insert inside one transaction.

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;

use super::database_path;
use crate::error::{CoreError, DatabaseError, Result};
use crate::task::{Task, TaskSet};

/// Outcome of recording one session against a task.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressOutcome {
    /// Task stays active with one more session done.
    Progressed(Task),
    /// The last session was recorded; the task moved to the completed set.
    Completed(Task),
}

impl ProgressOutcome {
    pub fn task(&self) -> &Task {
        match self {
            ProgressOutcome::Progressed(t) | ProgressOutcome::Completed(t) => t,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ProgressOutcome::Completed(_))
    }
}

/// Create/read/update/delete access to a user's task collections.
///
/// Every call is scoped by user id.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> Result<()>;

    fn get_task(&self, user_id: &str, set: TaskSet, id: &str) -> Result<Option<Task>>;

    /// Newest first.
    fn list_tasks(&self, user_id: &str, set: TaskSet) -> Result<Vec<Task>>;

    fn update_task(&self, task: &Task) -> Result<()>;

    fn record_progress(&self, user_id: &str, id: &str) -> Result<ProgressOutcome>;

    fn delete_task(&self, user_id: &str, id: &str, now: DateTime<Utc>) -> Result<Task>;

    fn restore_task(&self, user_id: &str, id: &str) -> Result<Task>;

    /// Remove deleted tasks whose retention window has elapsed.
    fn purge_deleted(&self, user_id: &str, now: DateTime<Utc>, retention: Duration)
        -> Result<usize>;
}

/// SQLite implementation of [`TaskRepository`].
pub struct SqliteTaskStore {
    conn: Connection,
}

const TASK_COLUMNS: &str = "id, name, duration_hours, total_sessions, completed_sessions, \
                            due_date, tags, created_at, user_id";

fn table(set: TaskSet) -> &'static str {
    match set {
        TaskSet::Active => "tasks",
        TaskSet::Completed => "completed_tasks",
        TaskSet::Deleted => "deleted_tasks",
    }
}

fn format_due(due: &Option<NaiveDateTime>) -> Option<String> {
    due.map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn row_to_task(row: &Row) -> Result<Task, rusqlite::Error> {
    let due: Option<String> = row.get(5)?;
    let tags_json: String = row.get(6)?;
    let created: String = row.get(7)?;

    let conversion = |idx: usize, e: Box<dyn std::error::Error + Send + Sync>| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e)
    };

    let due_date = due
        .map(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S"))
        .transpose()
        .map_err(|e| conversion(5, Box::new(e)))?;
    let tags: Vec<String> =
        serde_json::from_str(&tags_json).map_err(|e| conversion(6, Box::new(e)))?;
    let created_at = DateTime::parse_from_rfc3339(&created)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion(7, Box::new(e)))?;

    Ok(Task {
        id: row.get(0)?,
        name: row.get(1)?,
        duration_hours: row.get(2)?,
        total_sessions: row.get(3)?,
        completed_sessions: row.get(4)?,
        due_date,
        tags,
        created_at,
        user_id: row.get(8)?,
    })
}

fn timestamp(at: &DateTime<Utc>) -> String {
    // Fixed width so that text ordering matches time ordering.
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn insert_into(conn: &Connection, set: TaskSet, task: &Task) -> Result<()> {
    insert_row(conn, set, task, None)
}

fn insert_row(
    conn: &Connection,
    set: TaskSet,
    task: &Task,
    deleted_at: Option<DateTime<Utc>>,
) -> Result<()> {
    let tags_json = serde_json::to_string(&task.tags)?;
    let (extra_col, extra_val) = match deleted_at {
        Some(_) => (", deleted_at", ", ?10"),
        None => ("", ""),
    };
    let sql = format!(
        "INSERT INTO {} ({TASK_COLUMNS}{extra_col}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9{extra_val})",
        table(set)
    );
    let due = format_due(&task.due_date);
    let created = timestamp(&task.created_at);
    match deleted_at {
        Some(at) => conn.execute(
            &sql,
            params![
                task.id,
                task.name,
                task.duration_hours,
                task.total_sessions,
                task.completed_sessions,
                due,
                tags_json,
                created,
                task.user_id,
                timestamp(&at),
            ],
        )?,
        None => conn.execute(
            &sql,
            params![
                task.id,
                task.name,
                task.duration_hours,
                task.total_sessions,
                task.completed_sessions,
                due,
                tags_json,
                created,
                task.user_id,
            ],
        )?,
    };
    Ok(())
}

fn select_one(conn: &Connection, set: TaskSet, user_id: &str, id: &str) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            &format!(
                "SELECT {TASK_COLUMNS} FROM {} WHERE user_id = ?1 AND id = ?2",
                table(set)
            ),
            params![user_id, id],
            row_to_task,
        )
        .optional()?;
    Ok(task)
}

fn remove_from(tx: &Transaction, set: TaskSet, user_id: &str, id: &str) -> Result<()> {
    tx.execute(
        &format!("DELETE FROM {} WHERE user_id = ?1 AND id = ?2", table(set)),
        params![user_id, id],
    )?;
    Ok(())
}

impl SqliteTaskStore {
    /// Open the task store in the application database file.
    pub fn open() -> Result<Self> {
        Self::open_at(&database_path()?)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let mut ddl = String::new();
        for set in [TaskSet::Active, TaskSet::Completed, TaskSet::Deleted] {
            let extra = if set == TaskSet::Deleted {
                ",\n    deleted_at TEXT NOT NULL"
            } else {
                ""
            };
            ddl.push_str(&format!(
                "CREATE TABLE IF NOT EXISTS {t} (
                    id                 TEXT NOT NULL,
                    name               TEXT NOT NULL,
                    duration_hours     REAL NOT NULL,
                    total_sessions     INTEGER NOT NULL,
                    completed_sessions INTEGER NOT NULL DEFAULT 0,
                    due_date           TEXT,
                    tags               TEXT NOT NULL DEFAULT '[]',
                    created_at         TEXT NOT NULL,
                    user_id            TEXT NOT NULL{extra},
                    PRIMARY KEY (user_id, id)
                );
                CREATE INDEX IF NOT EXISTS idx_{t}_user_created ON {t}(user_id, created_at);\n",
                t = table(set),
            ));
        }
        self.conn
            .execute_batch(&ddl)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    fn not_found(set: TaskSet, id: &str) -> CoreError {
        CoreError::NotFound {
            set,
            id: id.to_string(),
        }
    }
}

impl TaskRepository for SqliteTaskStore {
    fn create_task(&self, task: &Task) -> Result<()> {
        insert_into(&self.conn, TaskSet::Active, task)?;
        tracing::debug!(task_id = %task.id, user_id = %task.user_id, "task created");
        Ok(())
    }

    fn get_task(&self, user_id: &str, set: TaskSet, id: &str) -> Result<Option<Task>> {
        select_one(&self.conn, set, user_id, id)
    }

    fn list_tasks(&self, user_id: &str, set: TaskSet) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM {} WHERE user_id = ?1 ORDER BY created_at DESC, id ASC",
            table(set)
        ))?;
        let rows = stmt.query_map(params![user_id], row_to_task)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    fn update_task(&self, task: &Task) -> Result<()> {
        let tags_json = serde_json::to_string(&task.tags)?;
        let changed = self.conn.execute(
            "UPDATE tasks
             SET name = ?3, duration_hours = ?4, total_sessions = ?5,
                 completed_sessions = ?6, due_date = ?7, tags = ?8
             WHERE user_id = ?1 AND id = ?2",
            params![
                task.user_id,
                task.id,
                task.name,
                task.duration_hours,
                task.total_sessions,
                task.completed_sessions,
                format_due(&task.due_date),
                tags_json,
            ],
        )?;
        if changed == 0 {
            return Err(Self::not_found(TaskSet::Active, &task.id));
        }
        Ok(())
    }

    fn record_progress(&self, user_id: &str, id: &str) -> Result<ProgressOutcome> {
        let tx = self.conn.unchecked_transaction()?;
        let mut task =
            select_one(&tx, TaskSet::Active, user_id, id)?.ok_or_else(|| Self::not_found(TaskSet::Active, id))?;
        task.record_session()?;

        let outcome = if task.is_complete() {
            remove_from(&tx, TaskSet::Active, user_id, id)?;
            insert_into(&tx, TaskSet::Completed, &task)?;
            tracing::info!(task_id = %id, user_id, "task completed");
            ProgressOutcome::Completed(task)
        } else {
            tx.execute(
                "UPDATE tasks SET completed_sessions = ?3 WHERE user_id = ?1 AND id = ?2",
                params![user_id, id, task.completed_sessions],
            )?;
            tracing::debug!(
                task_id = %id,
                completed = task.completed_sessions,
                total = task.total_sessions,
                "task progressed"
            );
            ProgressOutcome::Progressed(task)
        };
        tx.commit()?;
        Ok(outcome)
    }

    fn delete_task(&self, user_id: &str, id: &str, now: DateTime<Utc>) -> Result<Task> {
        let tx = self.conn.unchecked_transaction()?;
        let task =
            select_one(&tx, TaskSet::Active, user_id, id)?.ok_or_else(|| Self::not_found(TaskSet::Active, id))?;
        remove_from(&tx, TaskSet::Active, user_id, id)?;
        insert_row(&tx, TaskSet::Deleted, &task, Some(now))?;
        tx.commit()?;
        tracing::info!(task_id = %id, user_id, "task moved to deleted set");
        Ok(task)
    }

    fn restore_task(&self, user_id: &str, id: &str) -> Result<Task> {
        let tx = self.conn.unchecked_transaction()?;
        let task = select_one(&tx, TaskSet::Deleted, user_id, id)?
            .ok_or_else(|| Self::not_found(TaskSet::Deleted, id))?;
        remove_from(&tx, TaskSet::Deleted, user_id, id)?;
        insert_into(&tx, TaskSet::Active, &task)?;
        tx.commit()?;
        tracing::info!(task_id = %id, user_id, "task restored");
        Ok(task)
    }

    fn purge_deleted(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        retention: Duration,
    ) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, deleted_at FROM deleted_tasks WHERE user_id = ?1")?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut expired = Vec::new();
        for row in rows {
            let (id, deleted_at) = row?;
            match DateTime::parse_from_rfc3339(&deleted_at) {
                Ok(at) if at.with_timezone(&Utc) + retention <= now => expired.push(id),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(task_id = %id, error = %e, "unreadable deleted_at, keeping");
                }
            }
        }
        drop(stmt);

        let tx = self.conn.unchecked_transaction()?;
        for id in &expired {
            remove_from(&tx, TaskSet::Deleted, user_id, id)?;
        }
        tx.commit()?;

        if !expired.is_empty() {
            tracing::info!(user_id, purged = expired.len(), "purged deleted tasks");
        }
        Ok(expired.len())
    }
}
