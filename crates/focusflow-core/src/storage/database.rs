//! SQLite-based session storage, user profile and statistics.
//!
//! Provides persistent storage for:
//! - Completed timer sessions (focus and breaks)
//! - Per-user profile: time studied and the daily streak
//! - Key-value store for application state (the persisted timer)

use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::database_path;
use crate::error::{DatabaseError, Result};
use crate::timer::{StreakState, TimerMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub user_id: String,
    pub mode: TimerMode,
    pub task_id: Option<String>,
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Stats {
    pub total_sessions: u64,
    pub focus_sessions: u64,
    pub total_focus_min: u64,
    pub total_break_min: u64,
    pub today_sessions: u64,
    pub today_focus_min: u64,
}

/// Per-user document: display name, focus time and streak.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub name: Option<String>,
    pub time_studied_secs: u64,
    pub streak: StreakState,
}

/// SQLite database for sessions and user state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/focusflow/focusflow.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self> {
        Self::open_at(&database_path()?)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id            INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id       TEXT NOT NULL,
                    mode          TEXT NOT NULL,
                    task_id       TEXT,
                    duration_secs INTEGER NOT NULL,
                    started_at    TEXT NOT NULL,
                    completed_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS users (
                    user_id            TEXT PRIMARY KEY,
                    name               TEXT,
                    time_studied_secs  INTEGER NOT NULL DEFAULT 0,
                    streak             INTEGER NOT NULL DEFAULT 0,
                    last_streak_update TEXT
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_user_completed_at
                    ON sessions(user_id, completed_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Record a finished timer session.
    pub fn record_session(
        &self,
        user_id: &str,
        mode: TimerMode,
        task_id: Option<&str>,
        duration_secs: u64,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (user_id, mode, task_id, duration_secs, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                mode.as_str(),
                task_id,
                duration_secs,
                started_at.to_rfc3339(),
                completed_at.to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, user_id, mode = mode.as_str(), duration_secs, "session recorded");
        Ok(id)
    }

    pub fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, mode, task_id, duration_secs, started_at, completed_at
             FROM sessions WHERE user_id = ?1 ORDER BY completed_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, u64>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, user_id, mode, task_id, duration_secs, started, completed) = row?;
            out.push(SessionRecord {
                id,
                user_id,
                mode: mode
                    .parse()
                    .map_err(|e| DatabaseError::QueryFailed(format!("bad session mode '{mode}': {e}")))?,
                task_id,
                duration_secs,
                started_at: parse_rfc3339(&started)?,
                completed_at: parse_rfc3339(&completed)?,
            });
        }
        Ok(out)
    }

    /// Statistics for one user. "Today" is the local calendar day of `now`.
    pub fn stats(&self, user_id: &str, now: DateTime<Utc>) -> Result<Stats> {
        let mut stmt = self.conn.prepare(
            "SELECT mode, completed_at, duration_secs FROM sessions WHERE user_id = ?1",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;

        let today = now.with_timezone(&Local).date_naive();
        let mut stats = Stats::default();
        let mut focus_secs = 0u64;
        let mut break_secs = 0u64;
        let mut today_focus_secs = 0u64;

        for row in rows {
            let (mode, completed_at, secs) = row?;
            stats.total_sessions += 1;
            let is_today = parse_rfc3339(&completed_at)?
                .with_timezone(&Local)
                .date_naive()
                == today;
            match mode.parse::<TimerMode>() {
                Ok(TimerMode::Pomodoro) => {
                    stats.focus_sessions += 1;
                    focus_secs += secs;
                    if is_today {
                        stats.today_sessions += 1;
                        today_focus_secs += secs;
                    }
                }
                Ok(_) => break_secs += secs,
                Err(_) => {}
            }
        }

        stats.total_focus_min = focus_secs / 60;
        stats.total_break_min = break_secs / 60;
        stats.today_focus_min = today_focus_secs / 60;
        Ok(stats)
    }

    /// Fetch the user's profile, creating an empty one on first access.
    pub fn get_or_create_profile(&self, user_id: &str, name: Option<&str>) -> Result<UserProfile> {
        self.conn.execute(
            "INSERT OR IGNORE INTO users (user_id, name) VALUES (?1, ?2)",
            params![user_id, name],
        )?;
        if let Some(name) = name {
            self.conn.execute(
                "UPDATE users SET name = ?2 WHERE user_id = ?1 AND (name IS NULL OR name != ?2)",
                params![user_id, name],
            )?;
        }
        let row = self.conn.query_row(
            "SELECT name, time_studied_secs, streak, last_streak_update
             FROM users WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, u64>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        )?;
        let (name, time_studied_secs, streak, last) = row;
        let last_update = last
            .map(|s| {
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|e| DatabaseError::QueryFailed(format!("bad streak date '{s}': {e}")))
            })
            .transpose()?;

        Ok(UserProfile {
            user_id: user_id.to_string(),
            name,
            time_studied_secs,
            streak: StreakState {
                streak,
                last_update,
            },
        })
    }

    /// Add focused seconds to the user's running total.
    pub fn add_time_studied(&self, user_id: &str, secs: u64) -> Result<u64> {
        self.get_or_create_profile(user_id, None)?;
        self.conn.execute(
            "UPDATE users SET time_studied_secs = time_studied_secs + ?2 WHERE user_id = ?1",
            params![user_id, secs],
        )?;
        let total = self.conn.query_row(
            "SELECT time_studied_secs FROM users WHERE user_id = ?1",
            params![user_id],
            |row| row.get::<_, u64>(0),
        )?;
        Ok(total)
    }

    pub fn save_streak(&self, user_id: &str, streak: &StreakState) -> Result<()> {
        self.get_or_create_profile(user_id, None)?;
        self.conn.execute(
            "UPDATE users SET streak = ?2, last_streak_update = ?3 WHERE user_id = ?1",
            params![
                user_id,
                streak.streak,
                streak.last_update.map(|d| d.format("%Y-%m-%d").to_string()),
            ],
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{s}': {e}")).into())
}
