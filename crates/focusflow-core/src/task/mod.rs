//! Task model and lifecycle.
//!
//! A task is a unit of work that needs a target number of Pomodoro
//! sessions. Tasks live in one of three collections:
//!
//! ```text
//!   create ──> Active ──(last session recorded)──> Completed
//!                │  ^
//!         delete │  │ restore
//!                v  │
//!              Deleted ──(retention elapsed)──> purged
//! ```

mod tags;

pub use tags::TagKind;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

/// Two 25-minute sessions fit in an hour of planned work.
pub const DEFAULT_SESSIONS_PER_HOUR: u32 = 2;

/// Which per-user collection a task record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskSet {
    Active,
    Completed,
    Deleted,
}

impl TaskSet {
    /// Collection name as the document store knows it.
    pub fn collection(&self) -> &'static str {
        match self {
            TaskSet::Active => "tasks",
            TaskSet::Completed => "completedTasks",
            TaskSet::Deleted => "deletedTasks",
        }
    }
}

impl fmt::Display for TaskSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

impl FromStr for TaskSet {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" | "tasks" => Ok(TaskSet::Active),
            "completed" | "completedtasks" => Ok(TaskSet::Completed),
            "deleted" | "deletedtasks" => Ok(TaskSet::Deleted),
            other => Err(ValidationError::InvalidValue {
                field: "set".into(),
                message: format!("unknown task set '{other}'"),
            }),
        }
    }
}

/// User input for a new task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub name: String,
    pub duration_hours: f64,
    pub due_date: Option<NaiveDateTime>,
    pub tags: Vec<String>,
}

/// A user-defined unit of work.
///
/// Invariant: `completed_sessions <= total_sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub duration_hours: f64,
    pub total_sessions: u32,
    pub completed_sessions: u32,
    /// Local wall-clock deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

impl Task {
    /// Create a task with the default two sessions per hour.
    pub fn new(
        input: NewTask,
        user_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Self::with_sessions_per_hour(input, user_id, DEFAULT_SESSIONS_PER_HOUR, now)
    }

    /// Create a task, deriving `total_sessions` as
    /// `ceil(duration_hours * sessions_per_hour)`.
    pub fn with_sessions_per_hour(
        input: NewTask,
        user_id: impl Into<String>,
        sessions_per_hour: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let total = session_count(input.duration_hours, sessions_per_hour)?;

        let tags = input
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            duration_hours: input.duration_hours,
            total_sessions: total,
            completed_sessions: 0,
            due_date: input.due_date,
            tags,
            created_at: now,
            user_id: user_id.into(),
        })
    }

    /// Replace the effort estimate and recompute `total_sessions`.
    ///
    /// At least one session must remain afterwards; finishing a task only
    /// happens through [`Task::record_session`].
    pub fn re_estimate(
        &mut self,
        duration_hours: f64,
        sessions_per_hour: u32,
    ) -> Result<(), ValidationError> {
        let total = session_count(duration_hours, sessions_per_hour)?;
        if total <= self.completed_sessions {
            return Err(ValidationError::InvalidValue {
                field: "hours".into(),
                message: format!(
                    "{} sessions already completed; the new estimate must leave at least one more",
                    self.completed_sessions
                ),
            });
        }
        self.duration_hours = duration_hours;
        self.total_sessions = total;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.completed_sessions >= self.total_sessions
    }

    pub fn remaining_sessions(&self) -> u32 {
        self.total_sessions.saturating_sub(self.completed_sessions)
    }

    /// Rounded 0..=100 completion percentage.
    pub fn progress_pct(&self) -> u32 {
        if self.total_sessions == 0 {
            return 0;
        }
        let pct = f64::from(self.completed_sessions) / f64::from(self.total_sessions) * 100.0;
        pct.round().min(100.0) as u32
    }

    /// Count one finished focus session toward this task.
    pub fn record_session(&mut self) -> Result<(), ValidationError> {
        if self.is_complete() {
            return Err(ValidationError::AlreadyComplete {
                id: self.id.clone(),
                total: self.total_sessions,
            });
        }
        self.completed_sessions += 1;
        Ok(())
    }

    /// One-line summary used in chat context and CLI listings.
    pub fn summary(&self) -> String {
        match self.due_date {
            Some(due) => format!(
                "{} ({}/{} sessions, due {})",
                self.name,
                self.completed_sessions,
                self.total_sessions,
                format_due(&due)
            ),
            None => format!(
                "{} ({}/{} sessions)",
                self.name, self.completed_sessions, self.total_sessions
            ),
        }
    }
}

/// `ceil(duration_hours * sessions_per_hour)`, validated.
fn session_count(duration_hours: f64, sessions_per_hour: u32) -> Result<u32, ValidationError> {
    if !duration_hours.is_finite() || duration_hours <= 0.0 {
        return Err(ValidationError::InvalidDuration(duration_hours));
    }
    if sessions_per_hour == 0 {
        return Err(ValidationError::InvalidValue {
            field: "sessions_per_hour".into(),
            message: "must be at least 1".into(),
        });
    }
    let total = (duration_hours * f64::from(sessions_per_hour)).ceil();
    if total > f64::from(u32::MAX) {
        return Err(ValidationError::InvalidDuration(duration_hours));
    }
    Ok(total as u32)
}

/// Render a due date the way the task list shows it, e.g. `Mar 4, 2025 9:30 AM`.
pub fn format_due(due: &NaiveDateTime) -> String {
    due.format("%b %-d, %Y %-I:%M %p").to_string()
}

/// Parse a user-supplied due date.
///
/// Accepts the `datetime-local` form (`2025-03-04T09:30`), the same with
/// seconds, a space-separated variant, or a full RFC 3339 timestamp which
/// is converted to local wall-clock time.
pub fn parse_due_date(input: &str) -> Result<NaiveDateTime, ValidationError> {
    let s = input.trim();
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Local).naive_local())
        .map_err(|_| ValidationError::MalformedDate(input.to_string()))
}

/// Split a comma-separated tag list.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
