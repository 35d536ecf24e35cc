use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{StreakChange, TimerMode};

/// Every state change produces an Event. Front ends render them;
/// the session layer reacts to `TimerCompleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        remaining_secs: u64,
        task_id: Option<String>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        mode: TimerMode,
        duration_secs: u64,
        task_id: Option<String>,
        started_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        from: TimerMode,
        to: TimerMode,
        at: DateTime<Utc>,
    },
    DurationChanged {
        mode: TimerMode,
        minutes: u32,
        at: DateTime<Utc>,
    },
    TaskProgressed {
        task_id: String,
        name: String,
        completed_sessions: u32,
        total_sessions: u32,
        at: DateTime<Utc>,
    },
    /// The last session of a task finished; it now lives in the completed set.
    TaskCompleted {
        task_id: String,
        name: String,
        total_sessions: u32,
        at: DateTime<Utc>,
    },
    StreakUpdated {
        streak: u32,
        change: StreakChange,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: TimerMode,
        is_active: bool,
        remaining_secs: u64,
        total_secs: u64,
        time_studied_secs: u64,
        selected_task: Option<String>,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerCompleted { at, .. }
            | Event::TimerReset { at, .. }
            | Event::ModeSwitched { at, .. }
            | Event::DurationChanged { at, .. }
            | Event::TaskProgressed { at, .. }
            | Event::TaskCompleted { at, .. }
            | Event::StreakUpdated { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let ev = Event::ModeSwitched {
            from: TimerMode::Pomodoro,
            to: TimerMode::LongBreak,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "ModeSwitched");
        assert_eq!(json["to"], "longBreak");
    }
}
