use serde::{Deserialize, Serialize};

use super::mode::TimerMode;

/// A user-facing notification. Display is up to the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

impl Notice {
    fn new(title: &str, body: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            body: body.into(),
        }
    }

    /// Shown when a countdown begins.
    pub fn for_start(mode: TimerMode, task_name: Option<&str>) -> Self {
        match mode {
            TimerMode::Pomodoro => match task_name {
                Some(name) => Self::new("Focus Time!", format!("Starting work on: {name}")),
                None => Self::new("Focus Time!", "Starting a focus session"),
            },
            TimerMode::ShortBreak => Self::new("Break Time!", "Take a short break to recharge."),
            TimerMode::LongBreak => Self::new("Long Break!", "Step away for a while. You earned it."),
        }
    }

    /// Shown when a countdown reaches zero.
    pub fn for_completion(mode: TimerMode, short_break_minutes: u32) -> Self {
        match mode {
            TimerMode::Pomodoro => Self::new(
                "Break Time!",
                format!("Great job! Take a {short_break_minutes}-minute break."),
            ),
            TimerMode::ShortBreak | TimerMode::LongBreak => {
                Self::new("Break Over!", "Time to get back to work!")
            }
        }
    }
}
