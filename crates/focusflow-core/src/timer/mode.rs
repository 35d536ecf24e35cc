use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    Pomodoro,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    pub const ALL: [TimerMode; 3] = [TimerMode::Pomodoro, TimerMode::ShortBreak, TimerMode::LongBreak];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Pomodoro => "pomodoro",
            TimerMode::ShortBreak => "shortBreak",
            TimerMode::LongBreak => "longBreak",
        }
    }

    /// Short label for titles and listings.
    pub fn label(&self) -> &'static str {
        match self {
            TimerMode::Pomodoro => "Focus",
            TimerMode::ShortBreak => "Break",
            TimerMode::LongBreak => "Long Break",
        }
    }

    pub fn is_focus(&self) -> bool {
        matches!(self, TimerMode::Pomodoro)
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "pomodoro" | "focus" => Ok(TimerMode::Pomodoro),
            "shortbreak" | "short" | "break" => Ok(TimerMode::ShortBreak),
            "longbreak" | "long" => Ok(TimerMode::LongBreak),
            _ => Err(ValidationError::InvalidValue {
                field: "mode".into(),
                message: format!("unknown timer mode '{s}'"),
            }),
        }
    }
}

/// One value per timer mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerMode<T> {
    pub pomodoro: T,
    pub short_break: T,
    pub long_break: T,
}

impl<T: Copy> PerMode<T> {
    pub fn get(&self, mode: TimerMode) -> T {
        match mode {
            TimerMode::Pomodoro => self.pomodoro,
            TimerMode::ShortBreak => self.short_break,
            TimerMode::LongBreak => self.long_break,
        }
    }

    pub fn get_mut(&mut self, mode: TimerMode) -> &mut T {
        match mode {
            TimerMode::Pomodoro => &mut self.pomodoro,
            TimerMode::ShortBreak => &mut self.short_break,
            TimerMode::LongBreak => &mut self.long_break,
        }
    }
}

/// Duration of each mode in minutes.
pub type Durations = PerMode<u32>;

impl Durations {
    pub fn secs(&self, mode: TimerMode) -> u64 {
        u64::from(self.get(mode)).saturating_mul(60)
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            pomodoro: 25,
            short_break: 5,
            long_break: 15,
        }
    }
}
