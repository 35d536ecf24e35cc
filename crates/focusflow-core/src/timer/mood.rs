use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::mode::Durations;
use crate::error::ValidationError;

/// Self-reported mood. Some moods retune the timer durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Focused,
    Distracted,
    Energetic,
    Tired,
    Stressed,
    Relaxed,
    Motivated,
    Unmotivated,
    Creative,
    Blocked,
}

impl Mood {
    pub const ALL: [Mood; 10] = [
        Mood::Focused,
        Mood::Distracted,
        Mood::Energetic,
        Mood::Tired,
        Mood::Stressed,
        Mood::Relaxed,
        Mood::Motivated,
        Mood::Unmotivated,
        Mood::Creative,
        Mood::Blocked,
    ];

    /// Adjust `durations` for this mood and return the advice to show.
    pub fn apply(&self, durations: &mut Durations) -> &'static str {
        match self {
            Mood::Focused => {
                durations.pomodoro = 30;
                durations.short_break = 5;
                "Timer settings optimized for deep work."
            }
            Mood::Energetic => {
                durations.pomodoro = 40;
                durations.short_break = 5;
                "Extended work sessions to capitalize on your energy."
            }
            Mood::Blocked => {
                "Taking a break to clear your mind. Consider a quick walk or meditation."
            }
            Mood::Tired | Mood::Distracted => "Try to break up your tasks.",
            _ => {
                "Timer settings unchanged. Remember to adjust your environment for optimal productivity."
            }
        }
    }
}

impl FromStr for Mood {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Mood::ALL
            .into_iter()
            .find(|m| {
                serde_json::to_value(m)
                    .ok()
                    .and_then(|v| v.as_str().map(|name| name == wanted))
                    .unwrap_or(false)
            })
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "mood".into(),
                message: format!("unknown mood '{s}'"),
            })
    }
}
