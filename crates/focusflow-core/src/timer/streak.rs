//! Daily focus streak.
//!
//! A streak counts consecutive calendar days with at least one completed
//! focus session. Skipping a day resets it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub streak: u32,
    /// Local date of the most recent counted focus session.
    pub last_update: Option<NaiveDate>,
}

/// What a completion did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum StreakChange {
    /// Already counted today.
    Unchanged { streak: u32 },
    /// First session of a new consecutive day.
    Incremented { streak: u32 },
    /// First ever session, or the chain was broken.
    Started { previous: u32 },
}

impl StreakChange {
    pub fn streak(&self) -> u32 {
        match self {
            StreakChange::Unchanged { streak } | StreakChange::Incremented { streak } => *streak,
            StreakChange::Started { .. } => 1,
        }
    }
}

impl StreakState {
    /// Count a completed focus session on `today`.
    pub fn record_focus_completion(&mut self, today: NaiveDate) -> StreakChange {
        let change = match self.last_update {
            Some(last) if last == today => StreakChange::Unchanged {
                streak: self.streak,
            },
            Some(last) if last > today => {
                // Clock moved backwards; keep the stored value.
                StreakChange::Unchanged {
                    streak: self.streak,
                }
            }
            Some(last) if (today - last).num_days() == 1 => {
                self.streak = self.streak.saturating_add(1);
                self.last_update = Some(today);
                StreakChange::Incremented {
                    streak: self.streak,
                }
            }
            _ => {
                let previous = self.streak;
                self.streak = 1;
                self.last_update = Some(today);
                StreakChange::Started { previous }
            }
        };
        if !matches!(change, StreakChange::Unchanged { .. }) {
            tracing::info!(streak = self.streak, %today, "streak updated");
        }
        change
    }

    /// Streak as seen on `today`: zero once a full day has been skipped.
    pub fn current(&self, today: NaiveDate) -> u32 {
        match self.last_update {
            Some(last) if (today - last).num_days() <= 1 => self.streak,
            _ => 0,
        }
    }
}
