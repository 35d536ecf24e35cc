mod engine;
mod mode;
mod mood;
mod notice;
mod streak;

pub use engine::{format_time, TimerEngine};
pub use mode::{Durations, PerMode, TimerMode};
pub use mood::Mood;
pub use notice::Notice;
pub use streak::{StreakChange, StreakState};
