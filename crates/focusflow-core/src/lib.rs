//! # FocusFlow Core Library
//!
//! Business logic for FocusFlow, a Pomodoro-driven study planner. Every
//! operation is available through the `focusflow` CLI, which is a thin layer
//! over this crate.
//!
//! ## Architecture
//!
//! - **Tasks**: estimated work split into 30-minute sessions, moving between
//!   active, completed and deleted sets
//! - **Timer Engine**: a per-mode countdown that the caller drives with
//!   `tick()` or `catch_up(now)`
//! - **Schedule**: focus/break blocks derived from the task list on demand
//! - **Storage**: SQLite for tasks, sessions and the user profile, TOML for
//!   configuration
//! - **Chat**: relay to an OpenAI-compatible model with task context
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: countdown state machine
//! - [`FocusSession`]: applies a finished countdown to storage
//! - [`SqliteTaskStore`]: task lifecycle persistence
//! - [`generate_time_blocks`]: the derived calendar schedule
//! - [`ChatRelay`]: assistant client

pub mod calendar;
pub mod chat;
pub mod error;
pub mod events;
pub mod schedule;
pub mod session;
pub mod storage;
pub mod task;
pub mod timer;

pub use calendar::DayView;
pub use chat::{ChatMessage, ChatRelay, Role};
pub use error::{ChatError, ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use events::Event;
pub use schedule::{generate_time_blocks, BlockType, ScheduleConfig, TimeBlock, ViewMode};
pub use session::{CompletionReport, FocusSession};
pub use storage::{Config, Database, ProgressOutcome, SqliteTaskStore, TaskRepository};
pub use task::{NewTask, TagKind, Task, TaskSet};
pub use timer::{Durations, Mood, Notice, StreakChange, StreakState, TimerEngine, TimerMode};
