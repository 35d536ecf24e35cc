mod config;
pub mod database;
pub mod task_store;

pub use config::{ChatConfig, Config, ScheduleSettings, TasksConfig, TimerConfig, UserConfig};
pub use database::{Database, SessionRecord, Stats, UserProfile};
pub use task_store::{ProgressOutcome, SqliteTaskStore, TaskRepository};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/focusflow[-dev]/`, or `$FOCUSFLOW_HOME` when set.
///
/// Set FOCUSFLOW_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSFLOW_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSFLOW_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusflow-dev")
            } else {
                base_dir.join("focusflow")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Path of the SQLite file shared by [`Database`] and [`SqliteTaskStore`].
pub fn database_path() -> Result<PathBuf, ConfigError> {
    Ok(data_dir()?.join("focusflow.db"))
}
