pub mod calendar;
pub mod chat;
pub mod config;
pub mod stats;
pub mod task;
pub mod timer;

use focusflow_core::storage::database_path;
use focusflow_core::{Config, Database, SqliteTaskStore, TaskRepository};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Per-invocation settings shared by all commands.
pub struct Context {
    user_override: Option<String>,
}

impl Context {
    pub fn new(user_override: Option<String>) -> Self {
        Self { user_override }
    }

    pub fn user_id(&self, config: &Config) -> String {
        self.user_override
            .clone()
            .unwrap_or_else(|| config.user.id.clone())
    }
}

/// Open both stores on the shared database file.
pub fn open_stores() -> Result<(Database, SqliteTaskStore), Box<dyn std::error::Error>> {
    let path = database_path()?;
    Ok((Database::open_at(&path)?, SqliteTaskStore::open_at(&path)?))
}

/// Drop deleted tasks past the retention window.
pub fn purge_expired(
    store: &SqliteTaskStore,
    config: &Config,
    user_id: &str,
) -> Result<usize, Box<dyn std::error::Error>> {
    let purged = store.purge_deleted(user_id, chrono::Utc::now(), config.deleted_retention())?;
    if purged > 0 {
        tracing::info!(purged, user_id, "purged expired deleted tasks");
    }
    Ok(purged)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
