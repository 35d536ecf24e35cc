//! Core error types for focusflow-core.
//!
//! This module defines the error hierarchy used across the library.
//! Each subsystem has its own enum and everything funnels into [`CoreError`].

use std::path::PathBuf;
use thiserror::Error;

use crate::task::TaskSet;

/// Core error type for focusflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Chat relay errors
    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    /// A task id that does not exist in the requested collection
    #[error("Task not found in {set}: {id}")]
    NotFound { set: TaskSet, id: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dotted key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Could not determine or create the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// Task name was blank
    #[error("Task name must not be empty")]
    EmptyName,

    /// Duration was zero, negative or not a number
    #[error("Duration must be a positive number of hours, got {0}")]
    InvalidDuration(f64),

    /// Due date string could not be parsed
    #[error("Malformed date '{0}': expected YYYY-MM-DDTHH:MM or RFC 3339")]
    MalformedDate(String),

    /// Task has no sessions left to record
    #[error("Task '{id}' already has all {total} sessions completed")]
    AlreadyComplete { id: String, total: u32 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Chat relay errors.
#[derive(Error, Debug)]
pub enum ChatError {
    /// API key environment variable not set
    #[error("API key not configured: set {0}")]
    MissingApiKey(String),

    /// Base URL in config could not be parsed
    #[error("Invalid chat endpoint '{url}': {message}")]
    InvalidEndpoint { url: String, message: String },

    /// Transport failure
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the model endpoint
    #[error("Model endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
