//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Timer durations per mode
//! - Calendar schedule generation settings
//! - Task lifecycle settings (deleted-task retention)
//! - Chat relay endpoint and model
//! - The local user identity
//!
//! Configuration is stored at `~/.config/focusflow/config.toml`.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::schedule::ScheduleConfig;
use crate::timer::Durations;

/// Timer durations in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_pomodoro")]
    pub pomodoro_minutes: u32,
    #[serde(default = "default_short_break")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break")]
    pub long_break_minutes: u32,
}

/// Calendar schedule generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSettings {
    /// `HH:MM` local time the first block of each day starts at.
    #[serde(default = "default_day_start")]
    pub day_start: String,
    #[serde(default = "default_pomodoro")]
    pub focus_minutes: u32,
    #[serde(default = "default_short_break")]
    pub break_minutes: u32,
    /// Lowercase weekday name, e.g. `sunday` or `monday`.
    #[serde(default = "default_week_start")]
    pub week_start: String,
}

/// Task lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    #[serde(default = "default_retention_hours")]
    pub deleted_retention_hours: u32,
    #[serde(default = "default_sessions_per_hour")]
    pub sessions_per_hour: u32,
}

/// Chat relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Local user identity. Authentication is handled elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusflow/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub user: UserConfig,
}

fn default_pomodoro() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_day_start() -> String {
    "08:00".into()
}
fn default_week_start() -> String {
    "sunday".into()
}
fn default_retention_hours() -> u32 {
    24
}
fn default_sessions_per_hour() -> u32 {
    crate::task::DEFAULT_SESSIONS_PER_HOUR
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "meta-llama/llama-3.1-8b-instruct:free".into()
}
fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_user_id() -> String {
    "local".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            pomodoro_minutes: default_pomodoro(),
            short_break_minutes: default_short_break(),
            long_break_minutes: default_long_break(),
        }
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            day_start: default_day_start(),
            focus_minutes: default_pomodoro(),
            break_minutes: default_short_break(),
            week_start: default_week_start(),
        }
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            deleted_retention_hours: default_retention_hours(),
            sessions_per_hour: default_sessions_per_hour(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
            name: None,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or create the default config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default configuration");
                Self::default()
            }
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value in memory. The result is validated before it
    /// replaces `self`.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Reject values that parse as TOML but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule_config()?;
        self.durations()?;
        if self.tasks.sessions_per_hour == 0 {
            return Err(ConfigError::InvalidValue {
                key: "tasks.sessions_per_hour".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.user.id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "user.id".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Timer durations by mode.
    pub fn durations(&self) -> Result<Durations, ConfigError> {
        let t = &self.timer;
        for (key, minutes) in [
            ("timer.pomodoro_minutes", t.pomodoro_minutes),
            ("timer.short_break_minutes", t.short_break_minutes),
            ("timer.long_break_minutes", t.long_break_minutes),
        ] {
            if minutes == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "must be at least 1 minute".into(),
                });
            }
        }
        Ok(Durations {
            pomodoro: t.pomodoro_minutes,
            short_break: t.short_break_minutes,
            long_break: t.long_break_minutes,
        })
    }

    /// Settings for the calendar schedule generator.
    pub fn schedule_config(&self) -> Result<ScheduleConfig, ConfigError> {
        let s = &self.schedule;
        let day_start = NaiveTime::parse_from_str(&s.day_start, "%H:%M").map_err(|e| {
            ConfigError::InvalidValue {
                key: "schedule.day_start".into(),
                message: format!("'{}': {e}", s.day_start),
            }
        })?;
        let week_start: Weekday =
            s.week_start
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "schedule.week_start".into(),
                    message: format!("'{}' is not a weekday", s.week_start),
                })?;
        if s.focus_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "schedule.focus_minutes".into(),
                message: "must be at least 1 minute".into(),
            });
        }
        Ok(ScheduleConfig {
            day_start,
            focus_minutes: s.focus_minutes,
            break_minutes: s.break_minutes,
            week_start,
        })
    }

    pub fn deleted_retention(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.tasks.deleted_retention_hours))
    }
}
