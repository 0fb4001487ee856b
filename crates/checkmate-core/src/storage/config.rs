//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default focus length and presets
//! - The break-length policy table
//! - Wake-up periods for the countdown and the badge
//! - Notification and badge appearance
//! - Focus history retention
//!
//! Configuration is stored at `~/.config/checkmate/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, Result, ValidationError};
use crate::timer::BreakPolicy;

/// Timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_minutes")]
    pub default_focus_minutes: u32,
    #[serde(default = "default_presets")]
    pub presets: Vec<u32>,
    #[serde(default = "default_min_custom_minutes")]
    pub min_custom_minutes: u32,
    #[serde(default = "default_max_custom_minutes")]
    pub max_custom_minutes: u32,
    #[serde(default = "default_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub badge_interval_ms: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_priority")]
    pub priority: u8,
}

/// Badge colours per phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeConfig {
    #[serde(default = "default_focus_color")]
    pub focus_color: String,
    #[serde(default = "default_break_color")]
    pub break_color: String,
    #[serde(default = "default_paused_color")]
    pub paused_color: String,
}

/// Focus history configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/checkmate/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub break_policy: BreakPolicy,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub badge: BadgeConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

// Default functions
fn default_focus_minutes() -> u32 {
    25
}
fn default_presets() -> Vec<u32> {
    vec![15, 25, 45, 60]
}
fn default_min_custom_minutes() -> u32 {
    1
}
fn default_max_custom_minutes() -> u32 {
    120
}
fn default_interval_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_priority() -> u8 {
    2
}
fn default_focus_color() -> String {
    "#e53935".into()
}
fn default_break_color() -> String {
    "#43a047".into()
}
fn default_paused_color() -> String {
    "#757575".into()
}
fn default_retention_days() -> u32 {
    30
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_focus_minutes: default_focus_minutes(),
            presets: default_presets(),
            min_custom_minutes: default_min_custom_minutes(),
            max_custom_minutes: default_max_custom_minutes(),
            tick_interval_ms: default_interval_ms(),
            badge_interval_ms: default_interval_ms(),
        }
    }
}

impl TimerConfig {
    /// Check a user-entered focus length before it becomes a command.
    ///
    /// # Errors
    /// Returns [`ValidationError::OutOfRange`] outside
    /// `min_custom_minutes..=max_custom_minutes`.
    pub fn validate_minutes(&self, minutes: i64) -> Result<u32, ValidationError> {
        self.minutes_in_range("minutes", minutes)?;
        Ok(minutes as u32)
    }

    fn minutes_in_range(&self, field: &str, minutes: i64) -> Result<(), ValidationError> {
        check_range(
            field,
            minutes,
            self.min_custom_minutes.into(),
            self.max_custom_minutes.into(),
        )
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn badge_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.badge_interval_ms.max(1))
    }
}

fn check_range(field: &str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            value,
        });
    }
    Ok(())
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: default_priority(),
        }
    }
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            focus_color: default_focus_color(),
            break_color: default_break_color(),
            paused_color: default_paused_color(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
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
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
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

    /// Check values that parse fine but would break the timer: the focus
    /// length bounds, the default and preset lengths inside them, the
    /// notification priority and the history window.
    ///
    /// # Errors
    /// Returns [`ValidationError::OutOfRange`] naming the offending key.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let timer = &self.timer;
        check_range(
            "timer.min_custom_minutes",
            timer.min_custom_minutes.into(),
            1,
            timer.max_custom_minutes.into(),
        )?;
        timer.minutes_in_range(
            "timer.default_focus_minutes",
            timer.default_focus_minutes.into(),
        )?;
        for &preset in &timer.presets {
            timer.minutes_in_range("timer.presets", preset.into())?;
        }
        check_range(
            "notifications.priority",
            self.notifications.priority.into(),
            0,
            2,
        )?;
        check_range(
            "history.retention_days",
            self.history.retention_days.into(),
            1,
            u32::MAX.into(),
        )
    }

    /// `<data dir>/config.toml`.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default path, writing defaults there on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
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

    /// Set a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse as
    /// the existing field's type.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a value by key and save to the default path. Nothing is saved,
    /// and `self` is left untouched, when the result fails [`Self::validate`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// the resulting config is invalid, or it cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        updated.set_value(key, value)?;
        updated.validate()?;
        updated.save()?;
        *self = updated;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.history.retention_days))
    }
}
