//! Durable key-value state and on-disk configuration.
//!
//! Every persisted value is a JSON value under a flat key, mirroring the
//! browser-extension storage the timer was first written against. Two
//! backends implement [`StateStore`]: an in-memory map and SQLite.

mod config;
pub mod database;
pub mod first_run;
mod memory;
pub mod migrations;
pub mod session_log;

pub use config::{BadgeConfig, Config, HistoryConfig, NotificationsConfig, TimerConfig};
pub use database::SqliteStore;
pub use memory::MemoryStore;
pub use session_log::FocusSessionRecord;

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::error::Result;

/// Persisted key names.
pub mod keys {
    pub const IS_RUNNING: &str = "isRunning";
    pub const START_TIME: &str = "startTime";
    pub const TOTAL_SECONDS: &str = "totalSeconds";
    pub const IS_BREAK_TIME: &str = "isBreakTime";
    pub const ORIGINAL_TIME: &str = "originalTime";
    pub const SUGGESTED_BREAK: &str = "suggestedBreak";
    pub const FOCUS_SESSIONS: &str = "focusSessions";
    pub const HAS_SEEN_INSTRUCTIONS: &str = "hasSeenInstructions";
    pub const TASKS: &str = "tasks";

    /// Keys that together make up the timer snapshot.
    pub const TIMER: [&str; 6] = [
        IS_RUNNING,
        START_TIME,
        TOTAL_SECONDS,
        IS_BREAK_TIME,
        ORIGINAL_TIME,
        SUGGESTED_BREAK,
    ];
}

/// Durable key-value store, read and written by key set.
///
/// `get` omits keys that were never written. Values survive process restarts
/// for durable backends.
pub trait StateStore: Send {
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    fn set(&mut self, entries: Map<String, Value>) -> Result<()>;

    fn get_one(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.get(&[key])?.remove(key))
    }

    fn set_one(&mut self, key: &str, value: Value) -> Result<()> {
        let mut entries = Map::new();
        entries.insert(key.to_string(), value);
        self.set(entries)
    }
}

/// Returns the data directory, creating it if needed.
///
/// `CHECKMATE_DATA_DIR` wins when set. Otherwise `~/.config/checkmate`, or
/// `~/.config/checkmate-dev` when `CHECKMATE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("CHECKMATE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("CHECKMATE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("checkmate-dev")
            } else {
                base_dir.join("checkmate")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
