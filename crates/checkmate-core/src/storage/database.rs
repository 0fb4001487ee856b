//! SQLite-backed [`StateStore`].
//!
//! Values are stored as JSON text in a single `kv` table, so the store holds
//! whatever shape the caller writes: the timer snapshot, the session log,
//! the task list.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection};
use serde_json::{Map, Value};

use super::{data_dir, migrations, StateStore};
use crate::error::{DatabaseError, Result};

/// SQLite database for persisted state.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/checkmate.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_path(data_dir()?.join("checkmate.db"))
    }

    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }
}

impl StateStore for SqliteStore {
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut out = Map::new();
        for key in keys {
            let raw = match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
                Ok(raw) => raw,
                Err(rusqlite::Error::QueryReturnedNoRows) => continue,
                Err(e) => return Err(e.into()),
            };
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    out.insert(key.to_string(), value);
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "ignoring unreadable stored value");
                }
            }
        }
        Ok(out)
    }

    fn set(&mut self, entries: Map<String, Value>) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            )?;
            for (key, value) in &entries {
                stmt.execute(params![key, value.to_string(), updated_at])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
