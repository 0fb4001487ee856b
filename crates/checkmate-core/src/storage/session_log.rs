//! Append-only log of completed focus sessions, stored under `focusSessions`.
//!
//! Entries older than the retention window are dropped on every append, so
//! the stored list never holds anything past it once a write has happened.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{keys, StateStore};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSessionRecord {
    #[serde(rename = "date")]
    pub occurred_at: DateTime<Utc>,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
}

impl FocusSessionRecord {
    pub fn new(occurred_at: DateTime<Utc>, duration_minutes: u32) -> Self {
        Self {
            occurred_at,
            duration_minutes,
        }
    }
}

/// Read the log. Entries that do not parse are skipped.
pub fn load(store: &dyn StateStore) -> Result<Vec<FocusSessionRecord>> {
    let Some(value) = store.get_one(keys::FOCUS_SESSIONS)? else {
        return Ok(Vec::new());
    };
    let Value::Array(items) = value else {
        tracing::warn!("focusSessions is not a list, treating as empty");
        return Ok(Vec::new());
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<FocusSessionRecord>(item) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(error = %e, "skipping malformed focus session"),
        }
    }
    Ok(records)
}

/// Drop everything older than `now - retention`.
pub fn prune(records: &mut Vec<FocusSessionRecord>, now: DateTime<Utc>, retention: Duration) {
    let cutoff = now - retention;
    records.retain(|record| record.occurred_at >= cutoff);
}

/// Append one record, prune, and write the list back. Returns the number of
/// records stored.
pub fn append(
    store: &mut dyn StateStore,
    record: FocusSessionRecord,
    now: DateTime<Utc>,
    retention: Duration,
) -> Result<usize> {
    let mut records = load(store)?;
    records.push(record);
    prune(&mut records, now, retention);
    store.set_one(keys::FOCUS_SESSIONS, serde_json::to_value(&records)?)?;
    Ok(records.len())
}
