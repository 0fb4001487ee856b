//! One-time instructions notice, tracked by `hasSeenInstructions`.

use serde_json::Value;

use super::{keys, StateStore};
use crate::error::Result;

pub fn needs_instructions(store: &dyn StateStore) -> Result<bool> {
    Ok(!matches!(
        store.get_one(keys::HAS_SEEN_INSTRUCTIONS)?,
        Some(Value::Bool(true))
    ))
}

pub fn mark_instructions_seen(store: &mut dyn StateStore) -> Result<()> {
    store.set_one(keys::HAS_SEEN_INSTRUCTIONS, Value::Bool(true))
}
