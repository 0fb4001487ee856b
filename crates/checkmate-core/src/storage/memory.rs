use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};

use super::StateStore;
use crate::error::{CoreError, Result};

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, Value>,
    fail_writes: bool,
}

/// Process-local store. Clones share one map, so a test can keep a handle
/// after moving the store into a service.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` fail, as a full disk would.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.lock().values.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateStore for MemoryStore {
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let inner = self.lock();
        Ok(keys
            .iter()
            .filter_map(|key| {
                inner
                    .values
                    .get(*key)
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect())
    }

    fn set(&mut self, entries: Map<String, Value>) -> Result<()> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(CoreError::Custom("memory store is read-only".into()));
        }
        inner.values.extend(entries);
        Ok(())
    }
}
