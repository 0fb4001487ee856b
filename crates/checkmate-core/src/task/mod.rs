//! Ordered to-do list kept next to the timer.
//!
//! Priorities are always the 1-based list positions; every mutation that
//! changes order renumbers them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::error::{Result, ValidationError};
use crate::storage::{keys, StateStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub priority: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the list stored under `tasks`. Entries that do not parse are
    /// skipped.
    pub fn load(store: &dyn StateStore) -> Result<Self> {
        let Some(value) = store.get_one(keys::TASKS)? else {
            return Ok(Self::new());
        };
        let Value::Array(items) = value else {
            warn!("tasks is not a list, treating as empty");
            return Ok(Self::new());
        };
        let tasks = items
            .into_iter()
            .filter_map(|item| {
                serde_json::from_value::<Task>(item)
                    .map_err(|e| warn!(error = %e, "skipping malformed task"))
                    .ok()
            })
            .collect();
        let mut list = Self { tasks };
        list.renumber();
        Ok(list)
    }

    pub fn save(&self, store: &mut dyn StateStore) -> Result<()> {
        store.set_one(keys::TASKS, serde_json::to_value(&self.tasks)?)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Resolve what a user typed: a full id, a unique id prefix, or a 1-based
    /// position.
    pub fn resolve(&self, key: &str) -> Result<&str, ValidationError> {
        let key = key.trim();
        if let Some(task) = self.get(key) {
            return Ok(&task.id);
        }
        if let Ok(position) = key.parse::<usize>() {
            if let Some(task) = position.checked_sub(1).and_then(|i| self.tasks.get(i)) {
                return Ok(&task.id);
            }
        }
        let mut matches = self.tasks.iter().filter(|t| t.id.starts_with(key));
        match (matches.next(), matches.next()) {
            (Some(task), None) if !key.is_empty() => Ok(&task.id),
            _ => Err(ValidationError::UnknownTask(key.to_string())),
        }
    }

    /// Append a task. Surrounding whitespace is trimmed; empty text is
    /// rejected.
    pub fn add(&mut self, text: &str, now: DateTime<Utc>) -> Result<&Task, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Empty("task text".into()));
        }
        self.tasks.push(Task {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            completed: false,
            priority: self.tasks.len() as u32 + 1,
            created_at: now,
        });
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Flip completion. Returns the new value.
    pub fn toggle(&mut self, id: &str) -> Result<bool, ValidationError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ValidationError::UnknownTask(id.to_string()))?;
        task.completed = !task.completed;
        Ok(task.completed)
    }

    pub fn delete(&mut self, id: &str) -> Result<Task, ValidationError> {
        let index = self.index_of(id)?;
        let removed = self.tasks.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// Move a task to `index` (0-based, clamped to the end of the list).
    pub fn move_to(&mut self, id: &str, index: usize) -> Result<(), ValidationError> {
        let from = self.index_of(id)?;
        let task = self.tasks.remove(from);
        let to = index.min(self.tasks.len());
        self.tasks.insert(to, task);
        self.renumber();
        Ok(())
    }

    fn index_of(&self, id: &str) -> Result<usize, ValidationError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ValidationError::UnknownTask(id.to_string()))
    }

    fn renumber(&mut self) {
        for (i, task) in self.tasks.iter_mut().enumerate() {
            task.priority = i as u32 + 1;
        }
    }
}
