//! In-process collaborators: no-ops for one-shot use and recording fakes whose
//! clones share what they saw.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::{BadgeSurface, Broadcaster, Delivery, Notification, Notifier, Scheduler};
use crate::protocol::Push;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scheduler for processes that never stay alive long enough to be woken.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScheduler;

impl Scheduler for NoopScheduler {
    fn register(&mut self, name: &str, period: Duration) {
        tracing::debug!(schedule = name, ?period, "wake-up not scheduled in this process");
    }

    fn cancel(&mut self, _name: &str) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBadge;

impl BadgeSurface for NoopBadge {
    fn set_badge(&mut self, _text: &str, _color: &str) {}
}

/// Tracks which schedules are active. Tests fire them by hand.
#[derive(Debug, Clone, Default)]
pub struct RecordingScheduler {
    active: Arc<Mutex<BTreeMap<String, Duration>>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, name: &str) -> bool {
        lock(&self.active).contains_key(name)
    }

    pub fn period(&self, name: &str) -> Option<Duration> {
        lock(&self.active).get(name).copied()
    }

    pub fn active(&self) -> Vec<String> {
        lock(&self.active).keys().cloned().collect()
    }
}

impl Scheduler for RecordingScheduler {
    fn register(&mut self, name: &str, period: Duration) {
        lock(&self.active).insert(name.to_string(), period);
    }

    fn cancel(&mut self, name: &str) {
        lock(&self.active).remove(name);
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        lock(&self.sent).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        lock(&self.sent).push(notification.clone());
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingBadge {
    current: Arc<Mutex<(String, String)>>,
}

impl RecordingBadge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        lock(&self.current).0.clone()
    }

    pub fn color(&self) -> String {
        lock(&self.current).1.clone()
    }
}

impl BadgeSurface for RecordingBadge {
    fn set_badge(&mut self, text: &str, color: &str) {
        *lock(&self.current) = (text.to_string(), color.to_string());
    }
}

/// Keeps every push. With `listening(false)` it reports that nobody received
/// them, like a closed popup.
#[derive(Debug, Clone)]
pub struct RecordingBroadcaster {
    pushes: Arc<Mutex<Vec<Push>>>,
    listening: bool,
}

impl Default for RecordingBroadcaster {
    fn default() -> Self {
        Self {
            pushes: Arc::default(),
            listening: true,
        }
    }
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listening(mut self, listening: bool) -> Self {
        self.listening = listening;
        self
    }

    pub fn pushes(&self) -> Vec<Push> {
        lock(&self.pushes).clone()
    }

    pub fn take(&self) -> Vec<Push> {
        std::mem::take(&mut *lock(&self.pushes))
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn broadcast(&self, push: &Push) -> Delivery {
        lock(&self.pushes).push(push.clone());
        if self.listening {
            Delivery::Delivered(1)
        } else {
            Delivery::NoListener
        }
    }
}
