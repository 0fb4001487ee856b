//! Collaborators the timer service is injected with.
//!
//! The service never talks to a platform directly: persistence, wake-ups,
//! notifications, the badge and view broadcasts all go through these traits,
//! so a test can swap every one of them for a recording fake.

mod memory;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::Push;
use crate::storage::StateStore;
use crate::timer::Clock;

pub use memory::{
    NoopBadge, NoopScheduler, RecordingBadge, RecordingBroadcaster, RecordingNotifier,
    RecordingScheduler,
};

/// Wake-up that advances the countdown.
pub const TICK_SCHEDULE: &str = "timer";
/// Wake-up that refreshes the badge text.
pub const BADGE_SCHEDULE: &str = "badge";

/// Registers named periodic wake-ups. The owner of the service routes each
/// firing back through [`TimerService::on_wake`](crate::timer::TimerService::on_wake).
pub trait Scheduler: Send {
    /// Register (or replace) the schedule called `name`.
    fn register(&mut self, name: &str, period: Duration);

    /// Cancel the schedule called `name`. Cancelling an unknown name is a no-op.
    fn cancel(&mut self, name: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub priority: u8,
}

/// Fires user-facing notifications. No delivery result is consumed.
pub trait Notifier: Send {
    fn notify(&self, notification: &Notification);
}

/// Short status text next to the app icon, overwritten on every update.
pub trait BadgeSurface: Send {
    fn set_badge(&mut self, text: &str, color: &str);
}

/// Outcome of a broadcast. Neither variant is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered(usize),
    NoListener,
}

/// Fire-and-forget fan-out to every open view.
///
/// There is no delivery guarantee and no retry. A closed popup simply misses
/// the message and re-syncs with `GET_TIME` when it is opened again.
pub trait Broadcaster: Send {
    fn broadcast(&self, push: &Push) -> Delivery;
}

/// Everything the timer service depends on, bundled for construction.
pub struct Host {
    pub store: Box<dyn StateStore>,
    pub scheduler: Box<dyn Scheduler>,
    pub notifier: Box<dyn Notifier>,
    pub badge: Box<dyn BadgeSurface>,
    pub broadcaster: Box<dyn Broadcaster>,
    pub clock: Arc<dyn Clock>,
}
