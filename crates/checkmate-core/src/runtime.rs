//! Long-lived host for the timer service on a tokio runtime.
//!
//! One task owns the [`TimerService`]; commands and scheduler wake-ups reach it
//! through a single inbox, so they are applied strictly one at a time. Pushes
//! fan out on a broadcast channel that any number of views may subscribe to.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};
use crate::host::{BadgeSurface, Broadcaster, Delivery, Host, Notifier, Scheduler};
use crate::protocol::{Command, Push};
use crate::storage::{Config, StateStore};
use crate::timer::{Clock, DisplaySnapshot, TimerService, TimerState};

const PUSH_CAPACITY: usize = 64;

enum Inbound {
    Command {
        command: Command,
        reply: Option<oneshot::Sender<Option<DisplaySnapshot>>>,
    },
    Wake(String),
    Shutdown,
}

/// Interval tasks that post wake-ups into the service inbox.
pub struct TokioScheduler {
    inbox: mpsc::UnboundedSender<Inbound>,
    tasks: HashMap<String, JoinHandle<()>>,
}

impl TokioScheduler {
    fn new(inbox: mpsc::UnboundedSender<Inbound>) -> Self {
        Self {
            inbox,
            tasks: HashMap::new(),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn register(&mut self, name: &str, period: Duration) {
        if let Some(previous) = self.tasks.remove(name) {
            previous.abort();
        }
        let inbox = self.inbox.clone();
        let schedule = name.to_string();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if inbox.send(Inbound::Wake(schedule.clone())).is_err() {
                    break;
                }
            }
        });
        debug!(schedule = name, ?period, "registered wake-up");
        self.tasks.insert(name.to_string(), handle);
    }

    fn cancel(&mut self, name: &str) {
        if let Some(handle) = self.tasks.remove(name) {
            handle.abort();
            debug!(schedule = name, "cancelled wake-up");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

/// Broadcaster backed by [`tokio::sync::broadcast`].
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<Push>,
}

impl Broadcaster for ChannelBroadcaster {
    fn broadcast(&self, push: &Push) -> Delivery {
        match self.sender.send(push.clone()) {
            Ok(receivers) => Delivery::Delivered(receivers),
            Err(_) => Delivery::NoListener,
        }
    }
}

/// The collaborators a caller supplies. The runtime adds its own scheduler
/// and broadcaster.
pub struct HostParts {
    pub store: Box<dyn StateStore>,
    pub notifier: Box<dyn Notifier>,
    pub badge: Box<dyn BadgeSurface>,
    pub clock: Arc<dyn Clock>,
}

/// Cloneable sender side of a running service.
#[derive(Clone)]
pub struct TimerHandle {
    inbox: mpsc::UnboundedSender<Inbound>,
    pushes: broadcast::Sender<Push>,
}

impl TimerHandle {
    /// Fire-and-forget command.
    pub fn send(&self, command: Command) -> Result<()> {
        self.inbox
            .send(Inbound::Command {
                command,
                reply: None,
            })
            .map_err(|_| CoreError::ServiceStopped)
    }

    /// Send a command and wait until the service has applied it. For
    /// `GET_TIME` the answer is the current snapshot.
    pub async fn request(&self, command: Command) -> Result<Option<DisplaySnapshot>> {
        let (reply, answer) = oneshot::channel();
        self.inbox
            .send(Inbound::Command {
                command,
                reply: Some(reply),
            })
            .map_err(|_| CoreError::ServiceStopped)?;
        answer.await.map_err(|_| CoreError::ServiceStopped)
    }

    /// Wire entry point. Malformed messages are logged and dropped.
    pub async fn request_json(&self, raw: &str) -> Result<Option<String>> {
        let command = match Command::from_json(raw) {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, "ignoring malformed message");
                return Ok(None);
            }
        };
        let expects_reply = command.expects_reply();
        let answer = self.request(command).await?;
        if !expects_reply {
            return Ok(None);
        }
        Ok(Some(serde_json::to_string(&answer)?))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Push> {
        self.pushes.subscribe()
    }
}

/// A service task plus its handle.
pub struct TimerRuntime {
    handle: TimerHandle,
    task: JoinHandle<TimerState>,
}

impl TimerRuntime {
    /// Boot the service inside a new task. Must be called from within a tokio
    /// runtime.
    pub fn spawn(parts: HostParts, config: Config) -> Self {
        let (inbox, receiver) = mpsc::unbounded_channel();
        let (pushes, _) = broadcast::channel(PUSH_CAPACITY);

        let host = Host {
            store: parts.store,
            scheduler: Box::new(TokioScheduler::new(inbox.clone())),
            notifier: parts.notifier,
            badge: parts.badge,
            broadcaster: Box::new(ChannelBroadcaster {
                sender: pushes.clone(),
            }),
            clock: parts.clock,
        };
        let task = tokio::spawn(async move {
            let service = TimerService::boot(host, config);
            run(service, receiver).await
        });

        Self {
            handle: TimerHandle { inbox, pushes },
            task,
        }
    }

    pub fn handle(&self) -> TimerHandle {
        self.handle.clone()
    }

    /// Stop the service and return its final state. Pending commands queued
    /// before the call are applied first.
    pub async fn shutdown(self) -> Result<TimerState> {
        // A send error means the task is already gone; join reports why.
        let _ = self.handle.inbox.send(Inbound::Shutdown);
        self.task
            .await
            .map_err(|e| CoreError::Custom(format!("timer task failed: {e}")))
    }
}

async fn run(mut service: TimerService, mut inbox: mpsc::UnboundedReceiver<Inbound>) -> TimerState {
    while let Some(message) = inbox.recv().await {
        match message {
            Inbound::Command { command, reply } => {
                let answer = service.handle(command);
                if let Some(reply) = reply {
                    let _ = reply.send(answer);
                }
            }
            Inbound::Wake(name) => {
                if let Some(completion) = service.on_wake(&name) {
                    info!(?completion, "run completed");
                }
            }
            Inbound::Shutdown => break,
        }
    }
    debug!("timer service stopped");
    service.state().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{NoopBadge, RecordingBadge, RecordingNotifier, TICK_SCHEDULE};
    use crate::storage::MemoryStore;
    use crate::timer::ManualClock;

    const T0: i64 = 1_700_000_000_000;

    fn parts(clock: &ManualClock, store: &MemoryStore) -> HostParts {
        HostParts {
            store: Box::new(store.clone()),
            notifier: Box::new(RecordingNotifier::new()),
            badge: Box::new(NoopBadge),
            clock: Arc::new(clock.clone()),
        }
    }

    async fn drive(clock: &ManualClock, seconds: u64) {
        for _ in 0..seconds {
            clock.advance_secs(1);
            time::sleep(Duration::from_secs(1)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_wakes_until_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TokioScheduler::new(tx);
        scheduler.register(TICK_SCHEDULE, Duration::from_secs(1));

        time::sleep(Duration::from_millis(3_500)).await;
        let mut wakes = 0;
        while let Ok(Inbound::Wake(name)) = rx.try_recv() {
            assert_eq!(name, TICK_SCHEDULE);
            wakes += 1;
        }
        assert_eq!(wakes, 3);

        scheduler.cancel(TICK_SCHEDULE);
        scheduler.cancel(TICK_SCHEDULE);
        time::sleep(Duration::from_secs(3)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn get_time_is_null_until_started() {
        let clock = ManualClock::new(T0);
        let runtime = TimerRuntime::spawn(parts(&clock, &MemoryStore::new()), Config::default());
        let handle = runtime.handle();

        assert_eq!(handle.request(Command::GetTime).await.unwrap(), None);
        assert_eq!(
            handle
                .request_json(r#"{"action":"GET_TIME"}"#)
                .await
                .unwrap()
                .as_deref(),
            Some("null")
        );

        handle.request(Command::start(10, 0)).await.unwrap();
        let snapshot = handle.request(Command::GetTime).await.unwrap().unwrap();
        assert_eq!(snapshot.remaining_secs(), 600);
        assert!(snapshot.is_running);

        runtime.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_push_updates_and_complete() {
        let clock = ManualClock::new(T0);
        let store = MemoryStore::new();
        let runtime = TimerRuntime::spawn(parts(&clock, &store), Config::default());
        let handle = runtime.handle();
        let mut pushes = handle.subscribe();

        handle.request(Command::start(0, 3)).await.unwrap();
        drive(&clock, 5).await;

        let mut seen = Vec::new();
        while let Ok(push) = pushes.try_recv() {
            seen.push(push);
        }
        assert!(seen.contains(&Push::ShowBreakSelection {
            suggested_break_minutes: 5
        }));
        let breaks = seen
            .iter()
            .filter(|p| matches!(p, Push::ShowBreakSelection { .. }))
            .count();
        assert_eq!(breaks, 1);

        let state = runtime.shutdown().await.unwrap();
        assert!(!state.running);
        assert_eq!(state.suggested_break_minutes, Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_json_is_dropped() {
        let clock = ManualClock::new(T0);
        let runtime = TimerRuntime::spawn(parts(&clock, &MemoryStore::new()), Config::default());
        let handle = runtime.handle();
        assert_eq!(handle.request_json("{nope").await.unwrap(), None);
        assert_eq!(
            handle
                .request_json(r#"{"action":"DANCE"}"#)
                .await
                .unwrap(),
            None
        );
        assert!(handle.request(Command::GetTime).await.is_ok());
        runtime.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resumes_from_store() {
        let clock = ManualClock::new(T0);
        let store = MemoryStore::new();
        let badge = RecordingBadge::new();

        let first = TimerRuntime::spawn(parts(&clock, &store), Config::default());
        first.handle().request(Command::start(1, 0)).await.unwrap();
        first.shutdown().await.unwrap();

        clock.advance_secs(20);
        let mut host = parts(&clock, &store);
        host.badge = Box::new(badge.clone());
        let second = TimerRuntime::spawn(host, Config::default());
        let snapshot = second
            .handle()
            .request(Command::GetTime)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.remaining_secs(), 40);
        assert_eq!(badge.text(), "40s");
        second.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn handle_errors_after_shutdown() {
        let clock = ManualClock::new(T0);
        let runtime = TimerRuntime::spawn(parts(&clock, &MemoryStore::new()), Config::default());
        let handle = runtime.handle();
        runtime.shutdown().await.unwrap();
        assert!(matches!(
            handle.request(Command::GetTime).await,
            Err(CoreError::ServiceStopped)
        ));
    }
}
