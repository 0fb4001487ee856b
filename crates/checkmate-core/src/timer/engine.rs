//! Timer service implementation.
//!
//! The service is a wall-clock-based state machine. It owns no threads: the
//! host routes commands to [`TimerService::handle`] and wake-ups to
//! [`TimerService::on_wake`], one at a time.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> RunningFocus -> (Paused | BreakSuggested)
//! BreakSuggested -> RunningBreak -> Idle
//! ```
//!
//! Every mutation is persisted before it is broadcast.
//!
//! ## Usage
//!
//! ```ignore
//! let mut service = TimerService::boot(host, config);
//! service.handle(Command::start(25, 0));
//! // On every "timer" wake-up:
//! service.on_wake(TICK_SCHEDULE);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::state::{DisplaySnapshot, Phase, TimerState};
use crate::host::{Delivery, Host, Notification, BADGE_SCHEDULE, TICK_SCHEDULE};
use crate::protocol::{Command, Push};
use crate::storage::{keys, session_log, Config, FocusSessionRecord};

/// What a tick finished, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Completion {
    Focus {
        focus_minutes: u32,
        break_minutes: u32,
    },
    Break,
}

/// Owns the authoritative [`TimerState`] and every collaborator.
pub struct TimerService {
    state: TimerState,
    host: Host,
    config: Config,
}

impl TimerService {
    /// Load the persisted snapshot (defaults when absent or malformed), then
    /// register the badge wake-up and, if a run was in progress, the tick.
    pub fn boot(host: Host, config: Config) -> Self {
        let state = load_state(&host);
        let mut service = Self {
            state,
            host,
            config,
        };
        service
            .host
            .scheduler
            .register(BADGE_SCHEDULE, service.config.timer.badge_interval());
        if service.state.running {
            info!(phase = ?service.state.phase(), "resuming run from stored state");
            service.schedule_tick();
        }
        service.refresh_badge();
        service
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn now_ms(&self) -> i64 {
        self.host.clock.now_ms()
    }

    /// Snapshot for `GET_TIME`. `None` means the timer was never started
    /// (or was reset) and the view should show its own default.
    pub fn current_snapshot(&self) -> Option<DisplaySnapshot> {
        let fresh = !self.state.running
            && self.state.started_at_ms.is_none()
            && self.state.suggested_break_minutes.is_none();
        if fresh {
            return None;
        }
        Some(self.snapshot())
    }

    fn snapshot(&self) -> DisplaySnapshot {
        self.state.snapshot_at(self.now_ms())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply one inbound message. Only `GET_TIME` produces a reply.
    pub fn handle(&mut self, command: Command) -> Option<DisplaySnapshot> {
        match command {
            Command::StartTimer { minutes, seconds } => {
                let duration = minutes.map(|m| {
                    (
                        clamp_non_negative(m),
                        clamp_non_negative(seconds.unwrap_or(0)),
                    )
                });
                self.start(duration);
                None
            }
            Command::StopTimer => {
                self.stop();
                None
            }
            Command::ResetTimer => {
                self.reset();
                None
            }
            Command::GetTime => self.current_snapshot(),
            Command::StartBreak { start_time } => {
                self.start_break(start_time);
                None
            }
            Command::StopBreak => {
                self.stop_break();
                None
            }
        }
    }

    /// Wire entry point. Malformed messages are logged and dropped. Returns the
    /// serialized reply for commands that expect one (`null` included).
    pub fn handle_json(&mut self, raw: &str) -> Option<String> {
        let command = match Command::from_json(raw) {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, "ignoring malformed message");
                return None;
            }
        };
        let expects_reply = command.expects_reply();
        let reply = self.handle(command);
        if !expects_reply {
            return None;
        }
        serde_json::to_string(&reply)
            .map_err(|e| warn!(error = %e, "failed to encode reply"))
            .ok()
    }

    /// Route a named wake-up from the scheduler.
    pub fn on_wake(&mut self, name: &str) -> Option<Completion> {
        match name {
            TICK_SCHEDULE => self.tick(),
            BADGE_SCHEDULE => {
                self.refresh_badge();
                None
            }
            other => {
                debug!(schedule = other, "ignoring unknown wake-up");
                None
            }
        }
    }

    /// Start a fresh run with `(minutes, seconds)`, or with `None` resume a
    /// paused run / start the default focus length. Ignored while running.
    pub fn start(&mut self, duration: Option<(u64, u64)>) {
        if self.state.running {
            debug!("start ignored: already running");
            return;
        }
        let now = self.now_ms();

        match duration {
            Some((minutes, seconds)) => self.begin_focus(minutes, seconds, now),
            None if self.state.phase() == Phase::Paused => {
                info!(remaining_secs = self.state.total_seconds, "resuming");
                self.state.started_at_ms = Some(now);
                self.state.running = true;
            }
            None => {
                let minutes = u64::from(self.config.timer.default_focus_minutes);
                self.begin_focus(minutes, 0, now);
            }
        }

        self.schedule_tick();
        self.commit();
    }

    /// Freeze the clock. The remaining time becomes the new total so a later
    /// argument-less start resumes exactly where this left off.
    pub fn stop(&mut self) {
        if !self.state.running {
            debug!("stop ignored: not running");
            return;
        }
        let now = self.now_ms();
        let remaining = self.state.remaining_secs(now);
        if remaining == 0 {
            // The run expired between ticks; it finished, it was not paused.
            info!("stop after expiry, completing");
            self.complete();
            return;
        }
        self.state.total_seconds = remaining;
        self.state.started_at_ms = Some(now);
        self.state.running = false;
        info!(remaining_secs = remaining, "stopped");

        self.cancel_tick();
        self.commit();
    }

    pub fn reset(&mut self) {
        self.state = TimerState {
            original_focus_minutes: self.state.original_focus_minutes,
            ..TimerState::default()
        };
        info!("reset");

        self.cancel_tick();
        self.commit();
    }

    /// Begin a break at the instant the user confirmed it.
    pub fn start_break(&mut self, started_at_ms: i64) {
        let break_minutes = self.state.suggested_break_minutes.unwrap_or_else(|| {
            self.config
                .break_policy
                .break_minutes(self.state.original_focus_minutes.max(1))
        });
        self.state.is_break_time = true;
        self.state.running = true;
        self.state.started_at_ms = Some(started_at_ms);
        self.state.total_seconds = u64::from(break_minutes) * 60;
        self.state.suggested_break_minutes = None;
        info!(break_minutes, "break started");

        self.schedule_tick();
        self.commit();
    }

    /// Leave break mode. Outside a break this changes nothing.
    pub fn stop_break(&mut self) {
        if !self.state.is_break_time {
            debug!("stop_break ignored: not in a break");
            return;
        }
        self.state = TimerState {
            original_focus_minutes: self.state.original_focus_minutes,
            ..TimerState::default()
        };
        info!("break stopped");

        self.cancel_tick();
        self.commit();
    }

    /// Call on every tick wake-up. Returns `Some` exactly once per finished run.
    pub fn tick(&mut self) -> Option<Completion> {
        if !self.state.running {
            return None;
        }
        if self.state.remaining_secs(self.now_ms()) == 0 {
            return Some(self.complete());
        }
        self.broadcast(&Push::TimeUpdated(self.snapshot()));
        self.refresh_badge();
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_focus(&mut self, minutes: u64, seconds: u64, now: i64) {
        let total = minutes.saturating_mul(60).saturating_add(seconds);
        self.state = TimerState {
            running: true,
            started_at_ms: Some(now),
            total_seconds: total,
            is_break_time: false,
            original_focus_minutes: u32::try_from(minutes).unwrap_or(u32::MAX),
            suggested_break_minutes: None,
        };
        info!(total_secs = total, "focus started");
    }

    fn complete(&mut self) -> Completion {
        // Cleared first so a re-entrant or late tick cannot complete twice.
        self.state.running = false;
        self.cancel_tick();

        if self.state.is_break_time {
            info!("break finished");
            self.reset();
            self.notify("Break time's over!", "Ready to start another focus session?");
            return Completion::Break;
        }

        let focus_minutes = self.state.original_focus_minutes;
        let break_minutes = self.config.break_policy.break_minutes(focus_minutes.max(1));
        // Runs shorter than a whole minute earn a break but no log entry.
        if focus_minutes > 0 {
            self.log_focus_session(focus_minutes);
        }

        self.state.started_at_ms = None;
        self.state.total_seconds = 0;
        self.state.suggested_break_minutes = Some(break_minutes);
        info!(focus_minutes, break_minutes, "focus session finished");

        self.persist();
        self.notify(
            "Time's up!",
            &format!("Great work! You can now take a {break_minutes}-minute break."),
        );
        self.broadcast(&Push::ShowBreakSelection {
            suggested_break_minutes: break_minutes,
        });
        self.refresh_badge();

        Completion::Focus {
            focus_minutes,
            break_minutes,
        }
    }

    fn log_focus_session(&mut self, focus_minutes: u32) {
        let now = self.now_utc();
        let record = FocusSessionRecord::new(now, focus_minutes);
        let retention = self.config.retention();
        match session_log::append(self.host.store.as_mut(), record, now, retention) {
            Ok(stored) => debug!(stored, "focus session logged"),
            Err(e) => warn!(error = %e, "failed to log focus session"),
        }
    }

    /// Persist, broadcast the new snapshot, refresh the badge.
    fn commit(&mut self) {
        self.persist();
        self.broadcast(&Push::TimeUpdated(self.snapshot()));
        self.refresh_badge();
    }

    fn persist(&mut self) {
        let entries = match serde_json::to_value(&self.state) {
            Ok(serde_json::Value::Object(entries)) => entries,
            Ok(_) => return,
            Err(e) => {
                warn!(error = %e, "failed to encode timer state");
                return;
            }
        };
        if let Err(e) = self.host.store.set(entries) {
            warn!(error = %e, "failed to persist timer state");
        }
    }

    fn broadcast(&self, push: &Push) {
        match self.host.broadcaster.broadcast(push) {
            Delivery::Delivered(n) => debug!(receivers = n, "push delivered"),
            Delivery::NoListener => debug!("no view listening"),
        }
    }

    fn notify(&self, title: &str, message: &str) {
        if !self.config.notifications.enabled {
            return;
        }
        self.host.notifier.notify(&Notification {
            title: title.to_string(),
            message: message.to_string(),
            priority: self.config.notifications.priority,
        });
    }

    fn refresh_badge(&mut self) {
        let (text, color) = badge_for(&self.state, self.now_ms(), &self.config);
        self.host.badge.set_badge(&text, color);
    }

    fn schedule_tick(&mut self) {
        let period = self.config.timer.tick_interval();
        self.host.scheduler.register(TICK_SCHEDULE, period);
    }

    fn cancel_tick(&mut self) {
        self.host.scheduler.cancel(TICK_SCHEDULE);
    }

    fn now_utc(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.now_ms()).unwrap_or_else(Utc::now)
    }
}

fn load_state(host: &Host) -> TimerState {
    let entries = match host.store.get(&keys::TIMER) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "could not read timer state, starting fresh");
            return TimerState::default();
        }
    };
    if entries.is_empty() {
        return TimerState::default();
    }
    match serde_json::from_value::<TimerState>(serde_json::Value::Object(entries)) {
        Ok(state) => state.sanitize(),
        Err(e) => {
            warn!(error = %e, "stored timer state is malformed, starting fresh");
            TimerState::default()
        }
    }
}

fn clamp_non_negative(value: i64) -> u64 {
    value.max(0) as u64
}

/// Badge text and colour for a state: minutes left (seconds in the last
/// minute) while running, `||` when paused, `brk` while a break waits.
pub fn badge_for<'a>(state: &TimerState, now_ms: i64, config: &'a Config) -> (String, &'a str) {
    let badge = &config.badge;
    match state.phase() {
        Phase::RunningFocus | Phase::RunningBreak => {
            let remaining = state.remaining_secs(now_ms);
            let text = if remaining >= 60 {
                format!("{}m", remaining / 60)
            } else {
                format!("{remaining}s")
            };
            let color = if state.is_break_time {
                badge.break_color.as_str()
            } else {
                badge.focus_color.as_str()
            };
            (text, color)
        }
        Phase::Paused => ("||".to_string(), badge.paused_color.as_str()),
        Phase::BreakSuggested => ("brk".to_string(), badge.break_color.as_str()),
        Phase::Idle => (String::new(), badge.paused_color.as_str()),
    }
}
