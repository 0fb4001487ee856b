//! Display reducer for a transient timer view (a popup, a terminal pane).
//!
//! The view owns no timer logic. It mirrors the last snapshot the service
//! sent, turns user intents into [`Command`]s, and only changes its notion of
//! "running" when the service echoes a change back. The one local exception is
//! picking a new preset while running: the view stops itself optimistically
//! and emits `STOP_TIMER` in the same breath.

use std::fmt;

use crate::error::ValidationError;
use crate::protocol::{Command, Push};
use crate::storage::TimerConfig;
use crate::timer::DisplaySnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
    Start,
    Resume,
    Pause,
}

impl PrimaryAction {
    pub fn label(self) -> &'static str {
        match self {
            PrimaryAction::Start => "Start",
            PrimaryAction::Resume => "Resume",
            PrimaryAction::Pause => "Pause",
        }
    }
}

/// What to draw at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub minutes: u64,
    pub seconds: u64,
    pub primary: PrimaryAction,
    pub in_break: bool,
    /// Break length to offer when a focus session just ended.
    pub break_prompt: Option<u32>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

#[derive(Debug, Clone)]
pub struct TimerView {
    minutes: u64,
    seconds: u64,
    is_running: bool,
    is_break_time: bool,
    /// The service holds a stopped run that an argument-less start resumes.
    resumable: bool,
    /// A preset was picked mid-run; the stop echo must not replace it.
    awaiting_stop: bool,
    selected_minutes: u32,
    suggested_break: Option<u32>,
    break_started_at_ms: Option<i64>,
    min_minutes: u32,
    max_minutes: u32,
}

impl TimerView {
    pub fn new(config: &TimerConfig) -> Self {
        let selected = config.default_focus_minutes;
        Self {
            minutes: u64::from(selected),
            seconds: 0,
            is_running: false,
            is_break_time: false,
            resumable: false,
            awaiting_stop: false,
            selected_minutes: selected,
            suggested_break: None,
            break_started_at_ms: None,
            min_minutes: config.min_custom_minutes,
            max_minutes: config.max_custom_minutes,
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_break_time(&self) -> bool {
        self.is_break_time
    }

    pub fn selected_minutes(&self) -> u32 {
        self.selected_minutes
    }

    pub fn suggested_break(&self) -> Option<u32> {
        self.suggested_break
    }

    // ── Inbound ──────────────────────────────────────────────────────

    /// Sync with the `GET_TIME` reply sent when the view opens. `None` means
    /// the timer was never started.
    pub fn open(&mut self, snapshot: Option<DisplaySnapshot>) {
        self.awaiting_stop = false;
        match snapshot {
            Some(snapshot) => self.mirror(&snapshot),
            None => self.show_selected(),
        }
    }

    pub fn apply(&mut self, push: &Push) {
        match push {
            Push::TimeUpdated(snapshot) => self.mirror(snapshot),
            Push::ShowBreakSelection {
                suggested_break_minutes,
            } => {
                // The run finished before any stop echo; nothing is pending.
                self.awaiting_stop = false;
                self.suggested_break = Some(*suggested_break_minutes);
                self.is_running = false;
                self.is_break_time = false;
                self.resumable = false;
                self.minutes = 0;
                self.seconds = 0;
            }
        }
    }

    fn mirror(&mut self, snapshot: &DisplaySnapshot) {
        if self.awaiting_stop {
            if !snapshot.is_running {
                self.awaiting_stop = false;
            }
            return;
        }
        let fresh = !snapshot.is_running
            && !snapshot.is_break_time
            && snapshot.suggested_break_minutes.is_none()
            && snapshot.remaining_secs() == 0;
        if fresh {
            self.show_selected();
            return;
        }

        self.minutes = snapshot.minutes;
        self.seconds = snapshot.seconds;
        self.is_running = snapshot.is_running;
        self.is_break_time = snapshot.is_break_time;
        self.suggested_break = snapshot.suggested_break_minutes;
        self.resumable = !snapshot.is_running
            && snapshot.suggested_break_minutes.is_none()
            && snapshot.remaining_secs() > 0;
        if !snapshot.is_break_time {
            self.break_started_at_ms = None;
        }
    }

    fn show_selected(&mut self) {
        self.minutes = u64::from(self.selected_minutes);
        self.seconds = 0;
        self.is_running = false;
        self.is_break_time = false;
        self.resumable = false;
        self.suggested_break = None;
        self.break_started_at_ms = None;
    }

    // ── Outbound ─────────────────────────────────────────────────────

    /// The start/pause button.
    pub fn toggle(&self) -> Command {
        if self.is_running {
            Command::StopTimer
        } else if self.resumable {
            Command::resume()
        } else {
            Command::start(self.selected_minutes, 0)
        }
    }

    pub fn reset(&self) -> Command {
        Command::ResetTimer
    }

    /// Pick a preset length. Returns `STOP_TIMER` when a run was in progress.
    ///
    /// # Errors
    /// Returns [`ValidationError::OutOfRange`] for lengths outside the
    /// configured bounds; nothing changes in that case.
    pub fn select_preset(&mut self, minutes: u32) -> Result<Option<Command>, ValidationError> {
        self.check_minutes(i64::from(minutes))?;
        let was_running = self.is_running;
        self.selected_minutes = minutes;
        self.show_selected();
        self.awaiting_stop = was_running;
        Ok(was_running.then_some(Command::StopTimer))
    }

    /// Free-form minutes typed by the user.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] when the input is not a whole number or
    /// is out of range.
    pub fn set_custom_minutes(&mut self, raw: &str) -> Result<Option<Command>, ValidationError> {
        let minutes: i64 = raw
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidValue {
                field: "minutes".into(),
                message: format!("'{}' is not a whole number", raw.trim()),
            })?;
        self.check_minutes(minutes)?;
        self.select_preset(minutes as u32)
    }

    /// The user accepted the suggested break at `now_ms`.
    pub fn confirm_break(&mut self, now_ms: i64) -> Command {
        self.awaiting_stop = false;
        self.break_started_at_ms = Some(now_ms);
        self.suggested_break = None;
        Command::StartBreak { start_time: now_ms }
    }

    pub fn stop_break(&mut self) -> Command {
        self.break_started_at_ms = None;
        Command::StopBreak
    }

    fn check_minutes(&self, minutes: i64) -> Result<(), ValidationError> {
        if minutes < i64::from(self.min_minutes) || minutes > i64::from(self.max_minutes) {
            return Err(ValidationError::OutOfRange {
                field: "minutes".into(),
                min: self.min_minutes.into(),
                max: self.max_minutes.into(),
                value: minutes,
            });
        }
        Ok(())
    }

    // ── Render ───────────────────────────────────────────────────────

    /// During a break the clock counts up from the break start this view
    /// confirmed; otherwise it shows the mirrored remaining time.
    pub fn frame(&self, now_ms: i64) -> Frame {
        let (minutes, seconds) = match (self.is_break_time, self.break_started_at_ms) {
            (true, Some(started)) => {
                let elapsed = (now_ms.saturating_sub(started).max(0) / 1000) as u64;
                (elapsed / 60, elapsed % 60)
            }
            _ => (self.minutes, self.seconds),
        };
        let primary = if self.is_running {
            PrimaryAction::Pause
        } else if self.resumable {
            PrimaryAction::Resume
        } else {
            PrimaryAction::Start
        };
        Frame {
            minutes,
            seconds,
            primary,
            in_break: self.is_break_time,
            break_prompt: self.suggested_break,
        }
    }
}
