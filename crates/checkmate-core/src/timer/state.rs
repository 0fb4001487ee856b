//! Authoritative timer state and its display projection.
//!
//! `TimerState` serializes to exactly the persisted key set (`isRunning`,
//! `startTime`, ...), so the same struct is both the in-memory state and the
//! stored snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Never started, or reset.
    Idle,
    /// Stopped mid-run with time left on the frozen clock.
    Paused,
    RunningFocus,
    RunningBreak,
    /// A focus session finished and a break is waiting for confirmation.
    BreakSuggested,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerState {
    #[serde(rename = "isRunning")]
    pub running: bool,
    #[serde(rename = "startTime")]
    pub started_at_ms: Option<i64>,
    #[serde(rename = "totalSeconds")]
    pub total_seconds: u64,
    #[serde(rename = "isBreakTime")]
    pub is_break_time: bool,
    #[serde(rename = "originalTime")]
    pub original_focus_minutes: u32,
    #[serde(rename = "suggestedBreak")]
    pub suggested_break_minutes: Option<u32>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            running: false,
            started_at_ms: None,
            total_seconds: 0,
            is_break_time: false,
            original_focus_minutes: 25,
            suggested_break_minutes: None,
        }
    }
}

impl TimerState {
    pub fn phase(&self) -> Phase {
        match (self.running, self.is_break_time) {
            (true, false) => Phase::RunningFocus,
            (true, true) => Phase::RunningBreak,
            (false, _) if self.suggested_break_minutes.is_some() => Phase::BreakSuggested,
            (false, _) if self.started_at_ms.is_some() && self.total_seconds > 0 => Phase::Paused,
            (false, _) => Phase::Idle,
        }
    }

    /// Whole seconds elapsed on the running clock, floored. Zero when stopped.
    pub fn elapsed_secs(&self, now_ms: i64) -> u64 {
        match (self.running, self.started_at_ms) {
            (true, Some(started)) => (now_ms.saturating_sub(started).max(0) / 1000) as u64,
            _ => 0,
        }
    }

    /// Seconds left in the current run, never negative.
    pub fn remaining_secs(&self, now_ms: i64) -> u64 {
        self.total_seconds
            .saturating_sub(self.elapsed_secs(now_ms))
    }

    pub fn snapshot_at(&self, now_ms: i64) -> DisplaySnapshot {
        DisplaySnapshot::from_remaining(
            self.remaining_secs(now_ms),
            self.running,
            self.is_break_time,
        )
        .with_suggested_break(self.suggested_break_minutes)
    }

    /// Repair combinations that cannot occur through commands, such as a
    /// running flag without a start instant.
    pub fn sanitize(mut self) -> Self {
        if self.running && self.started_at_ms.is_none() {
            self.running = false;
        }
        self
    }
}

/// Remaining-time projection of [`TimerState`] at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySnapshot {
    pub minutes: u64,
    pub seconds: u64,
    pub is_running: bool,
    pub is_break_time: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_break_minutes: Option<u32>,
}

impl DisplaySnapshot {
    pub fn from_remaining(remaining_secs: u64, is_running: bool, is_break_time: bool) -> Self {
        Self {
            minutes: remaining_secs / 60,
            seconds: remaining_secs % 60,
            is_running,
            is_break_time,
            suggested_break_minutes: None,
        }
    }

    pub fn with_suggested_break(mut self, minutes: Option<u32>) -> Self {
        self.suggested_break_minutes = minutes;
        self
    }

    pub fn remaining_secs(&self) -> u64 {
        self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for DisplaySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}
