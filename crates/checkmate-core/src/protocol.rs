//! Messages exchanged between the timer service and its views.
//!
//! Every message is a JSON object discriminated by `action`. Views send
//! [`Command`]s; the service pushes [`Push`]es to whoever is listening.

use serde::{Deserialize, Serialize};

use crate::timer::DisplaySnapshot;

/// View → service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Start a fresh run when `minutes` is given, otherwise resume or start
    /// the default focus length. Negative values are clamped to zero.
    StartTimer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minutes: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seconds: Option<i64>,
    },
    StopTimer,
    ResetTimer,
    /// Answered with a [`DisplaySnapshot`] or `null` when never started.
    GetTime,
    StartBreak {
        /// Epoch milliseconds at which the user confirmed the break.
        #[serde(rename = "startTime")]
        start_time: i64,
    },
    StopBreak,
}

impl Command {
    pub fn start(minutes: u32, seconds: u32) -> Self {
        Command::StartTimer {
            minutes: Some(minutes.into()),
            seconds: Some(seconds.into()),
        }
    }

    pub fn resume() -> Self {
        Command::StartTimer {
            minutes: None,
            seconds: None,
        }
    }

    /// Whether the sender waits for a response.
    pub fn expects_reply(&self) -> bool {
        matches!(self, Command::GetTime)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Service → views. Delivery is best effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Push {
    TimeUpdated(DisplaySnapshot),
    ShowBreakSelection {
        #[serde(rename = "suggestedBreakMinutes")]
        suggested_break_minutes: u32,
    },
}

impl Push {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_start_with_duration() {
        let cmd = Command::from_json(r#"{"action":"START_TIMER","minutes":25,"seconds":0}"#)
            .unwrap();
        assert_eq!(cmd, Command::start(25, 0));
    }

    #[test]
    fn parses_start_without_duration() {
        let cmd = Command::from_json(r#"{"action":"START_TIMER"}"#).unwrap();
        assert_eq!(cmd, Command::resume());
    }

    #[test]
    fn unit_commands_ignore_extra_fields() {
        let cmd = Command::from_json(r#"{"action":"STOP_TIMER","from":"popup"}"#).unwrap();
        assert_eq!(cmd, Command::StopTimer);
    }

    #[test]
    fn start_break_uses_camel_case_field() {
        let value = serde_json::to_value(Command::StartBreak { start_time: 7 }).unwrap();
        assert_eq!(value, json!({ "action": "START_BREAK", "startTime": 7 }));
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(Command::from_json(r#"{"action":"EXPLODE"}"#).is_err());
    }

    #[test]
    fn only_get_time_expects_reply() {
        assert!(Command::GetTime.expects_reply());
        assert!(!Command::StopBreak.expects_reply());
    }

    #[test]
    fn time_updated_inlines_snapshot_fields() {
        let push = Push::TimeUpdated(DisplaySnapshot::from_remaining(90, true, false));
        let value: serde_json::Value = serde_json::from_str(&push.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "action": "TIME_UPDATED",
                "minutes": 1,
                "seconds": 30,
                "isRunning": true,
                "isBreakTime": false
            })
        );
    }

    #[test]
    fn break_selection_wire_shape() {
        let push = Push::ShowBreakSelection {
            suggested_break_minutes: 10,
        };
        assert_eq!(
            serde_json::to_value(&push).unwrap(),
            json!({ "action": "SHOW_BREAK_SELECTION", "suggestedBreakMinutes": 10 })
        );
    }
}
