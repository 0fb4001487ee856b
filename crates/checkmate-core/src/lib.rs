//! # Checkmate Core Library
//!
//! Core logic for the Checkmate focus timer. The `checkmate` CLI is a thin
//! layer over this crate; any other front-end is expected to be as well.
//!
//! ## Architecture
//!
//! - **Timer service**: a wall-clock-based state machine. Elapsed time is
//!   always `now - start`, so a suspended host loses nothing; the host only
//!   has to deliver periodic wake-ups.
//! - **View reducer**: mirrors service pushes and turns user intents into
//!   protocol commands, with no timer logic of its own.
//! - **Host**: the traits through which the service persists, schedules,
//!   notifies, badges and broadcasts.
//! - **Storage**: JSON key-value state (in memory or SQLite) and TOML
//!   configuration.
//!
//! ## Key Components
//!
//! - [`TimerService`]: authoritative timer state machine
//! - [`TimerView`]: display reducer for a transient view
//! - [`TimerRuntime`]: tokio task that owns a service
//! - [`Command`] / [`Push`]: the JSON message protocol
//! - [`Config`]: application configuration

pub mod error;
pub mod host;
pub mod protocol;
pub mod runtime;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;
pub mod view;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use host::{Host, Notification};
pub use protocol::{Command, Push};
pub use runtime::{HostParts, TimerHandle, TimerRuntime};
pub use stats::FocusInsights;
pub use storage::{Config, FocusSessionRecord, MemoryStore, SqliteStore, StateStore};
pub use task::{Task, TaskList};
pub use timer::{BreakPolicy, Completion, DisplaySnapshot, Phase, TimerService, TimerState};
pub use view::{Frame, PrimaryAction, TimerView};
