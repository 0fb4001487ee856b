use std::sync::Arc;

use clap::Subcommand;
use checkmate_core::host::{Host, NoopBadge, NoopScheduler};
use checkmate_core::timer::SystemClock;
use checkmate_core::{Command, Config, SqliteStore, TimerService, ValidationError};

use super::CliResult;
use crate::terminal::{SilentBroadcaster, TerminalNotifier};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a focus session; without arguments resume a paused one
    Start {
        /// Minutes
        #[arg(short, long)]
        minutes: Option<u32>,
        /// Extra seconds
        #[arg(short, long)]
        seconds: Option<u32>,
    },
    /// Pause the running session
    Stop,
    /// Reset to idle
    Reset,
    /// Print the current snapshot as JSON (`null` when idle)
    Status,
    /// Advance the timer; completes a finished session
    Tick,
    /// Start the suggested break now
    BreakStart,
    /// Leave the current break
    BreakStop,
}

/// Boot a service with no wake-ups. Each invocation catches up with a
/// single tick, which is enough because elapsed time comes from the clock.
fn boot(config: Config) -> checkmate_core::error::Result<TimerService> {
    let host = Host {
        store: Box::new(SqliteStore::open()?),
        scheduler: Box::new(NoopScheduler),
        notifier: Box::new(TerminalNotifier),
        badge: Box::new(NoopBadge),
        broadcaster: Box::new(SilentBroadcaster),
        clock: Arc::new(SystemClock),
    };
    Ok(TimerService::boot(host, config))
}

fn start_command(
    config: &Config,
    minutes: Option<u32>,
    seconds: Option<u32>,
) -> Result<Command, Box<dyn std::error::Error>> {
    match (minutes, seconds) {
        (None, None) => Ok(Command::resume()),
        (minutes, seconds) => {
            let seconds = seconds.unwrap_or(0);
            let minutes = minutes.unwrap_or(0);
            if seconds > 59 {
                return Err(ValidationError::OutOfRange {
                    field: "seconds".into(),
                    min: 0,
                    max: 59,
                    value: seconds.into(),
                }
                .into());
            }
            // A seconds-only run may have zero minutes.
            if minutes > 0 || seconds == 0 {
                config.timer.validate_minutes(i64::from(minutes))?;
            }
            Ok(Command::start(minutes, seconds))
        }
    }
}

pub fn run(action: TimerAction) -> CliResult {
    let mut service = boot(Config::load()?)?;
    let completion = service.tick();

    let command = match action {
        TimerAction::Start { minutes, seconds } => {
            Some(start_command(service.config(), minutes, seconds)?)
        }
        TimerAction::Stop => Some(Command::StopTimer),
        TimerAction::Reset => Some(Command::ResetTimer),
        TimerAction::BreakStart => Some(Command::StartBreak {
            start_time: service.now_ms(),
        }),
        TimerAction::BreakStop => Some(Command::StopBreak),
        TimerAction::Tick => {
            if let Some(completion) = completion {
                println!("{}", serde_json::to_string_pretty(&completion)?);
                return Ok(());
            }
            None
        }
        TimerAction::Status => None,
    };

    if let Some(command) = command {
        service.handle(command);
    }
    println!("{}", serde_json::to_string_pretty(&service.current_snapshot())?);
    Ok(())
}
