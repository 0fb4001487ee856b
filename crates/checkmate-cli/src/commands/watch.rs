//! Foreground session: the service runs on a tokio runtime with real
//! wake-ups, and a [`TimerView`] renders it on one terminal line.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use checkmate_core::timer::{Clock, SystemClock};
use checkmate_core::{
    Command, Config, HostParts, Push, SqliteStore, TimerRuntime, TimerView,
};
use tokio::sync::broadcast::error::RecvError;

use super::CliResult;
use crate::terminal::{TerminalNotifier, TitleBadge};

const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

pub fn run(auto_break: bool) -> CliResult {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch(auto_break))
}

async fn watch(auto_break: bool) -> CliResult {
    let config = Config::load()?;
    let clock = Arc::new(SystemClock);
    let timer = TimerRuntime::spawn(
        HostParts {
            store: Box::new(SqliteStore::open()?),
            notifier: Box::new(TerminalNotifier),
            badge: Box::new(TitleBadge),
            clock: clock.clone(),
        },
        config.clone(),
    );
    let handle = timer.handle();
    let mut pushes = handle.subscribe();

    let mut view = TimerView::new(&config.timer);
    view.open(handle.request(Command::GetTime).await?);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            push = pushes.recv() => match push {
                Ok(push) => {
                    view.apply(&push);
                    if auto_break && matches!(push, Push::ShowBreakSelection { .. }) {
                        handle.send(view.confirm_break(clock.now_ms()))?;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "view fell behind, resyncing");
                    view.open(handle.request(Command::GetTime).await?);
                }
                Err(RecvError::Closed) => break,
            },
            _ = redraw.tick() => render(&view, clock.now_ms())?,
        }
    }

    println!();
    timer.shutdown().await?;
    Ok(())
}

fn render(view: &TimerView, now_ms: i64) -> std::io::Result<()> {
    let frame = view.frame(now_ms);
    let status = match (frame.in_break, frame.break_prompt) {
        (true, _) => "break".to_string(),
        (false, Some(minutes)) => format!("take a {minutes}-minute break: checkmate timer break-start"),
        (false, None) if view.is_running() => "focus".to_string(),
        (false, None) => format!("[{}]", frame.primary.label()),
    };
    let mut stdout = std::io::stdout();
    write!(stdout, "\r\x1b[2K{frame}  {status}")?;
    stdout.flush()
}
