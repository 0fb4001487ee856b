//! Integration tests for the timer service driven through its public API:
//! wire messages in, pushes and stored state out.

use std::sync::Arc;

use checkmate_core::host::{
    RecordingBadge, RecordingBroadcaster, RecordingNotifier, RecordingScheduler, TICK_SCHEDULE,
};
use checkmate_core::storage::{keys, session_log};
use checkmate_core::timer::{Clock, ManualClock};
use checkmate_core::{
    Command, Completion, Config, Host, MemoryStore, Phase, Push, SqliteStore, StateStore,
    TimerService, TimerView,
};
use proptest::prelude::*;

const T0: i64 = 1_700_000_000_000;

struct Rig {
    service: TimerService,
    clock: ManualClock,
    store: MemoryStore,
    scheduler: RecordingScheduler,
    notifier: RecordingNotifier,
    broadcaster: RecordingBroadcaster,
}

fn rig_with(store: MemoryStore, clock: ManualClock) -> Rig {
    let scheduler = RecordingScheduler::new();
    let notifier = RecordingNotifier::new();
    let broadcaster = RecordingBroadcaster::new();
    let host = Host {
        store: Box::new(store.clone()),
        scheduler: Box::new(scheduler.clone()),
        notifier: Box::new(notifier.clone()),
        badge: Box::new(RecordingBadge::new()),
        broadcaster: Box::new(broadcaster.clone()),
        clock: Arc::new(clock.clone()),
    };
    Rig {
        service: TimerService::boot(host, Config::default()),
        clock,
        store,
        scheduler,
        notifier,
        broadcaster,
    }
}

fn rig() -> Rig {
    rig_with(MemoryStore::new(), ManualClock::new(T0))
}

/// Advance one second at a time, delivering a tick wake-up whenever the
/// schedule is active, and collect completions.
fn run_for(rig: &mut Rig, seconds: u64) -> Vec<Completion> {
    let mut completions = Vec::new();
    for _ in 0..seconds {
        rig.clock.advance_secs(1);
        if rig.scheduler.is_active(TICK_SCHEDULE) {
            completions.extend(rig.service.on_wake(TICK_SCHEDULE));
        }
    }
    completions
}

#[test]
fn test_full_focus_and_break_cycle_over_the_wire() {
    let mut rig = rig();

    assert_eq!(
        rig.service.handle_json(r#"{"action":"GET_TIME"}"#).as_deref(),
        Some("null")
    );
    assert_eq!(
        rig.service
            .handle_json(r#"{"action":"START_TIMER","minutes":0,"seconds":5}"#),
        None
    );

    let completions = run_for(&mut rig, 10);
    assert_eq!(
        completions,
        vec![Completion::Focus {
            focus_minutes: 0,
            break_minutes: 5
        }]
    );
    assert_eq!(rig.service.phase(), Phase::BreakSuggested);
    assert_eq!(rig.notifier.sent()[0].title, "Time's up!");

    let reply = rig
        .service
        .handle_json(r#"{"action":"GET_TIME"}"#)
        .unwrap();
    let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(reply["suggestedBreakMinutes"], 5);
    assert_eq!(reply["isRunning"], false);

    let confirm = format!(r#"{{"action":"START_BREAK","startTime":{}}}"#, rig.clock.now_ms());
    rig.service.handle_json(&confirm);
    assert_eq!(rig.service.phase(), Phase::RunningBreak);

    let completions = run_for(&mut rig, 5 * 60 + 2);
    assert_eq!(completions, vec![Completion::Break]);
    assert_eq!(rig.service.phase(), Phase::Idle);
    assert_eq!(
        rig.notifier.sent().last().unwrap().title,
        "Break time's over!"
    );
}

#[test]
fn test_one_minute_run_completes_once_and_logs_once() {
    let mut rig = rig();
    rig.service.handle(Command::start(1, 0));

    let completions = run_for(&mut rig, 61);
    assert_eq!(completions.len(), 1);

    // Late wake-ups after completion change nothing.
    let mut late = Vec::new();
    for _ in 0..3 {
        late.extend(rig.service.on_wake(TICK_SCHEDULE));
    }
    assert!(late.is_empty());

    let records = session_log::load(&rig.store).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].duration_minutes, 1);
    let breaks = rig
        .broadcaster
        .pushes()
        .iter()
        .filter(|p| matches!(p, Push::ShowBreakSelection { .. }))
        .count();
    assert_eq!(breaks, 1);
}

#[test]
fn test_view_follows_service_pushes() {
    let mut rig = rig();
    let mut view = TimerView::new(&Config::default().timer);
    view.open(rig.service.current_snapshot());

    let command = view.toggle();
    rig.service.handle(command);
    for push in rig.broadcaster.take() {
        view.apply(&push);
    }
    assert!(view.is_running());

    rig.clock.advance_secs(90);
    rig.service.on_wake(TICK_SCHEDULE);
    for push in rig.broadcaster.take() {
        view.apply(&push);
    }
    assert_eq!(view.frame(rig.clock.now_ms()).to_string(), "23:30");

    rig.service.handle(view.toggle());
    for push in rig.broadcaster.take() {
        view.apply(&push);
    }
    assert!(!view.is_running());
    assert_eq!(view.toggle(), Command::resume());
}

#[test]
fn test_restart_from_sqlite_resumes_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkmate.db");
    let clock = ManualClock::new(T0);

    {
        let store = SqliteStore::open_path(&path).unwrap();
        let host = Host {
            store: Box::new(store),
            scheduler: Box::new(RecordingScheduler::new()),
            notifier: Box::new(RecordingNotifier::new()),
            badge: Box::new(RecordingBadge::new()),
            broadcaster: Box::new(RecordingBroadcaster::new()),
            clock: Arc::new(clock.clone()),
        };
        let mut service = TimerService::boot(host, Config::default());
        service.handle(Command::start(2, 0));
    }

    clock.advance_secs(45);
    let store = SqliteStore::open_path(&path).unwrap();
    assert_eq!(
        store.get_one(keys::IS_RUNNING).unwrap(),
        Some(serde_json::Value::Bool(true))
    );
    let scheduler = RecordingScheduler::new();
    let host = Host {
        store: Box::new(store),
        scheduler: Box::new(scheduler.clone()),
        notifier: Box::new(RecordingNotifier::new()),
        badge: Box::new(RecordingBadge::new()),
        broadcaster: Box::new(RecordingBroadcaster::new()),
        clock: Arc::new(clock.clone()),
    };
    let service = TimerService::boot(host, Config::default());
    assert!(scheduler.is_active(TICK_SCHEDULE));
    assert_eq!(service.current_snapshot().unwrap().remaining_secs(), 75);
}

#[test]
fn test_old_sessions_are_pruned_on_completion() {
    let mut rig = rig();
    let stale = serde_json::json!([
        {"date": "2020-01-01T00:00:00Z", "duration": 25},
        {"date": "2023-11-01T00:00:00Z", "duration": 45}
    ]);
    rig.store.set_one(keys::FOCUS_SESSIONS, stale).unwrap();

    rig.service.handle(Command::start(1, 0));
    run_for(&mut rig, 61);

    // T0 is 2023-11-14, so the 2020 entry falls outside the 30-day window.
    let records = session_log::load(&rig.store).unwrap();
    let cutoff = chrono::DateTime::from_timestamp_millis(T0).unwrap() - chrono::Duration::days(30);
    assert!(records.iter().all(|r| r.occurred_at >= cutoff));
    assert_eq!(records.len(), 2);
}

proptest! {
    #[test]
    fn prop_start_sets_exact_remaining(minutes in 0u32..=120, seconds in 0u32..60) {
        let mut rig = rig();
        rig.service.handle(Command::start(minutes, seconds));
        let snapshot = rig.service.handle(Command::GetTime).unwrap();
        prop_assert_eq!(snapshot.remaining_secs(), u64::from(minutes) * 60 + u64::from(seconds));
        prop_assert!(snapshot.seconds < 60);
    }

    #[test]
    fn prop_ticks_never_show_negative_time(total in 1u32..180, steps in 1u64..400) {
        let mut rig = rig();
        rig.service.handle(Command::start(0, total));
        for _ in 0..steps {
            rig.clock.advance_secs(1);
            rig.service.on_wake(TICK_SCHEDULE);
        }
        for push in rig.broadcaster.pushes() {
            if let Push::TimeUpdated(s) = push {
                prop_assert!(s.seconds < 60);
                prop_assert!(s.remaining_secs() <= u64::from(total));
            }
        }
    }

    #[test]
    fn prop_concurrent_get_time_agrees(elapsed in 0u64..3_000) {
        let mut rig = rig();
        rig.service.handle(Command::start(45, 0));
        rig.clock.advance_secs(elapsed);
        let a = rig.service.handle(Command::GetTime);
        let b = rig.service.handle(Command::GetTime);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_negative_inputs_clamp(minutes in -1_000i64..0, seconds in -1_000i64..0) {
        let mut rig = rig();
        rig.service.handle(Command::StartTimer { minutes: Some(minutes), seconds: Some(seconds) });
        let snapshot = rig.service.handle(Command::GetTime).unwrap();
        prop_assert_eq!(snapshot.remaining_secs(), 0);
    }
}
