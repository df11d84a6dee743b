use std::sync::Arc;
use std::time::Duration;

use coresync::sync::{ConversationTurn, SyncOutcome};

use super::sync_harness::{
    FakeAdapter, FakeLog, bodies, conversation, engine_with, engine_with_stale, memory_settings,
};

#[tokio::test]
async fn second_run_on_unchanged_page_sends_nothing() {
    let log = FakeLog::new();
    let settings = memory_settings();
    let engine = engine_with(Arc::clone(&log), &settings);
    let adapter = FakeAdapter::new("conv-a", conversation(3));

    let first = engine.run(adapter.as_ref()).await;
    assert_eq!(first.appended(), 3);
    let calls_after_first = log.append_calls();

    let second = engine.run(adapter.as_ref()).await;
    assert!(matches!(second, SyncOutcome::UpToDate { remote_count: 3, pairs: 3 }));
    assert_eq!(log.append_calls(), calls_after_first);
}

#[tokio::test]
async fn remote_log_stays_a_prefix_of_the_page() {
    let log = FakeLog::new();
    let settings = memory_settings();
    let engine = engine_with(Arc::clone(&log), &settings);
    let adapter = FakeAdapter::new("conv-b", conversation(1));

    engine.run(adapter.as_ref()).await;
    assert_eq!(log.episodes("conv-b"), bodies(1));

    adapter.set_turns(conversation(4));
    engine.run(adapter.as_ref()).await;
    assert_eq!(log.episodes("conv-b"), bodies(4));
}

#[tokio::test]
async fn overlapping_runs_never_duplicate_episodes() {
    let log = FakeLog::new();
    log.delay_count(Duration::from_millis(50));
    let settings = memory_settings();
    let engine = engine_with(Arc::clone(&log), &settings);
    let adapter = FakeAdapter::new("conv-c", conversation(2));

    let runs = (0..6)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { engine.run(adapter.as_ref()).await })
        })
        .collect::<Vec<_>>();

    let mut synced = 0;
    let mut skipped = 0;
    for run in runs {
        match run.await.unwrap() {
            SyncOutcome::Synced { .. } => synced += 1,
            SyncOutcome::AlreadyRunning => skipped += 1,
            other => panic!("unexpected outcome: {other}"),
        }
    }
    assert_eq!(synced, 1);
    assert_eq!(skipped, 5);
    assert_eq!(log.episodes("conv-c"), bodies(2));
    assert!(!engine.state().is_in_progress().await.unwrap());
}

#[tokio::test]
async fn streaming_assistant_turn_waits_for_completion() {
    let log = FakeLog::new();
    let settings = memory_settings();
    let engine = engine_with(Arc::clone(&log), &settings);
    // The assistant reply is still streaming, so the adapter reports only
    // the user turn.
    let mut turns = conversation(1);
    turns.push(ConversationTurn::user("question 2"));
    let adapter = FakeAdapter::new("conv-d", turns);

    engine.run(adapter.as_ref()).await;
    assert_eq!(log.episodes("conv-d"), bodies(1));

    adapter.push(ConversationTurn::assistant("answer 2"));
    engine.run(adapter.as_ref()).await;
    assert_eq!(log.episodes("conv-d"), bodies(2));
}

#[tokio::test]
async fn misaligned_turns_are_dropped() {
    let log = FakeLog::new();
    let settings = memory_settings();
    let engine = engine_with(Arc::clone(&log), &settings);
    let adapter = FakeAdapter::new(
        "conv-e",
        vec![
            ConversationTurn::user("first"),
            ConversationTurn::user("second"),
            ConversationTurn::assistant("reply"),
        ],
    );

    let outcome = engine.run(adapter.as_ref()).await;
    assert!(matches!(outcome, SyncOutcome::UpToDate { remote_count: 0, pairs: 0 }));
    assert!(log.episodes("conv-e").is_empty());
}

#[tokio::test]
async fn interrupted_run_resumes_without_gaps_or_duplicates() {
    let log = FakeLog::new();
    let settings = memory_settings();
    let engine = engine_with(Arc::clone(&log), &settings);
    let adapter = FakeAdapter::new("conv-f", conversation(3));

    log.fail_appends_after(Some(1));
    let first = engine.run(adapter.as_ref()).await;
    assert!(matches!(
        first,
        SyncOutcome::Interrupted { appended: 1, remaining: 2, .. }
    ));
    assert_eq!(log.episodes("conv-f"), bodies(1));
    assert!(!engine.state().is_in_progress().await.unwrap());

    log.fail_appends_after(None);
    let second = engine.run(adapter.as_ref()).await;
    assert!(matches!(
        second,
        SyncOutcome::Synced { appended: 2, remote_count: 1, .. }
    ));
    assert_eq!(log.episodes("conv-f"), bodies(3));
}

#[tokio::test]
async fn count_failure_sends_nothing_and_releases_flag() {
    let log = FakeLog::new();
    log.fail_count(true);
    let settings = memory_settings();
    let engine = engine_with(Arc::clone(&log), &settings);
    let adapter = FakeAdapter::new("conv-g", conversation(2));

    let outcome = engine.run(adapter.as_ref()).await;
    assert!(matches!(outcome, SyncOutcome::CountUnavailable(_)));
    assert_eq!(log.append_calls(), 0);
    assert!(!engine.state().is_in_progress().await.unwrap());
}

#[tokio::test]
async fn pre_existing_remote_episodes_are_skipped() {
    let log = FakeLog::new();
    log.seed("conv-h", &bodies(2));
    let settings = memory_settings();
    let engine = engine_with(Arc::clone(&log), &settings);
    let adapter = FakeAdapter::new("conv-h", conversation(3));

    let outcome = engine.run(adapter.as_ref()).await;
    assert!(matches!(outcome, SyncOutcome::Synced { appended: 1, remote_count: 2, .. }));
    assert_eq!(log.episodes("conv-h"), bodies(3));
    assert!(settings.last_sync_timestamp().await.unwrap().is_some());
}

#[tokio::test]
async fn slow_run_outliving_stale_threshold_is_not_taken_over() {
    let log = FakeLog::new();
    log.delay_append(Duration::from_millis(150));
    let settings = memory_settings();
    let engine = engine_with_stale(Arc::clone(&log), &settings, Duration::from_millis(200));
    let adapter = FakeAdapter::new("conv-slow", conversation(4));

    let first = {
        let engine = Arc::clone(&engine);
        let adapter = Arc::clone(&adapter);
        tokio::spawn(async move { engine.run(adapter.as_ref()).await })
    };
    tokio::time::sleep(Duration::from_millis(320)).await;

    let second = engine.run(adapter.as_ref()).await;
    assert!(matches!(second, SyncOutcome::AlreadyRunning), "got {second}");

    let first = first.await.unwrap();
    assert!(matches!(first, SyncOutcome::Synced { appended: 4, .. }), "got {first}");
    assert_eq!(log.append_calls(), 4);
    assert_eq!(log.episodes("conv-slow"), bodies(4));
    assert!(!engine.state().is_in_progress().await.unwrap());
}

#[tokio::test]
async fn heartbeat_keeps_other_contexts_out_of_a_slow_run() {
    let log = FakeLog::new();
    log.delay_append(Duration::from_millis(150));
    let settings = memory_settings();
    let stale_after = Duration::from_millis(200);
    let tab_a = engine_with_stale(Arc::clone(&log), &settings, stale_after);
    let tab_b = engine_with_stale(Arc::clone(&log), &settings, stale_after);
    let adapter = FakeAdapter::new("conv-tabs", conversation(4));

    let first = {
        let adapter = Arc::clone(&adapter);
        tokio::spawn(async move { tab_a.run(adapter.as_ref()).await })
    };
    tokio::time::sleep(Duration::from_millis(320)).await;

    let second = tab_b.run(adapter.as_ref()).await;
    assert!(matches!(second, SyncOutcome::AlreadyRunning), "got {second}");

    assert_eq!(first.await.unwrap().appended(), 4);
    assert_eq!(log.episodes("conv-tabs"), bodies(4));
    assert!(!tab_b.state().is_in_progress().await.unwrap());
}
