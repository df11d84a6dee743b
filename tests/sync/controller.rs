use std::sync::Arc;
use std::time::Duration;

use coresync::platforms::PlatformAdapter;
use coresync::storage::{ExtensionSettings, FileStore};
use coresync::sync::{AutoSyncController, AutoSyncMode, SyncOutcome};
use tempfile::TempDir;

use super::sync_harness::{FakeAdapter, FakeLog, bodies, conversation, engine_with};

fn file_settings(tmp: &TempDir) -> ExtensionSettings {
    ExtensionSettings::new(Arc::new(FileStore::new(tmp.path().join("storage.json"))))
}

fn controller(
    log: &Arc<FakeLog>,
    settings: &ExtensionSettings,
    adapter: Arc<dyn PlatformAdapter>,
) -> AutoSyncController {
    AutoSyncController::new(
        engine_with(Arc::clone(log), settings),
        adapter,
        settings.clone(),
        Duration::from_millis(20),
    )
}

#[tokio::test]
async fn enabled_mode_survives_a_restart() {
    let tmp = TempDir::new().unwrap();
    let log = FakeLog::new();
    let adapter = FakeAdapter::new("conv-1", conversation(1));

    let settings = file_settings(&tmp);
    settings.set_sync_interval_ms(60_000).await.unwrap();
    let first = controller(&log, &settings, adapter.clone());
    assert_eq!(first.initialize().await.unwrap(), AutoSyncMode::Disabled);
    let outcome = first.set_enabled(true).await.unwrap();
    assert!(matches!(outcome, Some(SyncOutcome::Synced { appended: 1, .. })));
    first.shutdown().await;

    // Fresh settings over the same file, as after the page reloads. A pair
    // finished while the page was closed is synced without waiting for the
    // one-minute timer.
    adapter.set_turns(conversation(2));
    let settings = file_settings(&tmp);
    let second = controller(&log, &settings, adapter);
    assert_eq!(second.initialize().await.unwrap(), AutoSyncMode::Enabled);
    assert_eq!(log.episodes("conv-1"), bodies(2));
    second.set_enabled(false).await.unwrap();
    second.shutdown().await;

    let settings = file_settings(&tmp);
    assert!(!settings.auto_sync_enabled().await.unwrap());
    assert_eq!(log.episodes("conv-1"), bodies(2));
}

#[tokio::test]
async fn periodic_runs_pick_up_new_turns() {
    let tmp = TempDir::new().unwrap();
    let log = FakeLog::new();
    let adapter = FakeAdapter::new("conv-2", conversation(1));
    let settings = file_settings(&tmp);
    settings.set_sync_interval_ms(25).await.unwrap();

    let controller = controller(&log, &settings, adapter.clone());
    controller.set_enabled(true).await.unwrap();
    assert_eq!(log.episodes("conv-2"), bodies(1));

    adapter.set_turns(conversation(3));
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while log.episodes("conv-2").len() < 3 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    controller.shutdown().await;

    assert_eq!(log.episodes("conv-2"), bodies(3));
    assert!(settings.last_sync_timestamp().await.unwrap().is_some());
}

#[tokio::test]
async fn disabling_stops_new_runs() {
    let tmp = TempDir::new().unwrap();
    let log = FakeLog::new();
    let adapter = FakeAdapter::new("conv-3", conversation(1));
    let settings = file_settings(&tmp);
    settings.set_sync_interval_ms(20).await.unwrap();

    let controller = controller(&log, &settings, adapter);
    controller.set_enabled(true).await.unwrap();
    controller.set_enabled(false).await.unwrap();
    assert_eq!(controller.mode(), AutoSyncMode::Disabled);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let settled = log.count_calls();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(log.count_calls(), settled);
    controller.shutdown().await;
}
