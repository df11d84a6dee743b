use super::engine::{SyncEngine, SyncOutcome};
use crate::error::StorageError;
use crate::platforms::PlatformAdapter;
use crate::storage::{DEFAULT_SYNC_INTERVAL_MS, ExtensionSettings};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use strum::Display;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AutoSyncMode {
    Disabled,
    Enabled,
}

struct Timer {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Timer {
    fn spawn<F, Fut>(make_loop: F) -> Self
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(make_loop(shutdown_rx));
        Self { shutdown, task }
    }

    fn stop(self) -> JoinHandle<()> {
        let _ = self.shutdown.send(true);
        self.task
    }
}

/// Drives periodic sync runs for one page and mirrors the sync flag for
/// observers.
///
/// Ticks spawn runs without waiting for the previous one; the engine's
/// guard turns overlapping ticks into no-ops.
pub struct AutoSyncController {
    engine: Arc<SyncEngine>,
    adapter: Arc<dyn PlatformAdapter>,
    settings: ExtensionSettings,
    status_poll: Duration,
    sync_timer: Mutex<Option<Timer>>,
    status_timer: Mutex<Option<Timer>>,
    status: Arc<watch::Sender<bool>>,
}

impl AutoSyncController {
    pub fn new(
        engine: Arc<SyncEngine>,
        adapter: Arc<dyn PlatformAdapter>,
        settings: ExtensionSettings,
        status_poll: Duration,
    ) -> Self {
        let (status, _) = watch::channel(false);
        Self {
            engine,
            adapter,
            settings,
            status_poll,
            sync_timer: Mutex::new(None),
            status_timer: Mutex::new(None),
            status: Arc::new(status),
        }
    }

    /// Start the status mirror and restore the persisted mode.
    ///
    /// A restored enabled mode behaves like enabling: one run happens right
    /// away, then the periodic timer starts.
    pub async fn initialize(&self) -> Result<AutoSyncMode, StorageError> {
        self.start_status_mirror();
        if self.settings.auto_sync_enabled().await? {
            let outcome = self.sync_now().await;
            tracing::debug!(%outcome, "initial sync finished");
            self.start_sync_timer().await;
            Ok(AutoSyncMode::Enabled)
        } else {
            Ok(AutoSyncMode::Disabled)
        }
    }

    /// Persist the mode and apply it.
    ///
    /// Enabling runs one sync immediately, then starts the periodic timer;
    /// the immediate run's outcome is returned. Disabling stops the timer
    /// and leaves in-flight runs to finish.
    pub async fn set_enabled(&self, enabled: bool) -> Result<Option<SyncOutcome>, StorageError> {
        self.settings.set_auto_sync_enabled(enabled).await?;
        if !enabled {
            self.stop_sync_timer();
            tracing::info!("auto-sync disabled");
            return Ok(None);
        }

        let outcome = self.sync_now().await;
        self.start_sync_timer().await;
        tracing::info!(platform = %self.adapter.platform(), "auto-sync enabled");
        Ok(Some(outcome))
    }

    pub fn mode(&self) -> AutoSyncMode {
        let running = self
            .sync_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        if running {
            AutoSyncMode::Enabled
        } else {
            AutoSyncMode::Disabled
        }
    }

    pub async fn sync_now(&self) -> SyncOutcome {
        self.engine.run(self.adapter.as_ref()).await
    }

    /// Observe the mirrored `in progress` flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.status.subscribe()
    }

    /// Stop both timers and wait for them to exit.
    pub async fn shutdown(&self) {
        let sync = self.sync_timer.lock().unwrap_or_else(PoisonError::into_inner).take();
        let status = self
            .status_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        for timer in [sync, status].into_iter().flatten() {
            if let Err(error) = timer.stop().await {
                tracing::warn!(%error, "timer task ended abnormally");
            }
        }
    }

    async fn start_sync_timer(&self) {
        let interval_ms = self.settings.sync_interval_ms().await.unwrap_or_else(|error| {
            tracing::warn!(%error, "could not read sync interval, using default");
            DEFAULT_SYNC_INTERVAL_MS
        });
        let period = Duration::from_millis(interval_ms.max(1));
        let engine = Arc::clone(&self.engine);
        let adapter = Arc::clone(&self.adapter);
        let timer = Timer::spawn(move |shutdown| run_sync_loop(engine, adapter, period, shutdown));

        let previous = self
            .sync_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(timer);
        if let Some(previous) = previous {
            drop(previous.stop());
        }
    }

    fn stop_sync_timer(&self) {
        let timer = self.sync_timer.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(timer) = timer {
            drop(timer.stop());
        }
    }

    fn start_status_mirror(&self) {
        let mut slot = self.status_timer.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }
        let engine = Arc::clone(&self.engine);
        let status = Arc::clone(&self.status);
        let period = self.status_poll;
        *slot = Some(Timer::spawn(move |shutdown| {
            run_status_loop(engine, status, period, shutdown)
        }));
    }
}

async fn run_sync_loop(
    engine: Arc<SyncEngine>,
    adapter: Arc<dyn PlatformAdapter>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            () = tokio::time::sleep(period) => {
                let engine = Arc::clone(&engine);
                let adapter = Arc::clone(&adapter);
                tokio::spawn(async move {
                    let outcome = engine.run(adapter.as_ref()).await;
                    tracing::debug!(%outcome, "scheduled sync finished");
                });
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() { break; }
            }
        }
    }
}

async fn run_status_loop(
    engine: Arc<SyncEngine>,
    status: Arc<watch::Sender<bool>>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        match engine.state().is_in_progress().await {
            Ok(in_progress) => {
                status.send_if_modified(|current| {
                    if *current == in_progress {
                        false
                    } else {
                        *current = in_progress;
                        true
                    }
                });
            }
            Err(error) => tracing::debug!(%error, "could not read sync flag"),
        }

        tokio::select! {
            () = tokio::time::sleep(period) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() { break; }
            }
        }
    }
}
