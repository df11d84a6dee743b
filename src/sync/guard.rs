use crate::error::StorageError;
use crate::storage::ExtensionSettings;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Durable single-flight flag shared by every sync run.
///
/// The flag itself lives in extension storage so that a run started by
/// another host context is observed. Within this process the
/// read-then-raise step is serialized and a run that holds the flag is
/// never taken over, however long it takes.
///
/// The `is_syncing_since` stamp doubles as the owner's token: a live run
/// refreshes it with [`SyncLease::heartbeat`] before every remote call, and
/// a lease only lowers a flag that still carries its own stamp.
pub struct SyncState {
    settings: ExtensionSettings,
    stale_after: Duration,
    cas: tokio::sync::Mutex<()>,
    held: AtomicBool,
}

/// Held while a run owns the flag. Call [`SyncLease::release`] on every exit.
#[must_use = "the sync flag stays raised until the lease is released"]
pub struct SyncLease<'a> {
    state: &'a SyncState,
    stamp: i64,
}

impl SyncState {
    pub fn new(settings: ExtensionSettings, stale_after: Duration) -> Self {
        Self {
            settings,
            stale_after,
            cas: tokio::sync::Mutex::new(()),
            held: AtomicBool::new(false),
        }
    }

    pub async fn is_in_progress(&self) -> Result<bool, StorageError> {
        Ok(self.settings.syncing_flag().await?.in_progress)
    }

    /// Raise the flag unless a live run holds it.
    ///
    /// A flag with no timestamp, or one whose stamp has not been refreshed
    /// within the stale threshold, belongs to a run that never released it
    /// and is taken over.
    pub async fn try_acquire(&self) -> Result<Option<SyncLease<'_>>, StorageError> {
        let _cas = self.cas.lock().await;
        if self.held.load(Ordering::Acquire) {
            return Ok(None);
        }

        let now = Utc::now().timestamp_millis();
        let flag = self.settings.syncing_flag().await?;
        if flag.in_progress {
            let stale_ms = i64::try_from(self.stale_after.as_millis()).unwrap_or(i64::MAX);
            match flag.since {
                Some(since) if now.saturating_sub(since) < stale_ms => return Ok(None),
                Some(since) => {
                    tracing::warn!(
                        held_ms = now.saturating_sub(since),
                        "taking over abandoned sync flag"
                    );
                }
                None => tracing::warn!("taking over sync flag with no timestamp"),
            }
        }

        // A stamp equal to the one being replaced would let the old owner
        // keep believing it holds the flag.
        let stamp = match flag.since {
            Some(since) if since >= now => since + 1,
            _ => now,
        };
        self.settings.raise_syncing_flag(stamp).await?;
        self.held.store(true, Ordering::Release);
        Ok(Some(SyncLease { state: self, stamp }))
    }

    /// Lower the flag unconditionally.
    ///
    /// A run still holding a lease notices at its next heartbeat and stops.
    pub async fn reset(&self) -> Result<(), StorageError> {
        let _cas = self.cas.lock().await;
        self.settings.clear_syncing_flag().await
    }
}

impl SyncLease<'_> {
    /// Refresh the flag's stamp if this lease still owns it.
    ///
    /// Returns `false` once the flag was lowered or re-stamped by someone
    /// else, or when storage cannot confirm ownership; the caller must stop
    /// sending.
    pub async fn heartbeat(&mut self) -> bool {
        let state = self.state;
        let _cas = state.cas.lock().await;
        let flag = match state.settings.syncing_flag().await {
            Ok(flag) => flag,
            Err(error) => {
                tracing::warn!(%error, "could not read sync flag");
                return false;
            }
        };
        if !flag.in_progress || flag.since != Some(self.stamp) {
            tracing::warn!(
                stamp = self.stamp,
                current = ?flag.since,
                "sync flag no longer owned by this run"
            );
            return false;
        }

        let stamp = Utc::now().timestamp_millis().max(self.stamp + 1);
        if let Err(error) = state.settings.raise_syncing_flag(stamp).await {
            tracing::warn!(%error, "failed to refresh sync flag");
            return false;
        }
        self.stamp = stamp;
        true
    }

    /// Lower the flag if it still carries this lease's stamp.
    pub async fn release(self) {
        let state = self.state;
        let _cas = state.cas.lock().await;
        match state.settings.syncing_flag().await {
            Ok(flag) if flag.in_progress && flag.since == Some(self.stamp) => {
                if let Err(error) = state.settings.clear_syncing_flag().await {
                    tracing::warn!(%error, "failed to clear sync flag");
                }
            }
            Ok(flag) => tracing::debug!(
                stamp = self.stamp,
                current = ?flag.since,
                "sync flag owned elsewhere, leaving it"
            ),
            Err(error) => tracing::warn!(%error, "could not read sync flag"),
        }
    }
}

impl Drop for SyncLease<'_> {
    fn drop(&mut self) {
        self.state.held.store(false, Ordering::Release);
    }
}
