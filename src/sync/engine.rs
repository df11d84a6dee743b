//! One sync run: read the rendered conversation, ask the remote log how many
//! pairs it already holds, and append the rest in order.
//!
//! The remote count is the only cursor. Pair `k` of the page is assumed to be
//! episode `k` of the session, so appending strictly in order and stopping at
//! the first failure keeps the log a prefix of the page and lets the next run
//! resume where this one stopped.
//!
//! The run refreshes its hold on the sync flag before every remote call and
//! stops as soon as it finds the flag owned by someone else.

use super::guard::{SyncLease, SyncState};
use super::types::pair_turns;
use crate::error::RemoteError;
use crate::platforms::PlatformAdapter;
use crate::remote::RemoteLog;
use crate::storage::ExtensionSettings;
use std::fmt;
use std::sync::Arc;

/// Which branch a run took.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Another run holds the flag.
    AlreadyRunning,
    /// The flag could not be read or raised.
    StorageUnavailable,
    NoTurns,
    MissingConversationId,
    /// The remote count could not be fetched; nothing was sent.
    CountUnavailable(RemoteError),
    UpToDate {
        remote_count: u64,
        pairs: usize,
    },
    Synced {
        conversation_id: String,
        appended: usize,
        remote_count: u64,
    },
    /// An append failed after `appended` successes; `remaining` were not sent.
    Interrupted {
        appended: usize,
        remaining: usize,
        error: RemoteError,
    },
    /// The flag was reset or taken over mid-run; the run stopped after
    /// `appended` pairs.
    LeaseLost { appended: usize },
}

impl SyncOutcome {
    pub fn appended(&self) -> usize {
        match self {
            Self::Synced { appended, .. }
            | Self::Interrupted { appended, .. }
            | Self::LeaseLost { appended } => *appended,
            _ => 0,
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "skipped: a sync is already in progress"),
            Self::StorageUnavailable => write!(f, "skipped: extension storage unavailable"),
            Self::NoTurns => write!(f, "nothing to sync: no conversation turns on the page"),
            Self::MissingConversationId => {
                write!(f, "nothing to sync: page URL has no conversation id")
            }
            Self::CountUnavailable(error) => write!(f, "could not read remote count: {error}"),
            Self::UpToDate {
                remote_count,
                pairs,
            } => write!(f, "up to date ({pairs} pairs on page, {remote_count} remote)"),
            Self::Synced {
                conversation_id,
                appended,
                remote_count,
            } => write!(
                f,
                "synced {appended} new pair(s) to {conversation_id} (remote had {remote_count})"
            ),
            Self::Interrupted {
                appended,
                remaining,
                error,
            } => write!(
                f,
                "interrupted after {appended} pair(s), {remaining} left: {error}"
            ),
            Self::LeaseLost { appended } => write!(
                f,
                "stopped after {appended} pair(s): sync flag was taken over"
            ),
        }
    }
}

pub struct SyncEngine {
    log: Arc<dyn RemoteLog>,
    state: Arc<SyncState>,
    settings: ExtensionSettings,
}

impl SyncEngine {
    pub fn new(log: Arc<dyn RemoteLog>, state: Arc<SyncState>, settings: ExtensionSettings) -> Self {
        Self {
            log,
            state,
            settings,
        }
    }

    pub fn state(&self) -> &Arc<SyncState> {
        &self.state
    }

    pub async fn run(&self, adapter: &dyn PlatformAdapter) -> SyncOutcome {
        let mut lease = match self.state.try_acquire().await {
            Ok(Some(lease)) => lease,
            Ok(None) => {
                tracing::debug!("sync already in progress, skipping");
                return SyncOutcome::AlreadyRunning;
            }
            Err(error) => {
                tracing::warn!(%error, "could not raise sync flag");
                return SyncOutcome::StorageUnavailable;
            }
        };

        let outcome = self.sync_page(adapter, &mut lease).await;
        lease.release().await;

        if outcome.appended() > 0
            && let Err(error) = self.settings.touch_last_sync_timestamp().await
        {
            tracing::warn!(%error, "failed to record last sync timestamp");
        }
        outcome
    }

    async fn sync_page(
        &self,
        adapter: &dyn PlatformAdapter,
        lease: &mut SyncLease<'_>,
    ) -> SyncOutcome {
        let platform = adapter.platform();

        let turns = adapter.extract_conversation();
        if turns.is_empty() {
            tracing::debug!(%platform, "no conversation turns found");
            return SyncOutcome::NoTurns;
        }

        let Some(conversation_id) = adapter.conversation_id() else {
            tracing::debug!(%platform, "no conversation id in page URL");
            return SyncOutcome::MissingConversationId;
        };

        if !lease.heartbeat().await {
            return SyncOutcome::LeaseLost { appended: 0 };
        }
        let remote_count = match self.log.fetch_turn_count(&conversation_id).await {
            Ok(count) => count,
            Err(error) => {
                tracing::warn!(%platform, %conversation_id, %error, "failed to fetch remote count");
                return SyncOutcome::CountUnavailable(error);
            }
        };

        let pairs = pair_turns(&turns);
        let already = usize::try_from(remote_count).unwrap_or(usize::MAX);
        if already >= pairs.len() {
            return SyncOutcome::UpToDate {
                remote_count,
                pairs: pairs.len(),
            };
        }

        let pending = &pairs[already..];
        let mut appended = 0;
        for pair in pending {
            if !lease.heartbeat().await {
                tracing::warn!(%platform, %conversation_id, appended, "lost sync flag, stopping run");
                return SyncOutcome::LeaseLost { appended };
            }
            if let Err(error) = self
                .log
                .append_episode(&pair.episode_body(), &conversation_id)
                .await
            {
                tracing::warn!(
                    %platform,
                    %conversation_id,
                    appended,
                    %error,
                    "append failed, stopping run"
                );
                return SyncOutcome::Interrupted {
                    appended,
                    remaining: pending.len() - appended,
                    error,
                };
            }
            appended += 1;
        }

        tracing::info!(%platform, %conversation_id, appended, "synced conversation");
        SyncOutcome::Synced {
            conversation_id,
            appended,
            remote_count,
        }
    }
}
