use super::{KeyValueStore, keys};
use crate::error::StorageError;
use crate::platforms::Platform;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_API_BASE_URL: &str = "https://core.heysol.ai/api/v1";
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 5_000;

/// Last prompt the improve-prompt flow read from a platform's composer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSyncData {
    pub platform: Platform,
    pub prompt: String,
    /// Epoch millis
    pub timestamp: i64,
}

/// Snapshot of the persisted auto-sync settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionState {
    pub auto_sync_enabled: bool,
    pub sync_interval_ms: u64,
    pub last_sync_timestamp: Option<i64>,
}

/// Raw persisted state of the sync single-flight flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncingFlag {
    pub in_progress: bool,
    /// Epoch millis at which the flag was raised, when recorded
    pub since: Option<i64>,
}

/// Typed accessors over the extension storage keys.
#[derive(Clone)]
pub struct ExtensionSettings {
    store: Arc<dyn KeyValueStore>,
}

impl ExtensionSettings {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    async fn get_bool(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.store.get(key).await?.as_deref() == Some("true"))
    }

    async fn get_number<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, StorageError> {
        Ok(self
            .store
            .get(key)
            .await?
            .and_then(|value| value.trim().parse().ok()))
    }

    // ── Credentials ──────────────────────────────────────────────

    pub async fn api_key(&self) -> Result<Option<String>, StorageError> {
        Ok(self
            .store
            .get(keys::API_KEY)
            .await?
            .filter(|key| !key.trim().is_empty()))
    }

    pub async fn set_api_key(&self, api_key: &str) -> Result<(), StorageError> {
        self.store.set(keys::API_KEY, api_key.trim()).await
    }

    pub async fn clear_api_key(&self) -> Result<(), StorageError> {
        self.store.remove(keys::API_KEY).await
    }

    /// Configured base URL without a trailing slash, or the public CORE API.
    pub async fn api_base_url(&self) -> Result<String, StorageError> {
        let url = self
            .store
            .get(keys::API_BASE_URL)
            .await?
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        Ok(url.trim().trim_end_matches('/').to_string())
    }

    pub async fn set_api_base_url(&self, url: &str) -> Result<(), StorageError> {
        self.store.set(keys::API_BASE_URL, url.trim()).await
    }

    // ── Auto-sync ────────────────────────────────────────────────

    pub async fn auto_sync_enabled(&self) -> Result<bool, StorageError> {
        self.get_bool(keys::AUTO_SYNC_ENABLED).await
    }

    pub async fn set_auto_sync_enabled(&self, enabled: bool) -> Result<(), StorageError> {
        self.store
            .set(keys::AUTO_SYNC_ENABLED, &enabled.to_string())
            .await
    }

    pub async fn sync_interval_ms(&self) -> Result<u64, StorageError> {
        Ok(self
            .get_number::<u64>(keys::SYNC_INTERVAL_MS)
            .await?
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_SYNC_INTERVAL_MS))
    }

    pub async fn set_sync_interval_ms(&self, interval_ms: u64) -> Result<(), StorageError> {
        self.store
            .set(keys::SYNC_INTERVAL_MS, &interval_ms.to_string())
            .await
    }

    pub async fn last_sync_timestamp(&self) -> Result<Option<i64>, StorageError> {
        self.get_number(keys::LAST_SYNC_TIMESTAMP).await
    }

    pub async fn touch_last_sync_timestamp(&self) -> Result<(), StorageError> {
        self.store
            .set(
                keys::LAST_SYNC_TIMESTAMP,
                &Utc::now().timestamp_millis().to_string(),
            )
            .await
    }

    pub async fn extension_state(&self) -> Result<ExtensionState, StorageError> {
        Ok(ExtensionState {
            auto_sync_enabled: self.auto_sync_enabled().await?,
            sync_interval_ms: self.sync_interval_ms().await?,
            last_sync_timestamp: self.last_sync_timestamp().await?,
        })
    }

    // ── Sync flag ────────────────────────────────────────────────

    pub async fn syncing_flag(&self) -> Result<SyncingFlag, StorageError> {
        Ok(SyncingFlag {
            in_progress: self.get_bool(keys::IS_SYNCING).await?,
            since: self.get_number(keys::IS_SYNCING_SINCE).await?,
        })
    }

    /// Raise the flag, stamping it with `now_millis`.
    pub async fn raise_syncing_flag(&self, now_millis: i64) -> Result<(), StorageError> {
        self.store
            .set(keys::IS_SYNCING_SINCE, &now_millis.to_string())
            .await?;
        self.store.set(keys::IS_SYNCING, "true").await
    }

    pub async fn clear_syncing_flag(&self) -> Result<(), StorageError> {
        self.store.set(keys::IS_SYNCING, "false").await?;
        self.store.remove(keys::IS_SYNCING_SINCE).await
    }

    // ── Per-platform data ────────────────────────────────────────

    pub async fn platform_sync_data(
        &self,
        platform: Platform,
    ) -> Result<Option<PlatformSyncData>, StorageError> {
        let Some(raw) = self.store.get(&platform.storage_key()).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt(format!("{}: {e}", platform.storage_key())))
    }

    pub async fn set_platform_sync_data(&self, data: &PlatformSyncData) -> Result<(), StorageError> {
        let raw = serde_json::to_string(data).map_err(|e| StorageError::Encode(e.to_string()))?;
        self.store.set(&data.platform.storage_key(), &raw).await
    }

    pub async fn clear_platform_sync_data(&self, platform: Platform) -> Result<(), StorageError> {
        self.store.remove(&platform.storage_key()).await
    }
}
