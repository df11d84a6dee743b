pub const API_KEY: &str = "core_api_key";
pub const API_BASE_URL: &str = "core_api_base_url";
pub const AUTO_SYNC_ENABLED: &str = "autoSyncEnabled";
pub const IS_SYNCING: &str = "is_syncing";
/// Epoch millis at which `is_syncing` was last set to `true`.
pub const IS_SYNCING_SINCE: &str = "is_syncing_since";
pub const SYNC_INTERVAL_MS: &str = "syncIntervalMs";
pub const LAST_SYNC_TIMESTAMP: &str = "lastSyncTimestamp";
