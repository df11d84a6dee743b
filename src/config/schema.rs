use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_LOG_LEVEL: &str = "info";

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    /// CORE API key, seeded into extension storage at startup
    #[serde(default)]
    pub api_key: Option<String>,
    /// CORE API base URL override (default: `https://core.heysol.ai/api/v1`)
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub stream: StreamConfig,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            api_key: None,
            api_base_url: None,
            log_level: default_log_level(),
            sync: SyncConfig::default(),
            storage: StorageConfig::default(),
            http: HttpConfig::default(),
            stream: StreamConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Validation(message));
        if self.sync.interval_ms == 0 {
            return invalid("sync.interval_ms must be >= 1".into());
        }
        if self.sync.status_poll_ms == 0 {
            return invalid("sync.status_poll_ms must be >= 1".into());
        }
        if let Some(base) = self.api_base_url.as_deref()
            && !(base.starts_with("https://") || base.starts_with("http://"))
        {
            return invalid(format!("api_base_url must be an http(s) URL, got {base}"));
        }
        if self.tracing_level().is_none() {
            return invalid(format!("log_level {} is not a tracing level", self.log_level));
        }
        Ok(())
    }

    pub fn tracing_level(&self) -> Option<tracing::Level> {
        self.log_level.parse().ok()
    }
}

// ── Sync scheduling ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Auto-sync timer period in milliseconds (default: 5000)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Period of the sync-status mirror in milliseconds (default: 1000)
    #[serde(default = "default_status_poll_ms")]
    pub status_poll_ms: u64,
    /// Age after which a set sync flag counts as abandoned (default: 120)
    #[serde(default = "default_stale_lock_secs")]
    pub stale_lock_secs: u64,
}

fn default_interval_ms() -> u64 {
    5_000
}

fn default_status_poll_ms() -> u64 {
    1_000
}

fn default_stale_lock_secs() -> u64 {
    120
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            status_poll_ms: default_status_poll_ms(),
            stale_lock_secs: default_stale_lock_secs(),
        }
    }
}

// ── Extension storage ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the key-value storage file; `~` is expanded
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_storage_path() -> String {
    "~/.coresync/storage.json".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl StorageConfig {
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).into_owned())
    }
}

// ── HTTP client ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

// ── Deep-search answer stream ────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Base URL of the realtime run stream (default: `https://trigger.heysol.ai`)
    #[serde(default = "default_trigger_base_url")]
    pub trigger_base_url: String,
}

fn default_trigger_base_url() -> String {
    "https://trigger.heysol.ai".into()
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            trigger_base_url: default_trigger_base_url(),
        }
    }
}
