//! Extension-local key-value storage.
//!
//! Everything the sync core persists across script reinjection lives here as
//! string values: credentials, the auto-sync switch, the in-progress flag and
//! per-platform scratch data. [`ExtensionSettings`] gives typed access to the
//! known keys.

mod file;
pub mod keys;
mod memory;
mod settings;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use settings::{
    DEFAULT_API_BASE_URL, DEFAULT_SYNC_INTERVAL_MS, ExtensionSettings, ExtensionState,
    PlatformSyncData, SyncingFlag,
};

use crate::error::StorageError;
use async_trait::async_trait;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
