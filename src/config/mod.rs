mod env_overrides;
mod loader;
pub mod schema;

pub use schema::{Config, HttpConfig, StorageConfig, StreamConfig, SyncConfig};
