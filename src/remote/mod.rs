mod client;
pub mod http_client;
pub mod stream;
pub mod types;

pub use client::CoreClient;
pub use http_client::{build_http_client, build_streaming_client};
pub use stream::TriggerStream;
pub use types::{DeepSearchRun, EPISODE_SOURCE, LogsResponse, Space};

use crate::error::RemoteError;
use async_trait::async_trait;

/// Append-only episode log keyed by conversation id.
///
/// The sync engine only needs these two calls; [`CoreClient`] implements
/// them over HTTP and tests substitute in-memory logs.
#[async_trait]
pub trait RemoteLog: Send + Sync {
    async fn append_episode(&self, body: &str, conversation_id: &str) -> Result<(), RemoteError>;

    /// Number of episodes already stored for the conversation.
    async fn fetch_turn_count(&self, conversation_id: &str) -> Result<u64, RemoteError>;
}
