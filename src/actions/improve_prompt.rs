use crate::error::RemoteError;
use crate::platforms::{HostPage, PlatformAdapter};
use crate::remote::{CoreClient, TriggerStream};
use crate::storage::PlatformSyncData;
use chrono::Utc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImproveOutcome {
    /// The composer was empty; nothing was sent.
    EmptyPrompt,
    Improved { prompt: String, answer: String },
}

/// Rewrite the composer's prompt with context from the memory graph.
///
/// The prompt is sent as a deep search together with the page URL and
/// title, the answer is read from the run's stream, and the finished answer
/// is appended to the composer.
pub async fn improve_prompt(
    client: &CoreClient,
    stream: &TriggerStream,
    adapter: &dyn PlatformAdapter,
    page: &dyn HostPage,
    on_delta: impl FnMut(&str) + Send,
) -> Result<ImproveOutcome, RemoteError> {
    let prompt = adapter.input_value();
    if prompt.trim().is_empty() {
        tracing::warn!(platform = %adapter.platform(), "no prompt to improve");
        return Ok(ImproveOutcome::EmptyPrompt);
    }

    let record = PlatformSyncData {
        platform: adapter.platform(),
        prompt: prompt.clone(),
        timestamp: Utc::now().timestamp_millis(),
    };
    if let Err(error) = client.settings().set_platform_sync_data(&record).await {
        tracing::warn!(%error, "failed to record prompt");
    }

    let title = page.title();
    let run = client
        .create_deep_search(&prompt, &page.url(), title.as_deref())
        .await?;
    tracing::debug!(run_id = %run.id, "deep search started");

    let answer = stream.collect(&run, on_delta).await?;
    if answer.trim().is_empty() {
        tracing::warn!(run_id = %run.id, "deep search returned no text");
    } else {
        adapter.add_to_input(&answer);
    }

    Ok(ImproveOutcome::Improved { prompt, answer })
}
