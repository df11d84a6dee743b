use crate::remote::CoreClient;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SaveStatus {
    Saved,
    Failed,
    /// Nothing but whitespace was selected; no request was made.
    Empty,
}

/// Store a piece of selected page text as a standalone episode.
pub async fn save_selection(client: &CoreClient, text: &str) -> SaveStatus {
    let text = text.trim();
    if text.is_empty() {
        return SaveStatus::Empty;
    }

    match client.add_episode(text, None).await {
        Ok(()) => {
            tracing::info!(chars = text.chars().count(), "saved selection");
            SaveStatus::Saved
        }
        Err(error) => {
            tracing::warn!(%error, "failed to save selection");
            SaveStatus::Failed
        }
    }
}
