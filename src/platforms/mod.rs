//! Chat platform adapters.
//!
//! Each supported site gets a [`Platform`] variant and a [`PlatformAdapter`]
//! implementation that knows the site's DOM shape. The sync engine only
//! sees the trait, so adding a platform never touches it.

pub mod chatgpt;
pub(crate) mod dom;
pub mod gemini;
pub mod page;

pub use chatgpt::ChatGptAdapter;
pub use gemini::GeminiAdapter;
pub use page::{CaretPosition, ComposerEdit, HostPage, PlaceholderStyle, SnapshotPage};

use crate::sync::ConversationTurn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    ChatGpt,
    Gemini,
}

impl Platform {
    pub const fn all() -> &'static [Self] {
        &[Self::ChatGpt, Self::Gemini]
    }

    pub const fn host_patterns(self) -> &'static [&'static str] {
        match self {
            Self::ChatGpt => &["chat.openai.com", "chatgpt.com"],
            Self::Gemini => &["gemini.google.com"],
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::ChatGpt => "ChatGPT",
            Self::Gemini => "Gemini",
        }
    }

    /// Platform whose host pattern occurs in the URL's host name.
    pub fn detect(url: &str) -> Option<Self> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        Self::all()
            .iter()
            .copied()
            .find(|platform| platform.host_patterns().iter().any(|p| host.contains(p)))
    }

    /// Extension storage key for this platform's scratch data.
    pub fn storage_key(self) -> String {
        format!("{self}_sync_data")
    }
}

/// DOM capability set for one chat platform.
///
/// Every method is infallible by contract: DOM surprises degrade to an empty
/// result (and a log line) rather than an error that could break the host
/// page.
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    /// Finished turns in document order. Assistant turns still streaming are
    /// left out.
    fn extract_conversation(&self) -> Vec<ConversationTurn>;

    /// Conversation id parsed from the current URL.
    fn conversation_id(&self) -> Option<String>;

    /// Current composer text, empty when the composer shows its placeholder.
    fn input_value(&self) -> String;

    /// Append `text` to the composer and notify the page.
    fn add_to_input(&self, text: &str);
}

pub fn adapter_for(platform: Platform, page: Arc<dyn HostPage>) -> Arc<dyn PlatformAdapter> {
    match platform {
        Platform::ChatGpt => Arc::new(ChatGptAdapter::new(page)),
        Platform::Gemini => Arc::new(GeminiAdapter::new(page)),
    }
}

/// Path segment following `marker` in `url`, e.g. the id in `/c/<id>`.
pub(crate) fn path_segment_after(url: &str, marker: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?;
    segments.by_ref().find(|segment| *segment == marker)?;
    segments
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
