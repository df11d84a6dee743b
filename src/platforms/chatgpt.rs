//! ChatGPT (`chatgpt.com`, `chat.openai.com`).
//!
//! Turns are `article[data-turn]` elements. An assistant article only counts
//! once its feedback button has rendered, which happens after streaming
//! completes.

use super::dom::{element_markdown, element_text, has_class, selector};
use super::page::{ComposerEdit, HostPage, PlaceholderStyle};
use super::{Platform, PlatformAdapter, path_segment_after};
use crate::error::PageError;
use crate::sync::ConversationTurn;
use scraper::Html;
use std::sync::Arc;

const TURN: &str = "article[data-turn]";
const USER_MESSAGE: &str = r#"div[data-message-author-role="user"]"#;
const ASSISTANT_MESSAGE: &str = r#"div[data-message-author-role="assistant"]"#;
const FINISHED_MARKER: &str = r#"button[data-testid="good-response-turn-action-button"]"#;
const COMPOSER: &str = "#prompt-textarea";
const PLACEHOLDER_CLASS: &str = "placeholder";

pub struct ChatGptAdapter {
    page: Arc<dyn HostPage>,
}

impl ChatGptAdapter {
    pub fn new(page: Arc<dyn HostPage>) -> Self {
        Self { page }
    }

    fn try_extract(&self) -> Result<Vec<ConversationTurn>, PageError> {
        let document = Html::parse_document(&self.page.document_html()?);
        let turn_sel = selector(TURN)?;
        let user_sel = selector(USER_MESSAGE)?;
        let assistant_sel = selector(ASSISTANT_MESSAGE)?;
        let finished_sel = selector(FINISHED_MARKER)?;

        let mut turns = Vec::new();
        for article in document.select(&turn_sel) {
            match article.value().attr("data-turn") {
                Some("user") => {
                    if let Some(message) = article.select(&user_sel).next() {
                        turns.push(ConversationTurn::user(element_markdown(message)?));
                    }
                }
                Some("assistant") => {
                    let finished = article.select(&finished_sel).next().is_some();
                    if finished && let Some(message) = article.select(&assistant_sel).next() {
                        turns.push(ConversationTurn::assistant(element_markdown(message)?));
                    }
                }
                _ => {}
            }
        }
        Ok(turns)
    }

    fn try_input_value(&self) -> Result<String, PageError> {
        let document = Html::parse_document(&self.page.document_html()?);
        let composer_sel = selector(COMPOSER)?;
        let paragraph_sel = selector("p")?;

        let Some(editor) = document.select(&composer_sel).next() else {
            tracing::warn!("ChatGPT composer not found");
            return Ok(String::new());
        };

        match editor.select(&paragraph_sel).next() {
            Some(p) if has_class(p, PLACEHOLDER_CLASS) => Ok(String::new()),
            Some(p) => Ok(element_text(p)),
            None => Ok(element_text(editor)),
        }
    }
}

impl PlatformAdapter for ChatGptAdapter {
    fn platform(&self) -> Platform {
        Platform::ChatGpt
    }

    fn extract_conversation(&self) -> Vec<ConversationTurn> {
        self.try_extract().unwrap_or_else(|error| {
            tracing::error!(%error, "failed to extract ChatGPT conversation");
            Vec::new()
        })
    }

    /// `https://chatgpt.com/c/68ef5240-9070-8324-80a8-f6793b34b6da`
    fn conversation_id(&self) -> Option<String> {
        path_segment_after(&self.page.url(), "c")
    }

    fn input_value(&self) -> String {
        self.try_input_value().unwrap_or_else(|error| {
            tracing::error!(%error, "failed to read ChatGPT input");
            String::new()
        })
    }

    fn add_to_input(&self, text: &str) {
        let edit = ComposerEdit {
            selector: COMPOSER,
            placeholder: PlaceholderStyle::Class(PLACEHOLDER_CLASS),
            create_paragraph: false,
            text: text.to_string(),
        };
        if let Err(error) = self.page.apply_composer_edit(&edit) {
            tracing::error!(%error, "failed to set ChatGPT input");
        }
    }
}
