//! Gemini (`gemini.google.com`).
//!
//! The transcript is the children of `infinite-scroller.chat-history`. A
//! child may hold a `user-query-content`, a `message-content`, or both; the
//! response counts once `message-actions` has rendered next to it.

use super::dom::{element_markdown, element_text, selector};
use super::page::{ComposerEdit, HostPage, PlaceholderStyle};
use super::{Platform, PlatformAdapter, path_segment_after};
use crate::error::PageError;
use crate::sync::ConversationTurn;
use scraper::{ElementRef, Html};
use std::sync::Arc;

const CHAT_HISTORY: &str = "infinite-scroller.chat-history";
const USER_QUERY: &str = "user-query-content";
const MODEL_RESPONSE: &str = "message-content";
const FINISHED_MARKER: &str = "message-actions";
const COMPOSER: &str = ".ql-editor[contenteditable='true']";

pub struct GeminiAdapter {
    page: Arc<dyn HostPage>,
}

impl GeminiAdapter {
    pub fn new(page: Arc<dyn HostPage>) -> Self {
        Self { page }
    }

    fn try_extract(&self) -> Result<Vec<ConversationTurn>, PageError> {
        let document = Html::parse_document(&self.page.document_html()?);
        let history_sel = selector(CHAT_HISTORY)?;
        let user_sel = selector(USER_QUERY)?;
        let response_sel = selector(MODEL_RESPONSE)?;
        let finished_sel = selector(FINISHED_MARKER)?;

        let Some(history) = document.select(&history_sel).next() else {
            tracing::warn!("Gemini chat history not found");
            return Ok(Vec::new());
        };

        let mut turns = Vec::new();
        for turn in history.children().filter_map(ElementRef::wrap) {
            if let Some(query) = turn.select(&user_sel).next() {
                turns.push(ConversationTurn::user(element_markdown(query)?));
            }

            let finished = turn.select(&finished_sel).next().is_some();
            if finished && let Some(response) = turn.select(&response_sel).next() {
                turns.push(ConversationTurn::assistant(element_markdown(response)?));
            }
        }
        Ok(turns)
    }

    fn try_input_value(&self) -> Result<String, PageError> {
        let document = Html::parse_document(&self.page.document_html()?);
        let composer_sel = selector(COMPOSER)?;
        let paragraph_sel = selector("p")?;
        let break_sel = selector("br")?;

        let Some(editor) = document.select(&composer_sel).next() else {
            tracing::warn!("Gemini composer not found");
            return Ok(String::new());
        };

        let Some(p) = editor.select(&paragraph_sel).next() else {
            return Ok(element_text(editor));
        };
        let lone_break = p.select(&break_sel).next().is_some() && p.children().count() == 1;
        if lone_break {
            return Ok(String::new());
        }
        Ok(element_text(p))
    }
}

impl PlatformAdapter for GeminiAdapter {
    fn platform(&self) -> Platform {
        Platform::Gemini
    }

    fn extract_conversation(&self) -> Vec<ConversationTurn> {
        self.try_extract().unwrap_or_else(|error| {
            tracing::error!(%error, "failed to extract Gemini conversation");
            Vec::new()
        })
    }

    /// `https://gemini.google.com/app/e42441d556a9debc`
    fn conversation_id(&self) -> Option<String> {
        path_segment_after(&self.page.url(), "app")
    }

    fn input_value(&self) -> String {
        self.try_input_value().unwrap_or_else(|error| {
            tracing::error!(%error, "failed to read Gemini input");
            String::new()
        })
    }

    fn add_to_input(&self, text: &str) {
        let edit = ComposerEdit {
            selector: COMPOSER,
            placeholder: PlaceholderStyle::LoneBreak,
            create_paragraph: true,
            text: text.to_string(),
        };
        if let Err(error) = self.page.apply_composer_edit(&edit) {
            tracing::error!(%error, "failed to set Gemini input");
        }
    }
}
