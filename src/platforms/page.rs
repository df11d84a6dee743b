//! The live page as seen by an adapter.
//!
//! Browser bindings implement [`HostPage`] over the real DOM. [`SnapshotPage`]
//! implements it over serialized HTML, optionally backed by a file that is
//! re-read on every access so an external process can keep it current.

use super::dom;
use crate::error::PageError;
use scraper::node::{Node, Text};
use scraper::{ElementRef, Html};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// How a composer marks its empty state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// The paragraph carries this class while empty.
    Class(&'static str),
    /// The paragraph holds a lone `<br>` while empty.
    LoneBreak,
}

/// Text insertion into a platform composer.
///
/// Hosts must: focus the element matched by `selector`; locate its first
/// paragraph (creating one when `create_paragraph` is set, otherwise
/// writing into the element itself); clear the empty-state marker described
/// by `placeholder`; append `text` after the existing content; collapse the
/// caret right after the inserted text; dispatch a bubbling `input` event on
/// the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerEdit {
    pub selector: &'static str,
    pub placeholder: PlaceholderStyle,
    pub create_paragraph: bool,
    pub text: String,
}

/// Caret left behind by the last composer edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretPosition {
    pub selector: String,
    /// Offset in characters from the start of the edited paragraph
    pub offset: usize,
}

pub trait HostPage: Send + Sync {
    fn url(&self) -> String;

    /// Serialized current document.
    fn document_html(&self) -> Result<String, PageError>;

    fn title(&self) -> Option<String> {
        let html = self.document_html().ok()?;
        let document = Html::parse_document(&html);
        let selector = dom::selector("title").ok()?;
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    fn apply_composer_edit(&self, edit: &ComposerEdit) -> Result<(), PageError>;
}

#[derive(Debug, Default)]
struct SnapshotState {
    url: String,
    html: String,
    focused: Option<String>,
    caret: Option<CaretPosition>,
    input_events: Vec<String>,
}

/// [`HostPage`] over an HTML snapshot.
#[derive(Debug)]
pub struct SnapshotPage {
    state: Mutex<SnapshotState>,
    source: Option<PathBuf>,
}

impl SnapshotPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(SnapshotState {
                url: url.into(),
                html: html.into(),
                ..SnapshotState::default()
            }),
            source: None,
        }
    }

    /// Page whose document is the contents of `path`; edits are written back.
    pub fn from_file(url: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self, PageError> {
        let path = path.into();
        let html = std::fs::read_to_string(&path)?;
        Ok(Self {
            state: Mutex::new(SnapshotState {
                url: url.into(),
                html,
                ..SnapshotState::default()
            }),
            source: Some(path),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SnapshotState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn refresh(&self, state: &mut SnapshotState) -> Result<(), PageError> {
        if let Some(path) = &self.source {
            state.html = std::fs::read_to_string(path)?;
        }
        Ok(())
    }

    /// Replace the document, as a host page re-rendering would.
    pub fn set_html(&self, html: impl Into<String>) {
        self.lock().html = html.into();
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.lock().url = url.into();
    }

    pub fn focused(&self) -> Option<String> {
        self.lock().focused.clone()
    }

    pub fn caret(&self) -> Option<CaretPosition> {
        self.lock().caret.clone()
    }

    /// Selectors of the composers that received an `input` event, in order.
    pub fn input_events(&self) -> Vec<String> {
        self.lock().input_events.clone()
    }
}

impl HostPage for SnapshotPage {
    fn url(&self) -> String {
        self.lock().url.clone()
    }

    fn document_html(&self) -> Result<String, PageError> {
        let mut state = self.lock();
        self.refresh(&mut state)?;
        Ok(state.html.clone())
    }

    fn apply_composer_edit(&self, edit: &ComposerEdit) -> Result<(), PageError> {
        let mut state = self.lock();
        self.refresh(&mut state)?;

        let mut document = Html::parse_document(&state.html);
        let offset = insert_into_composer(&mut document, edit)?;

        state.html = document.html();
        state.focused = Some(edit.selector.to_string());
        state.caret = Some(CaretPosition {
            selector: edit.selector.to_string(),
            offset,
        });
        state.input_events.push(edit.selector.to_string());

        if let Some(path) = &self.source {
            std::fs::write(path, &state.html)?;
        }
        Ok(())
    }
}

/// Apply `edit` to `document`, returning the caret offset after the text.
fn insert_into_composer(document: &mut Html, edit: &ComposerEdit) -> Result<usize, PageError> {
    let editor_selector = dom::selector(edit.selector)?;
    let paragraph_selector = dom::selector("p")?;
    let break_selector = dom::selector("br")?;

    let editor = document
        .select(&editor_selector)
        .next()
        .ok_or_else(|| PageError::ComposerNotFound(edit.selector.to_string()))?;
    let editor_id = editor.id();
    let existing = editor.select(&paragraph_selector).next().map(|p| {
        let cleared = match edit.placeholder {
            PlaceholderStyle::Class(class) if p.value().classes().any(|c| c == class) => {
                Some(attrs_without_class(p, class))
            }
            _ => None,
        };
        let first_break = match edit.placeholder {
            PlaceholderStyle::LoneBreak => p.select(&break_selector).next().map(|br| br.id()),
            PlaceholderStyle::Class(_) => None,
        };
        (p.id(), cleared, first_break)
    });

    let target_id = match existing {
        Some((paragraph_id, cleared, first_break)) => {
            if let Some(attrs) = cleared {
                // Swap the element value only; children stay attached.
                let replacement = paragraph(&attrs)?;
                if let Some(mut node) = document.tree.get_mut(paragraph_id) {
                    *node.value() = replacement;
                }
            }
            if let Some(break_id) = first_break
                && let Some(mut node) = document.tree.get_mut(break_id)
            {
                node.detach();
            }
            paragraph_id
        }
        None if edit.create_paragraph => {
            let bare = paragraph(&[])?;
            let mut editor = document
                .tree
                .get_mut(editor_id)
                .ok_or_else(|| PageError::ComposerNotFound(edit.selector.to_string()))?;
            editor.append(bare).id()
        }
        None => editor_id,
    };

    let mut target = document
        .tree
        .get_mut(target_id)
        .ok_or_else(|| PageError::ComposerNotFound(edit.selector.to_string()))?;
    target.append(Node::Text(Text {
        text: edit.text.as_str().into(),
    }));

    let offset = document
        .tree
        .get(target_id)
        .and_then(ElementRef::wrap)
        .map_or(0, |el| el.text().map(|t| t.chars().count()).sum());
    Ok(offset)
}

/// Attributes of `element` with `class` removed from its class list.
fn attrs_without_class(element: ElementRef<'_>, class: &str) -> Vec<(String, String)> {
    element
        .value()
        .attrs()
        .filter_map(|(name, value)| {
            if name != "class" {
                return Some((name.to_string(), value.to_string()));
            }
            let remaining = value
                .split_ascii_whitespace()
                .filter(|c| *c != class)
                .collect::<Vec<_>>()
                .join(" ");
            (!remaining.is_empty()).then(|| (name.to_string(), remaining))
        })
        .collect()
}

fn paragraph(attrs: &[(String, String)]) -> Result<Node, PageError> {
    let rendered = attrs
        .iter()
        .map(|(name, value)| {
            let value = value.replace('&', "&amp;").replace('"', "&quot;");
            format!(" {name}=\"{value}\"")
        })
        .collect::<String>();
    let fragment = Html::parse_fragment(&format!("<p{rendered}></p>"));
    let selector = dom::selector("p")?;
    fragment
        .select(&selector)
        .next()
        .map(|p| Node::Element(p.value().clone()))
        .ok_or_else(|| PageError::ComposerNotFound("p".to_string()))
}
