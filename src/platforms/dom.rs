use crate::error::PageError;
use scraper::{ElementRef, Selector};

pub(crate) fn selector(css: &str) -> Result<Selector, PageError> {
    Selector::parse(css).map_err(|e| PageError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Inner HTML of `element` as trimmed Markdown.
pub(crate) fn element_markdown(element: ElementRef<'_>) -> Result<String, PageError> {
    let markdown =
        htmd::convert(&element.inner_html()).map_err(|e| PageError::Convert(e.to_string()))?;
    Ok(markdown.trim().to_string())
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

pub(crate) fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}
