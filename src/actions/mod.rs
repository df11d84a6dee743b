//! User-triggered actions outside the sync loop.

mod improve_prompt;
mod save_selection;

pub use improve_prompt::{ImproveOutcome, improve_prompt};
pub use save_selection::{SaveStatus, save_selection};
