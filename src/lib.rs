#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod actions;
pub mod config;
pub mod error;
pub mod platforms;
pub mod remote;
pub mod storage;
pub mod sync;

pub use config::Config;
pub use error::{CoreSyncError, Result};
