//! # docforms-core
//!
//! Foundation types shared by the docforms crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Settings and the global configuration slot
//! - [`settings_loader`] - Loading settings from TOML, JSON and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`utils`] - `MultiValueDict` and text helpers

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

pub use error::{DocFormsError, DocFormsResult, ValidationError, NON_FIELD_ERRORS};
pub use settings::{Settings, SETTINGS};
