//! # itemlist
//!
//! A per-user list of items, each with optional picture, served over HTTP.
//! Items are edited through a docforms document form; pictures go to the
//! blob store.
//!
//! ## Running
//!
//! ```bash
//! cargo run --package itemlist -- --addr 127.0.0.1:8000
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod render;
pub mod session;
pub mod state;
pub mod urls;
pub mod views;

pub use error::{AppError, AppResult};
pub use state::AppState;
pub use urls::router;
