//! Shared application state.

use std::sync::Arc;

use docforms_core::Settings;
use docforms_forms::Stores;

use crate::session::SessionStore;

/// State handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Document and blob stores.
    pub stores: Stores,
    /// Server-side sessions.
    pub sessions: Arc<SessionStore>,
    /// Application settings.
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Builds state over the given stores.
    pub fn new(settings: Settings, stores: Stores) -> Self {
        Self {
            stores,
            sessions: Arc::new(SessionStore::new()),
            settings: Arc::new(settings),
        }
    }

    /// State over fresh in-memory stores.
    pub fn memory(settings: Settings) -> Self {
        Self::new(settings, Stores::memory())
    }
}
