//! Settings for docforms and applications built on it.
//!
//! [`Settings`] holds library defaults (blob namespace, formset limits) and
//! the knobs the item-list application reads (listen address, session
//! cookie, login URL). [`SETTINGS`] is a process-wide, set-once instance.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Limits applied to formsets when a form does not override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormsetSettings {
    /// Number of blank forms rendered after the existing ones.
    pub extra: usize,
    /// Maximum number of forms accepted by validation.
    pub max_num: usize,
    /// Hard cap on `TOTAL_FORMS`, whatever the submission claims.
    pub absolute_max: usize,
}

impl Default for FormsetSettings {
    fn default() -> Self {
        Self {
            extra: 1,
            max_num: 1000,
            absolute_max: 2000,
        }
    }
}

/// The complete set of settings.
///
/// # Examples
///
/// ```
/// use docforms_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.blob_namespace, "fs");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,
    /// The log filter directive (e.g. "info", "docforms_forms=debug").
    pub log_level: String,

    // ── Storage ──────────────────────────────────────────────────────

    /// Name of the document database.
    pub database_name: String,
    /// Default blob namespace for file fields that do not name one.
    pub blob_namespace: String,

    // ── Forms ────────────────────────────────────────────────────────

    /// Formset defaults.
    pub formsets: FormsetSettings,

    // ── Web ──────────────────────────────────────────────────────────

    /// Address the item-list server binds to.
    pub listen_addr: String,
    /// The name of the session cookie.
    pub session_cookie_name: String,
    /// The session cookie max age in seconds.
    pub session_cookie_age: u64,
    /// Where anonymous users are sent to log in.
    pub login_url: String,
    /// Where users land after login when no `next` is given.
    pub login_redirect_url: String,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),

            database_name: "list".to_string(),
            blob_namespace: "fs".to_string(),

            formsets: FormsetSettings::default(),

            listen_addr: "127.0.0.1:8000".to_string(),
            session_cookie_name: "sessionid".to_string(),
            session_cookie_age: 1_209_600, // 2 weeks
            login_url: "/auth/login/".to_string(),
            login_redirect_url: "/item/".to_string(),

            extra: HashMap::new(),
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup, then read
/// through [`get`](LazySettings::get). Library code that runs before
/// configuration (tests, tools) uses [`get_or_default`](LazySettings::get_or_default).
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called exactly once.
    ///
    /// # Panics
    ///
    /// Panics if settings have already been configured.
    pub fn configure(&self, settings: Settings) {
        self.inner
            .set(settings)
            .expect("Settings have already been configured");
    }

    /// Returns a reference to the configured settings.
    ///
    /// # Panics
    ///
    /// Panics if settings have not been configured.
    pub fn get(&self) -> &Settings {
        self.inner
            .get()
            .expect("Settings have not been configured. Call SETTINGS.configure() first.")
    }

    /// Returns the configured settings, installing the defaults if nothing
    /// was configured yet.
    pub fn get_or_default(&self) -> &Settings {
        self.inner.get_or_init(Settings::default)
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();
