//! Cookie-keyed server-side sessions.
//!
//! The browser holds only a random session key; the data lives in a
//! [`SessionStore`]. Logging in always starts a fresh session so a key
//! handed out before authentication never becomes an authenticated one.

use std::collections::HashMap;

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::RwLock;

use docforms_document::DocumentId;

/// Session key holding the logged-in user's identity.
pub const USER_KEY: &str = "_auth_user_id";
/// Session key holding where to go after logging in.
pub const NEXT_KEY: &str = "next";

const SESSION_KEY_LENGTH: usize = 32;

/// Data associated with one session.
#[derive(Debug, Clone)]
pub struct SessionData {
    /// The key the browser presents in its cookie.
    pub session_key: String,
    data: HashMap<String, serde_json::Value>,
    /// When the session stops being accepted.
    pub expire_date: DateTime<Utc>,
}

impl SessionData {
    /// An empty session under a new random key.
    pub fn new(lifetime_seconds: u64) -> Self {
        let lifetime = i64::try_from(lifetime_seconds).unwrap_or(i64::MAX);
        Self {
            session_key: generate_session_key(),
            data: HashMap::new(),
            expire_date: Utc::now() + Duration::seconds(lifetime),
        }
    }

    /// Gets a value by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// A string value by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(serde_json::Value::as_str)
    }

    /// Sets a value.
    pub fn set(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.data.insert(key.to_string(), value.into());
    }

    /// Removes a value.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    /// Returns `true` once the expiry date has passed.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expire_date
    }

    /// The logged-in user, if any.
    pub fn user_id(&self) -> Option<DocumentId> {
        self.get_str(USER_KEY).and_then(|id| id.parse().ok())
    }
}

fn generate_session_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_KEY_LENGTH)
        .map(char::from)
        .collect()
}

/// In-memory session storage.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an unexpired session.
    pub async fn load(&self, session_key: &str) -> Option<SessionData> {
        self.sessions
            .read()
            .await
            .get(session_key)
            .filter(|s| !s.is_expired())
            .cloned()
    }

    /// Stores a session, replacing any earlier copy under the same key.
    pub async fn save(&self, session: &SessionData) {
        self.sessions
            .write()
            .await
            .insert(session.session_key.clone(), session.clone());
    }

    /// Forgets a session.
    pub async fn delete(&self, session_key: &str) {
        self.sessions.write().await.remove(session_key);
    }

    /// Drops every expired session.
    pub async fn clear_expired(&self) {
        self.sessions
            .write()
            .await
            .retain(|_, session| !session.is_expired());
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` when no session is stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Reads the value of cookie `name` from request headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// A `Set-Cookie` value carrying a session key.
pub fn session_cookie(name: &str, session: &SessionData, max_age: u64) -> String {
    format!(
        "{name}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
        session.session_key
    )
}

/// A `Set-Cookie` value that removes the session cookie.
pub fn expired_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
