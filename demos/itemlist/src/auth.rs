//! Password hashing and user lookup.
//!
//! Passwords are stored as Argon2id PHC strings. Hashing runs on the
//! blocking pool.

use docforms_document::{Document, DocumentStore, Filter, Query};

use crate::error::{AppError, AppResult};
use crate::models::user_schema;

/// Hashes a password with Argon2id and a random salt.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        use argon2::password_hash::{rand_core::OsRng, PasswordHasher as _, SaltString};
        use argon2::Argon2;

        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Hashing(format!("Argon2 hash error: {e}")))
    })
    .await
    .map_err(|e| AppError::Hashing(format!("Task join error: {e}")))?
}

/// Checks a password against a stored hash. A malformed hash never matches.
pub async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || {
        use argon2::password_hash::{PasswordHash, PasswordVerifier};
        use argon2::Argon2;

        let Ok(parsed) = PasswordHash::new(&hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| AppError::Hashing(format!("Task join error: {e}")))
}

/// Finds a user by username.
pub async fn find_user(store: &dyn DocumentStore, username: &str) -> AppResult<Option<Document>> {
    let query =
        Query::new(user_schema().collection()).filter(Filter::equals("username", username));
    Ok(store.find(&query).await?.into_iter().next())
}

/// Returns the user when the credentials match.
pub async fn authenticate(
    store: &dyn DocumentStore,
    username: &str,
    password: &str,
) -> AppResult<Option<Document>> {
    let Some(user) = find_user(store, username).await? else {
        tracing::debug!(username, "login for unknown user");
        return Ok(None);
    };
    let hash = user.get("password").as_str().unwrap_or_default().to_string();
    if verify_password(password, &hash).await? {
        Ok(Some(user))
    } else {
        tracing::debug!(username, "login with wrong password");
        Ok(None)
    }
}

/// Creates and stores a user with a hashed password.
pub async fn create_user(
    store: &dyn DocumentStore,
    username: &str,
    email: &str,
    password: &str,
) -> AppResult<Document> {
    let mut user = Document::new(user_schema());
    user.set("username", username);
    user.set("email", email);
    user.set("password", hash_password(password).await?);
    store.save(&mut user).await?;
    tracing::info!(username, "user created");
    Ok(user)
}
