//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `DOCFORMS_DEBUG` | `debug` |
//! | `DOCFORMS_LOG_LEVEL` | `log_level` |
//! | `DOCFORMS_DATABASE_NAME` | `database_name` |
//! | `DOCFORMS_BLOB_NAMESPACE` | `blob_namespace` |
//! | `DOCFORMS_LISTEN_ADDR` | `listen_addr` |
//! | `DOCFORMS_SESSION_COOKIE_NAME` | `session_cookie_name` |
//! | `DOCFORMS_SESSION_COOKIE_AGE` | `session_cookie_age` |
//! | `DOCFORMS_FORMSET_MAX_NUM` | `formsets.max_num` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use docforms_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/itemlist.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::DocFormsError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Keys missing from the TOML keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, DocFormsError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| DocFormsError::Configuration(format!("Failed to parse TOML: {e}")))?;
    merge_into_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, DocFormsError> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, DocFormsError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<Settings, DocFormsError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| DocFormsError::Configuration(format!("Failed to parse JSON: {e}")))?;
    merge_into_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, DocFormsError> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// Loads settings from a JSON file and then applies environment overrides.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<Settings, DocFormsError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads a settings file, picking the format from its extension.
///
/// `.json` files are parsed as JSON, everything else as TOML.
pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Settings, DocFormsError> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => from_json_file_with_env(path),
        _ => from_toml_file_with_env(path),
    }
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `DOCFORMS_*` environment variable overrides.
///
/// Numeric variables that fail to parse are ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("DOCFORMS_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Ok(val) = std::env::var("DOCFORMS_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("DOCFORMS_DATABASE_NAME") {
        settings.database_name = val;
    }

    if let Ok(val) = std::env::var("DOCFORMS_BLOB_NAMESPACE") {
        settings.blob_namespace = val;
    }

    if let Ok(val) = std::env::var("DOCFORMS_LISTEN_ADDR") {
        settings.listen_addr = val;
    }

    if let Ok(val) = std::env::var("DOCFORMS_SESSION_COOKIE_NAME") {
        settings.session_cookie_name = val;
    }

    if let Ok(val) = std::env::var("DOCFORMS_SESSION_COOKIE_AGE") {
        if let Ok(age) = val.parse::<u64>() {
            settings.session_cookie_age = age;
        }
    }

    if let Ok(val) = std::env::var("DOCFORMS_FORMSET_MAX_NUM") {
        if let Ok(max) = val.parse::<usize>() {
            settings.formsets.max_num = max;
        }
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_config(path: &Path, format: &str) -> Result<String, DocFormsError> {
    std::fs::read_to_string(path).map_err(|e| {
        DocFormsError::Configuration(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_into_defaults(value: serde_json::Value, format: &str) -> Result<Settings, DocFormsError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        DocFormsError::Configuration(format!("Failed to serialize default settings: {e}"))
    })?;
    serde_json::from_value(merge_json(default_json, value)).map_err(|e| {
        DocFormsError::Configuration(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values. `override_val` wins.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = match base_map.remove(&key) {
                    Some(base_v) => merge_json(base_v, override_v),
                    None => override_v,
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            blob_namespace = "pictures"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.blob_namespace, "pictures");
        assert_eq!(settings.login_url, "/auth/login/");
    }

    #[test]
    fn test_from_toml_str_nested_formsets() {
        let toml = r"
            [formsets]
            max_num = 10
        ";

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.formsets.max_num, 10);
        // Siblings keep their defaults.
        assert_eq!(settings.formsets.extra, 1);
        assert_eq!(settings.formsets.absolute_max, 2000);
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.database_name, "list");
    }

    #[test]
    fn test_from_toml_str_invalid() {
        assert!(matches!(
            from_toml_str("[[invalid toml content"),
            Err(DocFormsError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        assert!(from_toml_str("session_cookie_age = \"soon\"").is_err());
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{"log_level": "debug", "listen_addr": "0.0.0.0:9000"}"#;
        let settings = from_json_str(json).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.listen_addr, "0.0.0.0:9000");
        assert_eq!(settings.blob_namespace, "fs");
    }

    #[test]
    fn test_from_json_str_extra() {
        let json = r#"{"extra": {"site_title": "My list"}}"#;
        let settings = from_json_str(json).unwrap();
        assert_eq!(settings.extra["site_title"], "My list");
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{invalid json").is_err());
    }

    // ── File loading ────────────────────────────────────────────────

    #[test]
    fn test_from_file_picks_format() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("settings.toml");
        std::fs::write(&toml_path, "database_name = \"from-toml\"").unwrap();
        let json_path = dir.path().join("settings.json");
        std::fs::write(&json_path, r#"{"database_name": "from-json"}"#).unwrap();

        assert_eq!(from_file_with_env(&toml_path).unwrap().database_name, "from-toml");
        assert_eq!(from_file_with_env(&json_path).unwrap().database_name, "from-json");
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = from_toml_file("/nonexistent/path/settings.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read TOML file"));
    }

    #[test]
    fn test_from_json_file_missing() {
        assert!(from_json_file("/nonexistent/path/settings.json").is_err());
    }

    // ── Environment variable overrides ──────────────────────────────
    //
    // Each test touches its own variable so they can run in parallel.

    #[test]
    fn test_env_blob_namespace() {
        let mut settings = Settings::default();
        std::env::set_var("DOCFORMS_BLOB_NAMESPACE", "env-ns");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.blob_namespace, "env-ns");
        std::env::remove_var("DOCFORMS_BLOB_NAMESPACE");
    }

    #[test]
    fn test_env_debug_values() {
        let mut settings = Settings::default();
        std::env::set_var("DOCFORMS_DEBUG", "no");
        apply_env_overrides(&mut settings);
        assert!(!settings.debug);
        std::env::set_var("DOCFORMS_DEBUG", "1");
        apply_env_overrides(&mut settings);
        assert!(settings.debug);
        std::env::remove_var("DOCFORMS_DEBUG");
    }

    #[test]
    fn test_env_session_cookie_age_invalid() {
        let mut settings = Settings::default();
        std::env::set_var("DOCFORMS_SESSION_COOKIE_AGE", "not-a-number");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.session_cookie_age, 1_209_600);
        std::env::remove_var("DOCFORMS_SESSION_COOKIE_AGE");
    }

    #[test]
    fn test_env_formset_max_num() {
        let mut settings = Settings::default();
        std::env::set_var("DOCFORMS_FORMSET_MAX_NUM", "25");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.formsets.max_num, 25);
        std::env::remove_var("DOCFORMS_FORMSET_MAX_NUM");
    }

    #[test]
    fn test_toml_file_with_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings_env.toml");
        std::fs::write(&path, "listen_addr = \"127.0.0.1:1\"").unwrap();

        std::env::set_var("DOCFORMS_LISTEN_ADDR", "127.0.0.1:2");
        let settings = from_toml_file_with_env(&path).unwrap();
        assert_eq!(settings.listen_addr, "127.0.0.1:2");
        std::env::remove_var("DOCFORMS_LISTEN_ADDR");
    }

    // ── Helpers ─────────────────────────────────────────────────────

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"outer": {"a": 1, "b": 2}, "list": [1, 2]});
        let over = serde_json::json!({"outer": {"b": 3}, "list": [4]});
        let merged = merge_json(base, over);
        assert_eq!(merged["outer"]["a"], 1);
        assert_eq!(merged["outer"]["b"], 3);
        assert_eq!(merged["list"], serde_json::json!([4]));
    }

    #[test]
    fn test_toml_to_json() {
        let toml_val: toml::Value = toml::from_str(
            r#"
            name = "test"
            count = 42
            [nested]
            key = "value"
        "#,
        )
        .unwrap();

        let json = toml_to_json(toml_val);
        assert_eq!(json["name"], "test");
        assert_eq!(json["count"], 42);
        assert_eq!(json["nested"]["key"], "value");
    }
}
