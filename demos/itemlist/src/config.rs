//! Command line and settings loading.
//!
//! Settings come from `--config` (TOML, or JSON by extension) when given,
//! otherwise from defaults; `DOCFORMS_*` variables override either, and
//! `--addr` overrides the listen address last.

use std::path::PathBuf;

use clap::Parser;

use docforms_core::settings_loader;
use docforms_core::{DocFormsResult, Settings};

/// Serves the item list.
#[derive(Debug, Parser)]
#[command(name = "itemlist", version, about = "A per-user item list with picture uploads")]
pub struct Cli {
    /// Settings file (`.toml` or `.json`).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to listen on, overriding the settings.
    #[arg(long, value_name = "HOST:PORT")]
    pub addr: Option<String>,
}

/// Resolves the settings described by the command line.
pub fn load_settings(cli: &Cli) -> DocFormsResult<Settings> {
    let mut settings = match &cli.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading settings");
            settings_loader::from_file_with_env(path)?
        }
        None => settings_loader::from_env(),
    };
    if let Some(addr) = &cli.addr {
        settings.listen_addr.clone_from(addr);
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::parse_from(["itemlist", "--config", "list.toml", "--addr", "0.0.0.0:9000"]);
        assert_eq!(cli.config, Some(PathBuf::from("list.toml")));
        assert_eq!(cli.addr.as_deref(), Some("0.0.0.0:9000"));

        let cli = Cli::parse_from(["itemlist"]);
        assert!(cli.config.is_none());
        assert!(cli.addr.is_none());
    }

    #[test]
    fn test_load_settings_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.toml");
        std::fs::write(
            &path,
            r#"
debug = false
log_level = "debug"
session_cookie_name = "listsession"
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(path),
            addr: Some("127.0.0.1:9999".into()),
        };
        let settings = load_settings(&cli).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.session_cookie_name, "listsession");
        assert_eq!(settings.listen_addr, "127.0.0.1:9999");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/list.toml")),
            addr: None,
        };
        assert!(load_settings(&cli).is_err());
    }
}
