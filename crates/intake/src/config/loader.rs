use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

/// Loads `path` if given, otherwise the default config file if it exists,
/// otherwise the built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = path {
        return load_config(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            log::info!("Loading config from {}", path.display());
            load_config(path)
        }
        _ => {
            log::info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Returns `~/.contact-intake/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".contact-intake").join("config.json"))
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.mailbox.subject_filter.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "mailbox.subject_filter must not be empty".to_string(),
        });
    }

    if config.mailbox.subject_filter.contains('"') {
        return Err(ConfigError::Validation {
            message: "mailbox.subject_filter must not contain double quotes".to_string(),
        });
    }

    if config.mailbox.poll_interval_secs == 0 {
        return Err(ConfigError::Validation {
            message: "mailbox.poll_interval_secs must be greater than zero".to_string(),
        });
    }

    if config.mailbox.recent_max_results == 0 || config.mailbox.full_import_page_size == 0 {
        return Err(ConfigError::Validation {
            message: "mailbox page sizes must be greater than zero".to_string(),
        });
    }

    if config.bind_address.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Validation {
            message: format!("Invalid bind_address: {}", config.bind_address),
        });
    }

    if config.export.max_column_width == 0 {
        return Err(ConfigError::Validation {
            message: "export.max_column_width must be greater than zero".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_config() {
        let config = load_config_from_str(r#"{"version": "1.0"}"#).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:5000");
        assert_eq!(config.mailbox.recent_window_minutes, 2880);
    }

    #[test]
    fn test_load_full_config() {
        let json = r#"{
            "version": "1.0",
            "database_path": "/tmp/contacts.db",
            "bind_address": "0.0.0.0:8080",
            "mailbox": {
                "subject_filter": "Job Application",
                "poll_interval_secs": 60,
                "recent_window_minutes": 30
            },
            "gmail": {
                "client_id": {"value": "abc.apps.googleusercontent.com"},
                "client_secret": {"file": "~/.secrets/gmail"},
                "refresh_token": {"env_var": "MY_REFRESH"}
            }
        }"#;

        let config = load_config_from_str(json).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/contacts.db"));
        assert_eq!(config.mailbox.subject_filter, "Job Application");
        assert_eq!(config.mailbox.poll_interval_secs, 60);
        assert_eq!(config.mailbox.recent_max_results, 50);
        assert_eq!(
            config.gmail.client_secret.file.as_deref(),
            Some("~/.secrets/gmail")
        );
        assert_eq!(config.gmail.refresh_token.env_var.as_deref(), Some("MY_REFRESH"));
        assert_eq!(config.gmail.user_id, "me");
    }

    #[test]
    fn test_rejects_unknown_version() {
        let err = load_config_from_str(r#"{"version": "2.0"}"#).unwrap_err();
        assert!(err.to_string().contains("Unsupported config version"));
    }

    #[test]
    fn test_rejects_empty_subject_filter() {
        let err = load_config_from_str(r#"{"mailbox": {"subject_filter": "  "}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_rejects_quoted_subject_filter() {
        let result = load_config_from_str(r#"{"mailbox": {"subject_filter": "a\"b"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let result = load_config_from_str(r#"{"mailbox": {"poll_interval_secs": 0}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_bind_address() {
        let result = load_config_from_str(r#"{"bind_address": "localhost"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_json() {
        let err = load_config_from_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseJson(_)));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/config.json").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_or_default_with_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"bind_address": "127.0.0.1:9000"}"#).unwrap();

        let config = load_or_default(Some(&path)).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9000");
    }
}
