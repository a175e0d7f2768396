use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub mailbox: MailboxConfig,
    #[serde(default)]
    pub gmail: GmailConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// `~/.contact-intake/data/contacts.db`, or `contacts.db` in the working
/// directory when no home directory is known.
pub fn default_database_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".contact-intake").join("data").join("contacts.db"))
        .unwrap_or_else(|| PathBuf::from("contacts.db"))
}

fn default_bind_address() -> String {
    "127.0.0.1:5000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            database_path: default_database_path(),
            bind_address: default_bind_address(),
            mailbox: MailboxConfig::default(),
            gmail: GmailConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxConfig {
    /// Phrase the message subject must contain.
    #[serde(default = "default_subject_filter")]
    pub subject_filter: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Polling window: how far back the background poll looks.
    #[serde(default = "default_recent_window")]
    pub recent_window_minutes: u32,
    #[serde(default = "default_recent_max_results")]
    pub recent_max_results: u32,
    #[serde(default = "default_full_import_page_size")]
    pub full_import_page_size: u32,
}

fn default_subject_filter() -> String {
    "Subject Application".to_string()
}

fn default_poll_interval() -> u64 {
    300
}

fn default_recent_window() -> u32 {
    2880
}

fn default_recent_max_results() -> u32 {
    50
}

fn default_full_import_page_size() -> u32 {
    500
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            subject_filter: default_subject_filter(),
            poll_interval_secs: default_poll_interval(),
            recent_window_minutes: default_recent_window(),
            recent_max_results: default_recent_max_results(),
            full_import_page_size: default_full_import_page_size(),
        }
    }
}

/// Where to find a secret: inline value, file, or environment variable.
///
/// Resolved in that order by [`crate::secrets::resolve_secret`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,
}

impl SecretRef {
    pub fn from_env(name: &str) -> Self {
        Self {
            env_var: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn is_configured(&self) -> bool {
        [&self.value, &self.file, &self.env_var]
            .iter()
            .any(|s| s.as_deref().is_some_and(|v| !v.is_empty()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_client_id")]
    pub client_id: SecretRef,
    #[serde(default = "default_client_secret")]
    pub client_secret: SecretRef,
    #[serde(default = "default_refresh_token")]
    pub refresh_token: SecretRef,
}

fn default_user_id() -> String {
    "me".to_string()
}

fn default_api_base() -> String {
    "https://gmail.googleapis.com/gmail/v1".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_client_id() -> SecretRef {
    SecretRef::from_env("GMAIL_CLIENT_ID")
}

fn default_client_secret() -> SecretRef {
    SecretRef::from_env("GMAIL_CLIENT_SECRET")
}

fn default_refresh_token() -> SecretRef {
    SecretRef::from_env("GMAIL_REFRESH_TOKEN")
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            api_base: default_api_base(),
            token_url: default_token_url(),
            client_id: default_client_id(),
            client_secret: default_client_secret(),
            refresh_token: default_refresh_token(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_max_column_width")]
    pub max_column_width: u16,
}

fn default_max_column_width() -> u16 {
    50
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_column_width: default_max_column_width(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.mailbox.subject_filter, "Subject Application");
        assert_eq!(config.mailbox.poll_interval_secs, 300);
        assert_eq!(config.gmail.user_id, "me");
        assert_eq!(
            config.gmail.refresh_token.env_var.as_deref(),
            Some("GMAIL_REFRESH_TOKEN")
        );
        assert_eq!(config.export.max_column_width, 50);
    }

    #[test]
    fn test_secret_ref_is_configured() {
        assert!(!SecretRef::default().is_configured());
        assert!(SecretRef::from_env("X").is_configured());
        let blank = SecretRef {
            value: Some(String::new()),
            ..SecretRef::default()
        };
        assert!(!blank.is_configured());
    }
}
