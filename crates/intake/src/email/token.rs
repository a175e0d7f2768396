//! Access token source for the Gmail API.

use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use super::device_auth::DeviceFlowAuth;
use super::error::{EmailError, Result};
use crate::config::{GmailConfig, SecretRef};
use crate::secrets::resolve_ref;

/// Tokens are refreshed this long before Google says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

struct CachedToken {
    token: SecretString,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + EXPIRY_MARGIN < self.expires_at
    }
}

/// Credential material needed to mint access tokens.
pub struct Credentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
}

impl Credentials {
    /// Resolves all three credentials, failing with a setup error naming
    /// the first one that is missing.
    pub fn resolve(config: &GmailConfig) -> Result<Self> {
        let client_id = resolve_required(&config.client_id, "client_id")?;
        let client_secret = resolve_required(&config.client_secret, "client_secret")?;
        let refresh_token = resolve_required(&config.refresh_token, "refresh_token")?;

        Ok(Self {
            client_id: client_id.expose_secret().to_string(),
            client_secret,
            refresh_token,
        })
    }
}

fn resolve_required(secret: &SecretRef, label: &str) -> Result<SecretString> {
    if !secret.is_configured() {
        return Err(EmailError::Setup(format!(
            "Gmail {} is not configured; run `intake authorize` or set it in the config file",
            label
        )));
    }
    let value = resolve_ref(secret)?;
    if value.expose_secret().is_empty() {
        return Err(EmailError::Setup(format!("Gmail {} is empty", label)));
    }
    Ok(value)
}

/// Mints and caches access tokens from a refresh token.
///
/// Credentials are resolved lazily on each refresh so a token file
/// rewritten by `intake authorize` is picked up without a restart.
pub struct TokenSource {
    config: GmailConfig,
    auth: DeviceFlowAuth,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(config: GmailConfig) -> Result<Self> {
        let auth = DeviceFlowAuth::for_refresh(config.token_url.clone())?;
        Ok(Self {
            config,
            auth,
            cached: Mutex::new(None),
        })
    }

    /// Returns a valid access token, refreshing when the cached one is
    /// missing or about to expire.
    pub async fn access_token(&self) -> Result<SecretString> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(SecretString::from(token.token.expose_secret().to_string()));
        }

        let credentials = Credentials::resolve(&self.config)?;
        let response = self
            .auth
            .refresh_access_token(
                &credentials.refresh_token,
                &credentials.client_id,
                &credentials.client_secret,
            )
            .await?;

        let lifetime = response
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let token = SecretString::from(response.access_token.clone());

        *cached = Some(CachedToken {
            token,
            expires_at: Instant::now() + lifetime,
        });

        Ok(SecretString::from(response.access_token))
    }

    /// Drops the cached token so the next call refreshes.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(value: &str) -> SecretRef {
        SecretRef {
            value: Some(value.to_string()),
            ..SecretRef::default()
        }
    }

    #[test]
    fn test_missing_credentials_are_setup_errors() {
        let config = GmailConfig {
            client_id: SecretRef::default(),
            ..GmailConfig::default()
        };
        let err = Credentials::resolve(&config).err().unwrap();
        assert!(err.is_setup());
        assert!(err.to_string().contains("client_id"));
    }

    #[test]
    fn test_unset_env_var_is_setup_error() {
        let config = GmailConfig {
            client_id: direct("id"),
            client_secret: direct("secret"),
            refresh_token: SecretRef::from_env("INTAKE_TEST_UNSET_REFRESH_TOKEN"),
            ..GmailConfig::default()
        };
        let err = Credentials::resolve(&config).err().unwrap();
        assert!(err.is_setup());
    }

    #[test]
    fn test_resolves_direct_credentials() {
        let config = GmailConfig {
            client_id: direct("id"),
            client_secret: direct("secret"),
            refresh_token: direct("refresh"),
            ..GmailConfig::default()
        };
        let creds = Credentials::resolve(&config).unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.client_secret.expose_secret(), "secret");
        assert_eq!(creds.refresh_token.expose_secret(), "refresh");
    }

    #[test]
    fn test_cached_token_freshness_respects_margin() {
        let now = Instant::now();
        let fresh = CachedToken {
            token: SecretString::from("t"),
            expires_at: now + Duration::from_secs(600),
        };
        let stale = CachedToken {
            token: SecretString::from("t"),
            expires_at: now + Duration::from_secs(30),
        };
        assert!(fresh.is_fresh(now));
        assert!(!stale.is_fresh(now));
    }

    #[tokio::test]
    async fn test_access_token_without_credentials_fails_before_network() {
        let config = GmailConfig {
            client_id: SecretRef::default(),
            client_secret: SecretRef::default(),
            refresh_token: SecretRef::default(),
            token_url: "http://127.0.0.1:9/token".to_string(),
            ..GmailConfig::default()
        };
        let source = TokenSource::new(config).unwrap();
        let err = source.access_token().await.err().unwrap();
        assert!(err.is_setup());
    }
}
