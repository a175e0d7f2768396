//! OAuth2 for the Gmail API.
//!
//! Implements the Device Authorization Grant (RFC 8628), used once by
//! `intake authorize` to obtain a refresh token, and the refresh-token
//! grant used on every poll to mint short-lived access tokens.

use log::{debug, info, warn};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::{EmailError, Result};

/// Google's device authorization endpoint.
pub const GOOGLE_DEVICE_AUTH_URL: &str = "https://oauth2.googleapis.com/device/code";

/// Google's token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Read-only mailbox access is all the intake needs.
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// Maximum length for error bodies echoed into errors and logs.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Truncates an OAuth error body so token material cannot flood the logs.
fn sanitize_oauth_error_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY_LENGTH {
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... (truncated)", &body[..cut])
    } else {
        body.to_string()
    }
}

/// Response from the device authorization request.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: String,

    /// Code the user types at `verification_uri`.
    pub user_code: String,

    /// Google calls this `verification_url`; RFC 8628 says `verification_uri`.
    #[serde(alias = "verification_url")]
    pub verification_uri: String,

    /// Lifetime in seconds of the device_code and user_code.
    pub expires_in: u64,

    /// Minimum polling interval in seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,
}

fn default_interval() -> u64 {
    5
}

/// Response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default)]
    pub token_type: Option<String>,

    /// Lifetime in seconds of the access token.
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// Only returned by the device grant, not by refreshes.
    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub scope: Option<String>,
}

/// Error response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,

    #[serde(default)]
    pub error_description: Option<String>,
}

/// How a rejected device-code poll should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthorizationStatus {
    Pending,
    Expired,
    Error,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Device codes shorter-lived than this are still polled once.
const MIN_DEVICE_CODE_TTL: Duration = Duration::from_secs(5);

/// Polling interval bounds; `slow_down` adds five seconds up to the max.
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(30);
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// What the token endpoint answered with.
enum TokenReply {
    Granted(TokenResponse),
    Rejected(TokenErrorResponse),
}

/// OAuth2 client for Google's device and refresh-token grants.
pub struct DeviceFlowAuth {
    http: Client,
    device_auth_url: Option<String>,
    token_url: String,
}

impl DeviceFlowAuth {
    /// Google endpoints.
    pub fn gmail() -> Result<Self> {
        Self::build(
            Some(GOOGLE_DEVICE_AUTH_URL.to_string()),
            GOOGLE_TOKEN_URL.to_string(),
        )
    }

    /// Client that can only refresh; requesting a device code fails.
    pub fn for_refresh(token_url: String) -> Result<Self> {
        Self::build(None, token_url)
    }

    fn build(device_auth_url: Option<String>, token_url: String) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EmailError::OAuth2Error(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http,
            device_auth_url,
            token_url,
        })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Starts a device authorization for the given scopes.
    pub async fn request_device_code(
        &self,
        client_id: &str,
        scopes: &[&str],
    ) -> Result<DeviceCodeResponse> {
        let url = self.device_auth_url.as_deref().ok_or_else(|| {
            EmailError::OAuth2Error("This client has no device authorization endpoint".to_string())
        })?;

        let scope = scopes.join(" ");
        info!("Requesting Gmail device code (scopes: {})", scope);

        let response = self
            .http
            .post(url)
            .form(&[("client_id", client_id), ("scope", scope.as_str())])
            .send()
            .await
            .map_err(|e| EmailError::OAuth2Error(format!("Device code request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::OAuth2Error(format!(
                "Device code request rejected ({}): {}",
                status,
                sanitize_oauth_error_body(&body)
            )));
        }

        response
            .json::<DeviceCodeResponse>()
            .await
            .map_err(|e| EmailError::OAuth2Error(format!("Malformed device code response: {}", e)))
    }

    /// Posts a grant to the token endpoint. Non-success answers are decoded
    /// as OAuth error objects so callers can react to the error code.
    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenReply> {
        let response = self
            .http
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| EmailError::OAuth2Error(format!("Token endpoint unreachable: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EmailError::OAuth2Error(format!("Failed to read token response: {}", e)))?;

        if status.is_success() {
            let token = serde_json::from_str(&body).map_err(|e| {
                EmailError::OAuth2Error(format!("Malformed token response: {}", e))
            })?;
            return Ok(TokenReply::Granted(token));
        }

        serde_json::from_str(&body)
            .map(TokenReply::Rejected)
            .map_err(|_| {
                EmailError::OAuth2Error(format!(
                    "Token endpoint returned {}: {}",
                    status,
                    sanitize_oauth_error_body(&body)
                ))
            })
    }

    /// Waits for the user to approve the device code, honouring the
    /// server's polling interval and `slow_down` requests.
    pub async fn poll_for_token(
        &self,
        device_code: &DeviceCodeResponse,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<TokenResponse> {
        let ttl = Duration::from_secs(device_code.expires_in).max(MIN_DEVICE_CODE_TTL);
        let deadline = tokio::time::Instant::now() + ttl;
        let mut interval = Duration::from_secs(device_code.interval)
            .clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL);

        let form = [
            ("client_id", client_id),
            ("client_secret", client_secret.expose_secret()),
            ("device_code", device_code.device_code.as_str()),
            ("grant_type", DEVICE_CODE_GRANT_TYPE),
        ];

        info!("Waiting for approval (code valid for {}s)", ttl.as_secs());

        while tokio::time::Instant::now() < deadline {
            tokio::time::sleep(interval).await;

            let rejection = match self.token_request(&form).await? {
                TokenReply::Granted(token) => {
                    info!("Device authorization approved");
                    return Ok(token);
                }
                TokenReply::Rejected(rejection) => rejection,
            };

            match classify_poll_error(&rejection) {
                AuthorizationStatus::Pending if rejection.error == "slow_down" => {
                    interval = (interval + SLOW_DOWN_STEP).min(MAX_POLL_INTERVAL);
                    warn!("Token endpoint asked to slow down, polling every {:?}", interval);
                }
                AuthorizationStatus::Pending => debug!("Authorization still pending"),
                AuthorizationStatus::Expired => break,
                AuthorizationStatus::Error => {
                    return Err(EmailError::OAuth2Error(format!(
                        "Authorization failed: {} {}",
                        rejection.error,
                        rejection.error_description.unwrap_or_default()
                    )));
                }
            }
        }

        Err(EmailError::OAuth2Error(
            "Device code expired before authorization".to_string(),
        ))
    }

    /// Exchanges a refresh token for a fresh access token.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &SecretString,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<TokenResponse> {
        debug!("Refreshing Gmail access token");

        let form = [
            ("client_id", client_id),
            ("client_secret", client_secret.expose_secret()),
            ("refresh_token", refresh_token.expose_secret()),
            ("grant_type", "refresh_token"),
        ];

        match self.token_request(&form).await? {
            TokenReply::Granted(token) => Ok(token),
            TokenReply::Rejected(rejection) => Err(EmailError::OAuth2Error(format!(
                "Refresh rejected: {} {}",
                rejection.error,
                rejection.error_description.unwrap_or_default()
            ))),
        }
    }
}

/// Maps a token endpoint error during device polling to a status.
fn classify_poll_error(error: &TokenErrorResponse) -> AuthorizationStatus {
    match error.error.as_str() {
        "authorization_pending" | "slow_down" => AuthorizationStatus::Pending,
        "expired_token" => AuthorizationStatus::Expired,
        _ => AuthorizationStatus::Error,
    }
}
