//! Gmail REST client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::error::{EmailError, Result};
use super::message::{MessagePage, RawMessage};
use super::provider::MailProvider;
use super::token::TokenSource;
use crate::config::GmailConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest API error body carried into an [`EmailError::Api`].
const MAX_API_ERROR_BODY: usize = 500;

/// `users.messages.list` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

impl From<ListResponse> for MessagePage {
    fn from(list: ListResponse) -> Self {
        MessagePage {
            ids: list.messages.into_iter().map(|m| m.id).collect(),
            next_page_token: list.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

/// [`MailProvider`] backed by the Gmail API.
pub struct GmailClient {
    http: Client,
    tokens: TokenSource,
    api_base: String,
    user_id: String,
}

impl GmailClient {
    pub fn new(config: &GmailConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EmailError::Setup(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            tokens: TokenSource::new(config.clone())?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            user_id: config.user_id.clone(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/users/{}/messages", self.api_base, self.user_id)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                self.tokens.invalidate().await;
            }
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| EmailError::ParseError(e.to_string()))
    }
}

fn api_error(status: StatusCode, body: &str) -> EmailError {
    let body = if body.len() > MAX_API_ERROR_BODY {
        let mut cut = MAX_API_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        &body[..cut]
    } else {
        body
    };
    EmailError::Api {
        status: status.as_u16(),
        body: body.to_string(),
    }
}

#[async_trait]
impl MailProvider for GmailClient {
    async fn list_message_ids(
        &self,
        query: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<MessagePage> {
        let max_results = max_results.to_string();
        let mut params = vec![("q", query), ("maxResults", max_results.as_str())];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        debug!(query, page_token, "Listing messages");
        let list: ListResponse = self.get_json(&self.messages_url(), &params).await?;
        Ok(list.into())
    }

    async fn get_message(&self, id: &str) -> Result<RawMessage> {
        let url = format!("{}/{}", self.messages_url(), id);
        self.get_json(&url, &[("format", "full")]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_to_page() {
        let json = r#"{
            "messages": [
                {"id": "a1", "threadId": "t1"},
                {"id": "b2", "threadId": "t2"}
            ],
            "nextPageToken": "next",
            "resultSizeEstimate": 2
        }"#;
        let list: ListResponse = serde_json::from_str(json).unwrap();
        let page: MessagePage = list.into();
        assert_eq!(page.ids, vec!["a1", "b2"]);
        assert_eq!(page.next_page_token.as_deref(), Some("next"));
    }

    #[test]
    fn test_empty_list_response() {
        let list: ListResponse = serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        let page: MessagePage = list.into();
        assert!(page.ids.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_blank_page_token_ends_paging() {
        let list: ListResponse =
            serde_json::from_str(r#"{"messages": [], "nextPageToken": ""}"#).unwrap();
        let page: MessagePage = list.into();
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_messages_url_trims_trailing_slash() {
        let config = GmailConfig {
            api_base: "https://gmail.example.com/gmail/v1/".to_string(),
            ..GmailConfig::default()
        };
        let client = GmailClient::new(&config).unwrap();
        assert_eq!(
            client.messages_url(),
            "https://gmail.example.com/gmail/v1/users/me/messages"
        );
    }

    #[test]
    fn test_api_error_truncates_body() {
        let err = api_error(StatusCode::INTERNAL_SERVER_ERROR, &"x".repeat(2000));
        match err {
            EmailError::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), MAX_API_ERROR_BODY);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
