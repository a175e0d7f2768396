//! The mail provider seam and the queries the intake issues through it.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::error::Result;
use super::message::{MessagePage, RawMessage};

/// Read-only access to a mailbox.
///
/// Implemented by [`super::GmailClient`] for the real mailbox and by
/// in-memory fakes in tests.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Lists message ids matching a provider search query, one page at a time.
    async fn list_message_ids(
        &self,
        query: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<MessagePage>;

    /// Fetches one message with its full payload.
    async fn get_message(&self, id: &str) -> Result<RawMessage>;
}

/// Search query matching every message whose subject contains `filter`.
pub fn subject_query(filter: &str) -> String {
    format!("subject:\"{}\"", filter)
}

/// Subject query bounded to messages received in the last `window_minutes`.
pub fn recent_query(filter: &str, window_minutes: u32, now: DateTime<Utc>) -> String {
    let cutoff = now - Duration::minutes(i64::from(window_minutes));
    format!("{} after:{}", subject_query(filter), cutoff.timestamp())
}
