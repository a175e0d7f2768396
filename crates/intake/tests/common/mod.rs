//! Shared test utilities for intake integration tests.
//!
//! `FakeMailbox` stands in for Gmail: it pages its messages like the real
//! API and can be told to fail individual fetches.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use intake::email::decoder::encode_data;
use intake::email::{Header, MessageBody, MessagePage, MessagePart, RawMessage};
use intake::{EmailError, MailProvider};

/// Builder for provider messages.
pub struct MessageBuilder {
    id: String,
    headers: Vec<Header>,
    body: Option<String>,
    parts: Vec<MessagePart>,
}

impl MessageBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            headers: vec![Header::new("Subject", "Subject Application")],
            body: None,
            parts: vec![],
        }
    }

    pub fn from(mut self, from: &str) -> Self {
        self.headers.push(Header::new("From", from));
        self
    }

    pub fn date(mut self, date: &str) -> Self {
        self.headers.push(Header::new("Date", date));
        self
    }

    /// Inline `text/plain` body.
    pub fn body(mut self, text: &str) -> Self {
        self.body = Some(text.to_string());
        self
    }

    /// Adds a multipart child.
    pub fn part(mut self, mime_type: &str, text: &str) -> Self {
        self.parts.push(MessagePart {
            mime_type: mime_type.to_string(),
            body: MessageBody {
                data: Some(encode_data(text)),
                size: text.len() as u64,
            },
            ..MessagePart::default()
        });
        self
    }

    pub fn build(self) -> RawMessage {
        let mime_type = if self.parts.is_empty() {
            "text/plain"
        } else {
            "multipart/alternative"
        };
        RawMessage {
            id: self.id,
            thread_id: None,
            payload: MessagePart {
                mime_type: mime_type.to_string(),
                headers: self.headers,
                body: MessageBody {
                    data: self.body.as_deref().map(encode_data),
                    size: 0,
                },
                parts: self.parts,
            },
        }
    }
}

pub struct FakeMailbox {
    messages: Vec<RawMessage>,
    page_size: usize,
    failing: HashSet<String>,
    queries: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
}

impl FakeMailbox {
    pub fn new(messages: Vec<RawMessage>) -> Self {
        Self {
            messages,
            page_size: usize::MAX,
            failing: HashSet::new(),
            queries: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Serves at most `size` ids per listing page.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Makes `get_message` fail for this id.
    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailProvider for FakeMailbox {
    async fn list_message_ids(
        &self,
        query: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<MessagePage, EmailError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());

        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let size = self.page_size.min(max_results as usize);
        let end = (start + size).min(self.messages.len());

        Ok(MessagePage {
            ids: self.messages[start..end].iter().map(|m| m.id.clone()).collect(),
            next_page_token: (end < self.messages.len()).then(|| end.to_string()),
        })
    }

    async fn get_message(&self, id: &str) -> Result<RawMessage, EmailError> {
        if self.failing.contains(id) {
            return Err(EmailError::Api {
                status: 500,
                body: "backend error".to_string(),
            });
        }
        self.messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| EmailError::Api {
                status: 404,
                body: "not found".to_string(),
            })
    }
}
