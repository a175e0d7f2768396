//! Mailbox-to-store import runs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

use super::contact::ExtractedContact;
use super::error::Result;
use super::provider::{recent_query, subject_query, MailProvider};
use crate::config::MailboxConfig;
use crate::db::{contact_repo, Database};

/// Outcome of one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Contacts newly inserted; duplicates are not counted.
    pub processed: usize,
    /// Contacts extracted from the messages that could be fetched.
    pub total_found: usize,
}

/// Fetches matching messages, extracts contacts and stores them.
#[derive(Clone)]
pub struct ContactImporter {
    provider: Arc<dyn MailProvider>,
    db: Database,
    mailbox: MailboxConfig,
}

impl ContactImporter {
    pub fn new(provider: Arc<dyn MailProvider>, db: Database, mailbox: MailboxConfig) -> Self {
        Self {
            provider,
            db,
            mailbox,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Imports every message in the mailbox matching the subject filter,
    /// following page tokens until the listing is exhausted.
    pub async fn import_all(&self) -> Result<ImportSummary> {
        let query = subject_query(&self.mailbox.subject_filter);
        let span = info_span!("import_all", query = %query);

        async {
            let mut ids = Vec::new();
            let mut page_token: Option<String> = None;

            loop {
                let page = self
                    .provider
                    .list_message_ids(
                        &query,
                        page_token.as_deref(),
                        self.mailbox.full_import_page_size,
                    )
                    .await?;
                debug!(count = page.ids.len(), "Fetched message page");
                ids.extend(page.ids);

                match page.next_page_token {
                    Some(token) => page_token = Some(token),
                    None => break,
                }
            }

            self.process_ids(&ids).await
        }
        .instrument(span)
        .await
    }

    /// Imports messages received within the configured polling window.
    pub async fn import_recent(&self) -> Result<ImportSummary> {
        self.import_recent_at(Utc::now()).await
    }

    pub async fn import_recent_at(&self, now: DateTime<Utc>) -> Result<ImportSummary> {
        let query = recent_query(
            &self.mailbox.subject_filter,
            self.mailbox.recent_window_minutes,
            now,
        );
        let span = info_span!("import_recent", query = %query);

        async {
            let page = self
                .provider
                .list_message_ids(&query, None, self.mailbox.recent_max_results)
                .await?;
            self.process_ids(&page.ids).await
        }
        .instrument(span)
        .await
    }

    async fn process_ids(&self, ids: &[String]) -> Result<ImportSummary> {
        if ids.is_empty() {
            info!("No matching messages found");
            return Ok(ImportSummary::default());
        }

        let contacts = self.fetch_contacts(ids).await;
        let total_found = contacts.len();
        let processed = contact_repo::upsert_contacts(&self.db, &contacts)?;

        info!(
            processed,
            total_found,
            duplicates = total_found - processed,
            "Import finished"
        );

        Ok(ImportSummary {
            processed,
            total_found,
        })
    }

    /// Fetches and extracts each message. A message that cannot be fetched
    /// is logged and skipped.
    async fn fetch_contacts(&self, ids: &[String]) -> Vec<ExtractedContact> {
        let mut contacts = Vec::with_capacity(ids.len());

        for id in ids {
            match self.provider.get_message(id).await {
                Ok(message) => {
                    let contact = ExtractedContact::from_message(&message);
                    debug!(message_id = %id, name = %contact.name, "Extracted contact");
                    contacts.push(contact);
                }
                Err(e) => {
                    warn!(message_id = %id, error = %e, "Skipping message that failed to fetch");
                }
            }
        }

        contacts
    }
}
