//! Shared handler state.

use std::sync::Arc;
use std::time::Duration;

use intake::config::ExportConfig;
use intake::email::GmailClient;
use intake::{Config, ContactImporter, Database, IntakeError, MailProvider, Poller};

/// State cloned into every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub poller: Poller,
    pub export: ExportConfig,
}

impl AppState {
    /// Wires a store and a mail provider into a poller.
    pub fn new(
        db: Database,
        provider: Arc<dyn MailProvider>,
        config: &Config,
    ) -> Self {
        let importer = ContactImporter::new(provider, db.clone(), config.mailbox.clone());
        let poller = Poller::new(
            importer,
            Duration::from_secs(config.mailbox.poll_interval_secs),
        );

        Self {
            db,
            poller,
            export: config.export.clone(),
        }
    }

    /// Opens the configured database and connects the Gmail client.
    ///
    /// Credentials are resolved on first use, so the dashboard starts
    /// even before `intake authorize` has been run.
    pub fn from_config(config: &Config) -> Result<Self, IntakeError> {
        let db = Database::open(&config.database_path)?;
        let client = GmailClient::new(&config.gmail)?;
        Ok(Self::new(db, Arc::new(client), config))
    }
}
