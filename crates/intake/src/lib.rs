pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod export;
pub mod logging;
pub mod secrets;
pub mod worker;

pub use config::{load_config, load_config_from_str, Config};
pub use db::{Database, DatabaseError};
pub use email::{
    extract_email_address, ContactImporter, EmailError, ExtractedContact, ImportSummary,
    MailProvider,
};
pub use error::{ConfigError, ExportError, IntakeError, Result};
pub use logging::LogFormat;
pub use secrets::{resolve_secret, SecretError};
pub use worker::{Poller, PollerStatus, StartOutcome};
