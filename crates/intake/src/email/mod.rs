//! Mail intake: provider access, message decoding and contact extraction.

pub mod address;
pub mod client;
pub mod contact;
pub mod decoder;
pub mod device_auth;
pub mod error;
pub mod extractor;
pub mod importer;
pub mod message;
pub mod provider;
pub mod token;

pub use address::extract_email_address;
pub use client::GmailClient;
pub use contact::ExtractedContact;
pub use decoder::{decode_body, extract_header};
pub use device_auth::{DeviceFlowAuth, GMAIL_READONLY_SCOPE};
pub use error::EmailError;
pub use extractor::{parse_contact_info, ContactField, ContactFields};
pub use importer::{ContactImporter, ImportSummary};
pub use message::{Header, MessageBody, MessagePage, MessagePart, RawMessage};
pub use provider::MailProvider;
pub use token::{Credentials, TokenSource};
