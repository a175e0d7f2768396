//! The record produced for each application email.

use serde::{Deserialize, Serialize};

use super::address::extract_email_address;
use super::decoder::{decode_body, extract_header};
use super::extractor::{parse_contact_info, ContactFields};
use super::message::RawMessage;

/// Contact fields plus provenance of the message they came from.
///
/// Every field is a plain string defaulting to empty; the date is kept
/// exactly as the provider sent it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContact {
    pub name: String,
    pub address: String,
    pub postcode: String,
    pub skills: String,
    pub other: String,
    pub email_sender: String,
    pub email_subject: String,
    pub email_date: String,
    pub message_id: String,
}

impl ExtractedContact {
    pub fn new(
        fields: ContactFields,
        email_sender: String,
        email_subject: String,
        email_date: String,
        message_id: String,
    ) -> Self {
        Self {
            name: fields.name,
            address: fields.address,
            postcode: fields.postcode,
            skills: fields.skills,
            other: fields.other,
            email_sender,
            email_subject,
            email_date,
            message_id,
        }
    }

    /// Runs header lookup, body decoding, field extraction and sender
    /// normalization over one provider message.
    pub fn from_message(message: &RawMessage) -> Self {
        let headers = &message.payload.headers;
        let from = extract_header(headers, "From");
        let body = decode_body(&message.payload);

        Self::new(
            parse_contact_info(&body),
            extract_email_address(&from),
            extract_header(headers, "Subject"),
            extract_header(headers, "Date"),
            message.id.clone(),
        )
    }

    pub fn fields(&self) -> ContactFields {
        ContactFields {
            name: self.name.clone(),
            address: self.address.clone(),
            postcode: self.postcode.clone(),
            skills: self.skills.clone(),
            other: self.other.clone(),
        }
    }
}
