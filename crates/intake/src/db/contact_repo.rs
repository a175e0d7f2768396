//! Contact repository: deduplicated inserts and search over `contacts`.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::Serialize;

use super::{Database, DatabaseError};
use crate::email::ExtractedContact;

/// Storage format of `created_at`, UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A stored contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactRecord {
    pub id: i64,
    #[serde(flatten)]
    pub contact: ExtractedContact,
    pub created_at: String,
}

const SELECT_COLUMNS: &str = "SELECT id, name, address, postcode, skills, other,
    email_sender, email_subject, email_date, message_id, created_at FROM contacts";

/// Inserts contacts, ignoring those whose `message_id` is already stored.
///
/// Returns the number of rows actually inserted.
pub fn upsert_contacts(
    db: &Database,
    contacts: &[ExtractedContact],
) -> Result<usize, DatabaseError> {
    upsert_contacts_at(db, contacts, Utc::now())
}

/// [`upsert_contacts`] with an explicit creation time.
///
/// A row that fails for any reason other than the uniqueness constraint is
/// logged and skipped; the rest of the batch is still written.
pub fn upsert_contacts_at(
    db: &Database,
    contacts: &[ExtractedContact],
    now: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let created_at = now.format(TIMESTAMP_FORMAT).to_string();

    db.with_conn(|conn| {
        let mut stmt = conn.prepare_cached(
            "INSERT OR IGNORE INTO contacts (name, address, postcode, skills, other,
             email_sender, email_subject, email_date, message_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;

        let mut inserted = 0;
        for contact in contacts {
            // NULLs never collide in the unique index
            let message_id = Some(contact.message_id.as_str()).filter(|id| !id.is_empty());

            match stmt.execute(params![
                contact.name,
                contact.address,
                contact.postcode,
                contact.skills,
                contact.other,
                contact.email_sender,
                contact.email_subject,
                contact.email_date,
                message_id,
                created_at,
            ]) {
                Ok(changed) => inserted += changed,
                Err(e) => {
                    log::error!(
                        "Failed to save contact from message '{}': {}",
                        contact.message_id,
                        e
                    );
                }
            }
        }

        if inserted < contacts.len() {
            log::debug!(
                "Ignored {} already stored contacts",
                contacts.len() - inserted
            );
        }

        Ok(inserted)
    })
}

/// Lists contacts newest first, optionally filtered.
///
/// A non-blank `search` matches case-insensitively as a substring of the
/// name, address, postcode, skills, other or sender column.
pub fn query_contacts(
    db: &Database,
    search: Option<&str>,
) -> Result<Vec<ContactRecord>, DatabaseError> {
    let term = search.map(str::trim).filter(|t| !t.is_empty());

    db.with_conn(|conn| {
        let order = "ORDER BY created_at DESC, id DESC";
        let records = match term {
            Some(term) => {
                let sql = format!(
                    "{SELECT_COLUMNS}
                     WHERE name LIKE ?1 ESCAPE '\\'
                        OR address LIKE ?1 ESCAPE '\\'
                        OR postcode LIKE ?1 ESCAPE '\\'
                        OR skills LIKE ?1 ESCAPE '\\'
                        OR other LIKE ?1 ESCAPE '\\'
                        OR email_sender LIKE ?1 ESCAPE '\\'
                     {order}"
                );
                let pattern = format!("%{}%", escape_like(term));
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![pattern], row_to_record)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} {order}"))?;
                let rows = stmt.query_map([], row_to_record)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(records)
    })
}

pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let n: u64 = conn.query_row("SELECT COUNT(*) FROM contacts", [], |r| r.get(0))?;
        Ok(n)
    })
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Rows migrated from older tables may hold NULLs; they read back as "".
fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ContactRecord> {
    let text = |idx: usize| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
    };

    Ok(ContactRecord {
        id: row.get(0)?,
        contact: ExtractedContact {
            name: text(1)?,
            address: text(2)?,
            postcode: text(3)?,
            skills: text(4)?,
            other: text(5)?,
            email_sender: text(6)?,
            email_subject: text(7)?,
            email_date: text(8)?,
            message_id: text(9)?,
        },
        created_at: text(10)?,
    })
}
