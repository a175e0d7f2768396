//! Contact-field extraction from free-text application emails.
//!
//! Bodies look like
//!
//! ```text
//! Name: Jane Doe
//! Address: 2 Green Drive
//! Postcode: PR1 0RD
//! Skills: DevOps
//! Other: N/A
//! ```
//!
//! but applicants reorder, omit and inline the labels. Extraction first
//! finds every label occurrence and orders them by position. A value then
//! runs to the end of its line, or to an earlier point where a later field
//! (or a quoted `From:`/`Subject:`) starts on the same line. Sign-offs
//! below the last field are never part of it, and an earlier field's label
//! inside a value (`Other: Preferred name: Janey`) is kept as text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `Label:` anywhere in the text. `From:`/`Subject:` only terminate the
/// preceding value (quoted replies, forwarded headers).
static COLON_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(name|address|postcode|skills|other|from|subject)\b[ \t]*:")
        .expect("valid label regex")
});

/// `Label` without a colon, accepted only at the start of a line.
static LINE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(name|address|postcode|skills|other)\b").expect("valid label regex")
});

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static POSTCODE_EXACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\s]{2,10}$").expect("valid postcode regex"));

static POSTCODE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\s]{2,10}").expect("valid postcode regex"));

/// The semantic fields an application email carries, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContactField {
    Name,
    Address,
    Postcode,
    Skills,
    Other,
}

impl ContactField {
    /// Canonical label order.
    pub const ALL: [ContactField; 5] = [
        ContactField::Name,
        ContactField::Address,
        ContactField::Postcode,
        ContactField::Skills,
        ContactField::Other,
    ];

    fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "name" => Some(ContactField::Name),
            "address" => Some(ContactField::Address),
            "postcode" => Some(ContactField::Postcode),
            "skills" => Some(ContactField::Skills),
            "other" => Some(ContactField::Other),
            _ => None,
        }
    }

}

/// Extracted field values. Missing fields are empty strings, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    pub name: String,
    pub address: String,
    pub postcode: String,
    pub skills: String,
    pub other: String,
}

impl ContactFields {
    pub fn get(&self, field: ContactField) -> &str {
        match field {
            ContactField::Name => &self.name,
            ContactField::Address => &self.address,
            ContactField::Postcode => &self.postcode,
            ContactField::Skills => &self.skills,
            ContactField::Other => &self.other,
        }
    }

    fn slot(&mut self, field: ContactField) -> &mut String {
        match field {
            ContactField::Name => &mut self.name,
            ContactField::Address => &mut self.address,
            ContactField::Postcode => &mut self.postcode,
            ContactField::Skills => &mut self.skills,
            ContactField::Other => &mut self.other,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LabelToken {
    start: usize,
    end: usize,
    /// `None` for boundary-only labels.
    field: Option<ContactField>,
}

impl LabelToken {
    /// Whether this label cuts short a value belonging to `field`.
    fn ends(&self, field: ContactField) -> bool {
        match self.field {
            None => true,
            Some(next) => next > field,
        }
    }
}

/// Extracts contact fields from a decoded email body. Never fails:
/// unmatched fields stay empty.
pub fn parse_contact_info(body: &str) -> ContactFields {
    let text = body.replace("\r\n", "\n");
    let text = text.trim();

    let tokens = tokenize(text);
    let mut fields = ContactFields::default();

    for (i, token) in tokens.iter().enumerate() {
        let Some(field) = token.field else {
            continue;
        };
        if !fields.get(field).is_empty() {
            continue;
        }

        let end = value_end(text, &tokens[i + 1..], token.end, field);
        let raw = &text[token.end..end];
        let value = match field {
            ContactField::Postcode => postcode_value(raw),
            _ => clean_value(raw),
        };
        *fields.slot(field) = value;
    }

    if fields.name.is_empty() && !tokens.iter().any(|t| t.field == Some(ContactField::Name)) {
        if let Some(first) = tokens.first() {
            fields.name = leading_name(&text[..first.start]);
        }
    }

    fields
}

fn value_end(text: &str, following: &[LabelToken], from: usize, field: ContactField) -> usize {
    let line_end = text[from..].find('\n').map_or(text.len(), |n| from + n);
    following
        .iter()
        .find(|next| next.ends(field))
        .map_or(line_end, |next| next.start.min(line_end))
}

/// Finds every label occurrence, sorted by position, overlaps removed.
fn tokenize(text: &str) -> Vec<LabelToken> {
    let mut tokens: Vec<LabelToken> = Vec::new();

    for caps in COLON_LABEL_RE.captures_iter(text) {
        let (Some(all), Some(label)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        tokens.push(LabelToken {
            start: all.start(),
            end: all.end(),
            field: ContactField::from_label(label.as_str()),
        });
    }

    for caps in LINE_LABEL_RE.captures_iter(text) {
        let Some(label) = caps.get(1) else {
            continue;
        };
        tokens.push(LabelToken {
            start: label.start(),
            end: label.end(),
            field: ContactField::from_label(label.as_str()),
        });
    }

    // Same start: keep the longer (colon) form.
    tokens.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut merged: Vec<LabelToken> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if merged.last().is_some_and(|last| token.start < last.end) {
            continue;
        }
        merged.push(token);
    }
    merged
}

/// Drops a stray leading colon and collapses whitespace runs.
fn clean_value(raw: &str) -> String {
    let trimmed = raw.trim_start_matches(|c: char| c == ':' || c.is_whitespace());
    WHITESPACE_RE.replace_all(trimmed, " ").trim().to_string()
}

/// A postcode is 2-10 letters, digits and spaces. A longer capture keeps
/// only its leading postcode-shaped run.
fn postcode_value(raw: &str) -> String {
    let value = clean_value(raw);
    if POSTCODE_EXACT_RE.is_match(&value) {
        return value;
    }
    POSTCODE_PREFIX_RE
        .find(&value)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Unlabelled name: the first line before any label.
fn leading_name(preamble: &str) -> String {
    preamble
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(clean_value)
        .unwrap_or_default()
}
