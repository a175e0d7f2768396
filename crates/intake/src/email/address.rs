//! Sender address normalization.

use std::sync::LazyLock;

use regex::Regex;

use super::decoder::UNKNOWN;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid email regex")
});

/// Pulls the bare address out of a `From` header, lowercased.
///
/// An empty header yields `"Unknown"`; a header without anything
/// address-shaped is returned verbatim.
pub fn extract_email_address(from_header: &str) -> String {
    if from_header.is_empty() {
        return UNKNOWN.to_string();
    }

    match EMAIL_RE.find(from_header) {
        Some(m) => m.as_str().trim().to_lowercase(),
        None => from_header.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_form() {
        assert_eq!(
            extract_email_address("Jane Doe <jane@example.com>"),
            "jane@example.com"
        );
    }

    #[test]
    fn test_bare_address_is_lowercased() {
        assert_eq!(
            extract_email_address("Jane.Doe+Jobs@Example.CO.UK"),
            "jane.doe+jobs@example.co.uk"
        );
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(
            extract_email_address("a@example.com, b@example.org"),
            "a@example.com"
        );
    }

    #[test]
    fn test_empty_header_is_unknown() {
        assert_eq!(extract_email_address(""), "Unknown");
    }

    #[test]
    fn test_unmatched_header_is_returned_verbatim() {
        assert_eq!(extract_email_address("not-an-email"), "not-an-email");
        assert_eq!(extract_email_address("  Jane Doe  "), "  Jane Doe  ");
        assert_eq!(extract_email_address("jane@localhost"), "jane@localhost");
    }
}
