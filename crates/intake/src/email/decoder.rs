//! Header lookup and body decoding for provider messages.
//!
//! Both functions are total: absent or undecodable content is reported
//! through fixed sentinel strings rather than errors, so one malformed
//! message never stops a batch.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use tracing::warn;

use super::message::{Header, MessagePart};

/// Returned by [`extract_header`] when the header is absent.
pub const UNKNOWN: &str = "Unknown";
/// Returned when the inline body is not valid base64/UTF-8.
pub const BODY_DECODE_ERROR: &str = "Error decoding email body";
/// Returned when the selected text/plain part is not valid base64/UTF-8.
pub const PART_DECODE_ERROR: &str = "Error decoding email part";
/// Returned when no readable text was found.
pub const NO_READABLE_CONTENT: &str = "No readable content found";

/// The provider pads inconsistently, so accept both forms.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Returns the value of the first header whose name matches
/// case-insensitively, or [`UNKNOWN`].
pub fn extract_header(headers: &[Header], name: &str) -> String {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Decodes the readable text of a message payload.
///
/// Inline data on the root wins. Otherwise the part tree is walked
/// depth-first and the first `text/plain` part carrying data is decoded.
pub fn decode_body(payload: &MessagePart) -> String {
    if let Some(data) = payload.body.data.as_deref() {
        return decode_data(data).unwrap_or_else(|reason| {
            warn!("Failed to decode inline email body: {}", reason);
            BODY_DECODE_ERROR.to_string()
        });
    }

    match find_plain_text(&payload.parts) {
        Some(data) => decode_data(data).unwrap_or_else(|reason| {
            warn!("Failed to decode text/plain email part: {}", reason);
            PART_DECODE_ERROR.to_string()
        }),
        None => NO_READABLE_CONTENT.to_string(),
    }
}

fn find_plain_text(parts: &[MessagePart]) -> Option<&str> {
    parts.iter().find_map(|part| {
        if part.mime_type.eq_ignore_ascii_case("text/plain") {
            if let Some(data) = part.body.data.as_deref() {
                return Some(data);
            }
        }
        find_plain_text(&part.parts)
    })
}

fn decode_data(data: &str) -> Result<String, String> {
    let bytes = URL_SAFE_LENIENT
        .decode(data.trim())
        .map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

/// URL-safe base64 as the provider sends it. Used by tests and fakes.
pub fn encode_data(text: &str) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::message::MessageBody;

    fn inline(data: &str) -> MessagePart {
        MessagePart {
            mime_type: "text/plain".into(),
            body: MessageBody {
                data: Some(data.into()),
                size: data.len() as u64,
            },
            ..MessagePart::default()
        }
    }

    fn container(mime_type: &str, parts: Vec<MessagePart>) -> MessagePart {
        MessagePart {
            mime_type: mime_type.into(),
            parts,
            ..MessagePart::default()
        }
    }

    #[test]
    fn test_extract_header_is_case_insensitive() {
        let headers = vec![
            Header::new("from", "Jane <jane@example.com>"),
            Header::new("SUBJECT", "Subject Application"),
        ];
        assert_eq!(extract_header(&headers, "From"), "Jane <jane@example.com>");
        assert_eq!(extract_header(&headers, "subject"), "Subject Application");
    }

    #[test]
    fn test_extract_header_first_match_wins() {
        let headers = vec![
            Header::new("Received", "first"),
            Header::new("received", "second"),
        ];
        assert_eq!(extract_header(&headers, "Received"), "first");
    }

    #[test]
    fn test_extract_header_missing_returns_unknown() {
        assert_eq!(extract_header(&[], "Date"), UNKNOWN);
        let headers = vec![Header::new("From", "x")];
        assert_eq!(extract_header(&headers, "Date"), UNKNOWN);
    }

    #[test]
    fn test_decode_inline_body_recovers_text() {
        for text in [
            "Name: Jane Doe\r\nAddress: 2 Green Drive",
            "",
            "Unicode: Zoë Łukasz 東京 ✓",
            "?>?>~~ bytes that need - and _ in url-safe",
        ] {
            assert_eq!(decode_body(&inline(&encode_data(text))), text);
        }
    }

    #[test]
    fn test_decode_accepts_padded_input() {
        let padded = base64::engine::general_purpose::URL_SAFE.encode("ab");
        assert!(padded.ends_with('='));
        assert_eq!(decode_body(&inline(&padded)), "ab");
    }

    #[test]
    fn test_decode_malformed_base64_returns_sentinel() {
        assert_eq!(decode_body(&inline("***not base64***")), BODY_DECODE_ERROR);
    }

    #[test]
    fn test_decode_invalid_utf8_returns_sentinel() {
        let data = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd]);
        assert_eq!(decode_body(&inline(&data)), BODY_DECODE_ERROR);
    }

    #[test]
    fn test_decode_multipart_picks_first_plain_part() {
        let mut html = inline(&encode_data("<b>html</b>"));
        html.mime_type = "text/html".into();
        let payload = container(
            "multipart/alternative",
            vec![
                html,
                inline(&encode_data("plain one")),
                inline(&encode_data("plain two")),
            ],
        );
        assert_eq!(decode_body(&payload), "plain one");
    }

    #[test]
    fn test_decode_nested_multipart() {
        let mut attachment = inline("");
        attachment.mime_type = "application/pdf".into();
        attachment.body.data = None;
        let payload = container(
            "multipart/mixed",
            vec![
                container(
                    "multipart/alternative",
                    vec![inline(&encode_data("nested plain"))],
                ),
                attachment,
            ],
        );
        assert_eq!(decode_body(&payload), "nested plain");
    }

    #[test]
    fn test_decode_bad_part_returns_part_sentinel() {
        let payload = container("multipart/alternative", vec![inline("%%%")]);
        assert_eq!(decode_body(&payload), PART_DECODE_ERROR);
    }

    #[test]
    fn test_decode_no_readable_content() {
        assert_eq!(decode_body(&MessagePart::default()), NO_READABLE_CONTENT);

        let mut html = inline(&encode_data("<p>x</p>"));
        html.mime_type = "text/html".into();
        let payload = container("multipart/alternative", vec![html]);
        assert_eq!(decode_body(&payload), NO_READABLE_CONTENT);
    }
}
