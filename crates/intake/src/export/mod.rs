//! Spreadsheet export of stored contacts.

mod xlsx;

use chrono::{DateTime, Utc};

pub use xlsx::{contacts_workbook, COLUMNS};

/// MIME type of the produced workbook.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Excel rejects longer sheet names.
const MAX_SHEET_NAME_LEN: usize = 31;

/// Trims a search term, treating blank terms as no filter.
pub fn normalize_search(search: Option<&str>) -> Option<&str> {
    search.map(str::trim).filter(|t| !t.is_empty())
}

/// `Contacts`, or `Contacts - "<term>"` for a filtered export, cut to a
/// name Excel accepts.
pub fn sheet_name(search: Option<&str>) -> String {
    let name = match normalize_search(search) {
        Some(term) => format!("Contacts - \"{}\"", term),
        None => "Contacts".to_string(),
    };

    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect();

    cleaned.trim_matches('\'').to_string()
}

/// Download name stamped with the export time.
pub fn export_filename(search: Option<&str>, now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y%m%d_%H%M%S");
    match normalize_search(search) {
        Some(term) => {
            let slug: String = term
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect();
            format!("contacts_{}_{}.xlsx", slug, stamp)
        }
        None => format!("contacts_export_{}.xlsx", stamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sheet_name() {
        assert_eq!(sheet_name(None), "Contacts");
        assert_eq!(sheet_name(Some("  ")), "Contacts");
        assert_eq!(sheet_name(Some("devops")), "Contacts - \"devops\"");
    }

    #[test]
    fn test_sheet_name_is_cut_and_cleaned() {
        let name = sheet_name(Some("a very long search term: with/odd*chars"));
        assert_eq!(name.chars().count(), 31);
        assert!(!name.contains(':'));
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_export_filename() {
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(
            export_filename(None, now),
            "contacts_export_20240506_070809.xlsx"
        );
        assert_eq!(
            export_filename(Some("web developer"), now),
            "contacts_web_developer_20240506_070809.xlsx"
        );
        assert_eq!(
            export_filename(Some("../etc"), now),
            "contacts_.._etc_20240506_070809.xlsx"
        );
    }
}
