//! Contact counts for the dashboard.

use chrono::{DateTime, Days, Utc};
use rusqlite::params;
use serde::Serialize;

use super::{Database, DatabaseError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContactStats {
    pub total_contacts: u64,
    pub today_contacts: u64,
    pub week_contacts: u64,
}

pub fn stats(db: &Database) -> Result<ContactStats, DatabaseError> {
    stats_at(db, Utc::now())
}

/// Counts relative to `now`: today is the same UTC date, the week starts
/// at midnight seven days earlier.
pub fn stats_at(db: &Database, now: DateTime<Utc>) -> Result<ContactStats, DatabaseError> {
    let today = now.date_naive();
    let week_start = today
        .checked_sub_days(Days::new(7))
        .unwrap_or(today)
        .format("%Y-%m-%d 00:00:00")
        .to_string();
    let today = today.format("%Y-%m-%d").to_string();

    db.with_conn(|conn| {
        let (total_contacts, today_contacts, week_contacts): (u64, u64, u64) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(date(created_at) = ?1), 0),
                    COALESCE(SUM(created_at >= ?2), 0)
             FROM contacts",
            params![today, week_start],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(ContactStats {
            total_contacts,
            today_contacts,
            week_contacts,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::contact_repo::upsert_contacts_at;
    use crate::email::ExtractedContact;
    use chrono::TimeZone;

    fn contact(id: &str) -> ExtractedContact {
        ExtractedContact {
            message_id: id.to_string(),
            ..ExtractedContact::default()
        }
    }

    #[test]
    fn test_empty_store() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(stats(&db).unwrap(), ContactStats::default());
    }

    #[test]
    fn test_inserted_today_counts_everywhere() {
        let db = Database::open_in_memory().unwrap();
        crate::db::contact_repo::upsert_contacts(&db, &[contact("m1")]).unwrap();
        let s = stats(&db).unwrap();
        assert_eq!(s.total_contacts, 1);
        assert_eq!(s.today_contacts, 1);
        assert_eq!(s.week_contacts, 1);
    }

    #[test]
    fn test_buckets_relative_to_now() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();

        upsert_contacts_at(&db, &[contact("today")], now).unwrap();
        upsert_contacts_at(
            &db,
            &[contact("three_days")],
            Utc.with_ymd_and_hms(2024, 3, 12, 8, 0, 0).unwrap(),
        )
        .unwrap();
        upsert_contacts_at(
            &db,
            &[contact("week_edge")],
            Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap(),
        )
        .unwrap();
        upsert_contacts_at(
            &db,
            &[contact("old")],
            Utc.with_ymd_and_hms(2024, 3, 7, 23, 59, 59).unwrap(),
        )
        .unwrap();

        let s = stats_at(&db, now).unwrap();
        assert_eq!(s.total_contacts, 4);
        assert_eq!(s.today_contacts, 1);
        assert_eq!(s.week_contacts, 3);
    }

    #[test]
    fn test_serializes_with_dashboard_keys() {
        let json = serde_json::to_value(ContactStats {
            total_contacts: 3,
            today_contacts: 1,
            week_contacts: 2,
        })
        .unwrap();
        assert_eq!(json["total_contacts"], 3);
        assert_eq!(json["today_contacts"], 1);
        assert_eq!(json["week_contacts"], 2);
    }
}
