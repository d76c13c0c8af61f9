//! Meet registration and lookup

use super::{Store, now_timestamp};
use crate::app::models::{MeetRow, NewMeet};
use crate::app::services::source_name::date_token_for_path;
use crate::Result;
use chrono::NaiveDate;
use rusqlite::{OptionalExtension, Row, params};
use tracing::debug;

pub(crate) const MEET_COLUMNS: &str = "id, region, meet_name, url, file_path, processed_timestamp,
     downloaded, uploaded, processed_by_target, parsed, parsed_timestamp, meet_date_token,
     meet_date_start, meet_date_end, meet_year, location, course, meet_type";

/// Selection of downloaded meets to enqueue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetFilter {
    /// Every downloaded meet not yet parsed
    Unparsed,
    /// Downloaded meets of one region
    Region(String),
    /// Downloaded meets with this exact name
    Name(String),
}

fn parse_stored_date(value: Option<String>) -> Option<NaiveDate> {
    value.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

pub(crate) fn meet_from_row(row: &Row<'_>) -> rusqlite::Result<MeetRow> {
    Ok(MeetRow {
        id: row.get(0)?,
        region: row.get(1)?,
        name: row.get(2)?,
        url: row.get(3)?,
        file_path: row.get(4)?,
        processed_timestamp: row.get(5)?,
        downloaded: row.get(6)?,
        uploaded: row.get(7)?,
        processed_by_target: row.get(8)?,
        parsed: row.get(9)?,
        parsed_timestamp: row.get(10)?,
        meet_date_token: row.get(11)?,
        start_date: parse_stored_date(row.get(12)?),
        end_date: parse_stored_date(row.get(13)?),
        year: row.get(14)?,
        location: row.get(15)?,
        course: row.get(16)?,
        meet_type: row.get(17)?,
    })
}

impl Store {
    /// Upsert a discovered meet by its source identity `(region, url)`
    ///
    /// Manual flags (`uploaded`, `processed_by_target`) are never touched on
    /// conflict, an existing file path is never blanked, and a parsed meet
    /// keeps the name decoded from its results file.
    pub fn register_meet(&self, meet: &NewMeet) -> Result<i64> {
        let token = meet.file_path.as_deref().and_then(date_token_for_path);
        let date_token = token.as_ref().map(|t| t.token.clone());
        let year = token.and_then(|t| t.year);
        let downloaded = meet.file_path.is_some();

        let id = self.write("register_meet", |conn| {
            let id = conn.query_row(
                "INSERT INTO meets
                     (region, meet_name, url, processed_timestamp, downloaded, file_path,
                      meet_date_token, meet_year)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(region, url) DO UPDATE SET
                     meet_name = CASE WHEN meets.parsed = 1 THEN meets.meet_name
                                      ELSE excluded.meet_name END,
                     processed_timestamp = excluded.processed_timestamp,
                     downloaded = MAX(meets.downloaded, excluded.downloaded),
                     file_path = COALESCE(excluded.file_path, meets.file_path),
                     meet_date_token = COALESCE(meets.meet_date_token, excluded.meet_date_token),
                     meet_year = COALESCE(meets.meet_year, excluded.meet_year)
                 RETURNING id",
                params![
                    meet.region,
                    meet.name,
                    meet.url,
                    now_timestamp(),
                    downloaded,
                    meet.file_path,
                    date_token,
                    year,
                ],
                |row| row.get(0),
            )?;
            Ok(id)
        })?;

        debug!(meet_id = id, region = %meet.region, name = %meet.name, "Registered meet");
        Ok(id)
    }

    /// Fetch one meet row
    pub fn get_meet(&self, meet_id: i64) -> Result<Option<MeetRow>> {
        let sql = format!("SELECT {} FROM meets WHERE id = ?1", MEET_COLUMNS);
        let meet = self
            .conn()
            .query_row(&sql, [meet_id], meet_from_row)
            .optional()?;
        Ok(meet)
    }

    /// Downloaded meets with a file path matching `filter`, oldest first
    pub fn find_meets(&self, filter: &MeetFilter) -> Result<Vec<MeetRow>> {
        let (condition, value) = match filter {
            MeetFilter::Unparsed => ("parsed = 0", None),
            MeetFilter::Region(region) => ("region = ?1", Some(region.as_str())),
            MeetFilter::Name(name) => ("meet_name = ?1", Some(name.as_str())),
        };
        let sql = format!(
            "SELECT {} FROM meets
             WHERE downloaded = 1 AND file_path IS NOT NULL AND {}
             ORDER BY id",
            MEET_COLUMNS, condition
        );

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = match value {
            Some(value) => stmt
                .query_map([value], meet_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map([], meet_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
    }

    pub fn meet_count(&self) -> Result<i64> {
        Ok(self
            .conn()
            .query_row("SELECT COUNT(*) FROM meets", [], |row| row.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_meet_is_idempotent_by_source() {
        let store = Store::open_in_memory().unwrap();
        let meet = NewMeet::new("Auckland", "Winter Champs", "https://example.org/a.zip");

        let first = store.register_meet(&meet).unwrap();
        let second = store.register_meet(&meet).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.meet_count().unwrap(), 1);
        let row = store.get_meet(first).unwrap().unwrap();
        assert!(!row.downloaded);
        assert!(row.file_path.is_none());
    }

    #[test]
    fn test_register_preserves_manual_flags_and_file_path() {
        let store = Store::open_in_memory().unwrap();
        let meet = NewMeet::new("Auckland", "Winter Champs", "https://example.org/a.zip")
            .with_file("/downloads/Winter Champs 08Aug2025-001.zip");
        let id = store.register_meet(&meet).unwrap();

        store
            .conn()
            .execute("UPDATE meets SET uploaded = 1 WHERE id = ?1", [id])
            .unwrap();

        // Re-registered without a file: nothing is blanked
        let again = NewMeet::new("Auckland", "Winter Champs", "https://example.org/a.zip");
        store.register_meet(&again).unwrap();

        let row = store.get_meet(id).unwrap().unwrap();
        assert!(row.uploaded);
        assert!(row.downloaded);
        assert_eq!(
            row.file_path.as_deref(),
            Some("/downloads/Winter Champs 08Aug2025-001.zip")
        );
        assert_eq!(row.meet_date_token.as_deref(), Some("08Aug2025"));
        assert_eq!(row.year, Some(2025));
    }

    #[test]
    fn test_find_meets_filters() {
        let store = Store::open_in_memory().unwrap();
        store
            .register_meet(&NewMeet::new("Auckland", "A", "u1").with_file("/d/a.zip"))
            .unwrap();
        store
            .register_meet(&NewMeet::new("Waikato", "B", "u2").with_file("/d/b.zip"))
            .unwrap();
        store
            .register_meet(&NewMeet::new("Waikato", "C", "u3"))
            .unwrap();

        assert_eq!(store.find_meets(&MeetFilter::Unparsed).unwrap().len(), 2);
        let waikato = store
            .find_meets(&MeetFilter::Region("Waikato".to_string()))
            .unwrap();
        assert_eq!(waikato.len(), 1);
        assert_eq!(waikato[0].name, "B");
        assert_eq!(
            store.find_meets(&MeetFilter::Name("A".to_string())).unwrap().len(),
            1
        );
        assert!(store.get_meet(999).unwrap().is_none());
    }
}
