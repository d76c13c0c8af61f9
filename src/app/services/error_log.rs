//! Append-only error log
//!
//! Durable, queryable record of every warning and failure met while
//! ingesting results. Entries are never updated except when a meet merge
//! repoints their meet reference. Each write is mirrored to `tracing`.

use crate::app::models::{ErrorLogEntry, NewErrorLogEntry};
use crate::app::storage::{Store, now_timestamp};
use crate::Result;
use rusqlite::{Row, params};
use tracing::warn;

const ENTRY_COLUMNS: &str = "id, timestamp, file_path, meet_id, region, error_type, message, context";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<ErrorLogEntry> {
    let context: Option<String> = row.get(7)?;
    Ok(ErrorLogEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        file_path: row.get(2)?,
        meet_id: row.get(3)?,
        region: row.get(4)?,
        kind: row.get(5)?,
        message: row.get(6)?,
        context: context.and_then(|text| serde_json::from_str(&text).ok()),
    })
}

impl Store {
    /// Append an entry and return its id
    pub fn log_error(&self, entry: &NewErrorLogEntry) -> Result<i64> {
        let context = entry.context.as_ref().map(|value| value.to_string());

        let id = self.write("log_error", |conn| {
            conn.execute(
                "INSERT INTO error_log
                     (timestamp, file_path, meet_id, region, error_type, message, context)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    now_timestamp(),
                    entry.file_path,
                    entry.meet_id,
                    entry.region,
                    entry.kind,
                    entry.message,
                    context,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        warn!(
            kind = %entry.kind,
            meet_id = ?entry.meet_id,
            file = ?entry.file_path,
            "{}",
            entry.message
        );
        Ok(id)
    }

    /// Entries referencing a meet, oldest first
    pub fn errors_for_meet(&self, meet_id: i64) -> Result<Vec<ErrorLogEntry>> {
        let sql = format!(
            "SELECT {} FROM error_log WHERE meet_id = ?1 ORDER BY id",
            ENTRY_COLUMNS
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let entries = stmt
            .query_map([meet_id], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// The `limit` most recent entries, newest first
    pub fn recent_errors(&self, limit: usize) -> Result<Vec<ErrorLogEntry>> {
        let sql = format!(
            "SELECT {} FROM error_log ORDER BY id DESC LIMIT ?1",
            ENTRY_COLUMNS
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let entries = stmt
            .query_map([limit], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn error_count(&self) -> Result<i64> {
        Ok(self
            .conn()
            .query_row("SELECT COUNT(*) FROM error_log", [], |row| row.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{DecodeWarning, WarningKind};
    use serde_json::json;

    #[test]
    fn test_log_and_query_by_meet() {
        let store = Store::open_in_memory().unwrap();

        store
            .log_error(
                &NewErrorLogEntry::new("IngestError", "boom")
                    .meet(7)
                    .file("/d/a.zip")
                    .region("Auckland")
                    .context(json!({ "stage": "resolve" })),
            )
            .unwrap();
        store
            .log_error(&NewErrorLogEntry::new("IngestError", "other meet").meet(8))
            .unwrap();

        let entries = store.errors_for_meet(7).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.kind, "IngestError");
        assert_eq!(entry.message, "boom");
        assert_eq!(entry.file_path.as_deref(), Some("/d/a.zip"));
        assert_eq!(entry.region.as_deref(), Some("Auckland"));
        assert_eq!(entry.context.as_ref().unwrap()["stage"], "resolve");
        assert_eq!(store.error_count().unwrap(), 2);
    }

    #[test]
    fn test_recent_errors_newest_first() {
        let store = Store::open_in_memory().unwrap();
        for i in 0..5 {
            let warning = DecodeWarning::new(WarningKind::UnparseableDate, format!("w{}", i));
            store
                .log_error(&NewErrorLogEntry::from_warning(&warning))
                .unwrap();
        }

        let recent = store.recent_errors(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "w4");
        assert_eq!(recent[1].message, "w3");
        assert!(recent[0].meet_id.is_none());
        assert_eq!(recent[0].context.as_ref().unwrap()["kind"], "UnparseableDate");
    }
}
