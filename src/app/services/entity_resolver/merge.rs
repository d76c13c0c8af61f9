//! Canonical meet merge
//!
//! Used by both the proactive identity check and the reactive handler for a
//! uniqueness violation, so the two paths end in the same state.

use super::EntityResolver;
use crate::app::models::MeetRow;
use crate::app::storage::meets::{MEET_COLUMNS, meet_from_row};
use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

/// Association tables keyed (partly) by meet id
const MEET_LINK_TABLES: [&str; 3] = ["meet_teams", "meet_swimmers", "meet_team_swimmers"];

fn load_meet(conn: &Connection, meet_id: i64) -> Result<Option<MeetRow>> {
    let sql = format!("SELECT {} FROM meets WHERE id = ?1", MEET_COLUMNS);
    Ok(conn.query_row(&sql, [meet_id], meet_from_row).optional()?)
}

impl EntityResolver<'_> {
    /// Merge meet `source_id` into `target_id`; the target survives
    ///
    /// Progress flags are OR-ed, descriptive fields keep the target's value
    /// unless it is null, and every association, queue item and error log
    /// entry pointing at the source is repointed before the source is
    /// deleted. Returns `false` without changes when the source no longer
    /// exists, which makes a repeated merge a no-op.
    pub fn merge_meets(&self, source_id: i64, target_id: i64) -> Result<bool> {
        if source_id == target_id {
            return Ok(false);
        }

        let merged = self.store.write_transaction("merge_meets", |tx| {
            let Some(source) = load_meet(tx, source_id)? else {
                return Ok(false);
            };
            let Some(target) = load_meet(tx, target_id)? else {
                return Err(Error::meet_not_found(target_id));
            };
            let flags = target.flags().union(source.flags());

            for table in MEET_LINK_TABLES {
                tx.execute(
                    &format!("UPDATE OR IGNORE {} SET meet_id = ?1 WHERE meet_id = ?2", table),
                    params![target_id, source_id],
                )?;
                // Rows left behind already exist for the target
                tx.execute(
                    &format!("DELETE FROM {} WHERE meet_id = ?1", table),
                    [source_id],
                )?;
            }
            tx.execute(
                "UPDATE parse_queue SET meet_id = ?1 WHERE meet_id = ?2",
                params![target_id, source_id],
            )?;
            tx.execute(
                "UPDATE error_log SET meet_id = ?1 WHERE meet_id = ?2",
                params![target_id, source_id],
            )?;

            tx.execute("DELETE FROM meets WHERE id = ?1", [source_id])?;

            tx.execute(
                "UPDATE meets SET
                     downloaded = ?2,
                     uploaded = ?3,
                     processed_by_target = ?4,
                     parsed = ?5,
                     file_path = COALESCE(file_path, ?6),
                     parsed_timestamp = COALESCE(parsed_timestamp, ?7),
                     meet_date_token = COALESCE(meet_date_token, ?8),
                     meet_date_start = COALESCE(meet_date_start, ?9),
                     meet_date_end = COALESCE(meet_date_end, ?10),
                     meet_year = COALESCE(meet_year, ?11),
                     location = COALESCE(location, ?12),
                     course = COALESCE(course, ?13),
                     meet_type = COALESCE(meet_type, ?14)
                 WHERE id = ?1",
                params![
                    target_id,
                    flags.downloaded,
                    flags.uploaded,
                    flags.processed_by_target,
                    flags.parsed,
                    source.file_path,
                    source.parsed_timestamp,
                    source.meet_date_token,
                    source.start_date,
                    source.end_date,
                    source.year,
                    source.location,
                    source.course,
                    source.meet_type,
                ],
            )?;

            Ok(true)
        })?;

        if merged {
            info!(source_id, target_id, "Merged duplicate meet");
        }
        Ok(merged)
    }
}
