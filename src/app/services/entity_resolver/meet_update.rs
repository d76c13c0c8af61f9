//! Applying decoded meet fields to a pending meet row

use super::EntityResolver;
use crate::app::models::Meet;
use crate::app::storage::now_timestamp;
use crate::{Error, Result};
use rusqlite::{OptionalExtension, params};
use tracing::debug;

/// Where a decoded meet ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetResolution {
    /// Row that now carries the meet
    pub meet_id: i64,

    /// The pending row, when it was merged away into `meet_id`
    pub merged_from: Option<i64>,
}

impl EntityResolver<'_> {
    /// Resolve the pending row `meet_id` against decoded meet fields
    ///
    /// When another parsed row already has the same name and start date the
    /// pending row is merged into it and nothing else is written. Otherwise
    /// decoded values overwrite the row (absent values never blank a column)
    /// and it is marked parsed. A uniqueness violation raised by that write
    /// is handled with the same merge.
    pub fn update_meet(&self, meet_id: i64, meet: &Meet) -> Result<MeetResolution> {
        if let Some(existing) = self.find_canonical_duplicate(meet_id, meet)? {
            self.merge_meets(meet_id, existing)?;
            return Ok(MeetResolution {
                meet_id: existing,
                merged_from: Some(meet_id),
            });
        }

        match self.apply_meet_fields(meet_id, meet) {
            Ok(()) => Ok(MeetResolution {
                meet_id,
                merged_from: None,
            }),
            Err(e) if e.is_unique_violation() => {
                let existing = self
                    .find_conflicting_meet(meet_id, meet)?
                    .ok_or(e)?;
                debug!(meet_id, existing, "Canonical identity conflict on write, merging");
                self.merge_meets(meet_id, existing)?;
                Ok(MeetResolution {
                    meet_id: existing,
                    merged_from: Some(meet_id),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// A different parsed row with the decoded name and start date
    fn find_canonical_duplicate(&self, meet_id: i64, meet: &Meet) -> Result<Option<i64>> {
        let Some(start_date) = meet.start_date else {
            return Ok(None);
        };
        if meet.name.is_empty() {
            return Ok(None);
        }

        let id = self
            .store
            .conn()
            .query_row(
                "SELECT id FROM meets
                 WHERE parsed = 1 AND meet_name = ?1 AND meet_date_start = ?2 AND id != ?3
                 ORDER BY id LIMIT 1",
                params![meet.name, start_date, meet_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// The row holding the identity the pending row would have after update
    fn find_conflicting_meet(&self, meet_id: i64, meet: &Meet) -> Result<Option<i64>> {
        let id = self
            .store
            .conn()
            .query_row(
                "SELECT other.id FROM meets AS pending
                 JOIN meets AS other
                   ON other.meet_name = COALESCE(NULLIF(?1, ''), pending.meet_name)
                  AND other.meet_date_start = COALESCE(?2, pending.meet_date_start)
                 WHERE pending.id = ?3 AND other.id != pending.id AND other.parsed = 1
                 ORDER BY other.id LIMIT 1",
                params![meet.name, meet.start_date, meet_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Overwrite the row with present decoded values and mark it parsed
    ///
    /// Manual and download flags are left alone.
    pub(crate) fn apply_meet_fields(&self, meet_id: i64, meet: &Meet) -> Result<()> {
        let updated = self.store.write("update_meet", |conn| {
            Ok(conn.execute(
                "UPDATE meets SET
                     meet_name = COALESCE(NULLIF(?2, ''), meet_name),
                     location = COALESCE(?3, location),
                     meet_date_start = COALESCE(?4, meet_date_start),
                     meet_date_end = COALESCE(?5, meet_date_end),
                     meet_year = COALESCE(?6, meet_year),
                     course = COALESCE(?7, course),
                     meet_type = COALESCE(?8, meet_type),
                     parsed = 1,
                     parsed_timestamp = ?9
                 WHERE id = ?1",
                params![
                    meet_id,
                    meet.name,
                    meet.location,
                    meet.start_date,
                    meet.end_date,
                    meet.year,
                    meet.course,
                    meet.meet_type,
                    now_timestamp(),
                ],
            )?)
        })?;

        if updated == 0 {
            return Err(Error::meet_not_found(meet_id));
        }
        Ok(())
    }
}
