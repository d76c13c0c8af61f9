//! Queue storage operations and status transitions

use crate::app::models::{ParseQueueItem, QueueStatus};
use crate::app::storage::{MeetFilter, Store, now_timestamp};
use crate::{Error, Result};
use rusqlite::{OptionalExtension, Row, params};
use serde::Serialize;
use tracing::{debug, info};

const ITEM_COLUMNS: &str = "id, meet_id, file_path, status, message, created_at, updated_at";

/// Quoted SQL list of status values for an `IN (...)` clause
fn status_list<'s>(statuses: impl IntoIterator<Item = &'s QueueStatus>) -> String {
    statuses
        .into_iter()
        .map(|status| format!("'{}'", status.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<ParseQueueItem> {
    let status: String = row.get(3)?;
    let status = status.parse::<QueueStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(ParseQueueItem {
        id: row.get(0)?,
        meet_id: row.get(1)?,
        file_path: row.get(2)?,
        status,
        message: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Item count per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    pub queued: i64,
    pub processing: i64,
    pub done: i64,
    pub error: i64,
    pub retry: i64,
}

impl QueueSummary {
    pub fn total(&self) -> i64 {
        self.queued + self.processing + self.done + self.error + self.retry
    }

    pub fn pending(&self) -> i64 {
        self.queued + self.retry
    }

    pub fn get(&self, status: QueueStatus) -> i64 {
        match status {
            QueueStatus::Queued => self.queued,
            QueueStatus::Processing => self.processing,
            QueueStatus::Done => self.done,
            QueueStatus::Error => self.error,
            QueueStatus::Retry => self.retry,
        }
    }

    fn slot(&mut self, status: QueueStatus) -> &mut i64 {
        match status {
            QueueStatus::Queued => &mut self.queued,
            QueueStatus::Processing => &mut self.processing,
            QueueStatus::Done => &mut self.done,
            QueueStatus::Error => &mut self.error,
            QueueStatus::Retry => &mut self.retry,
        }
    }
}

impl Store {
    /// Queue a results file for a meet
    ///
    /// While an item for the same meet and file is still queued, retrying or
    /// processing, its id is returned instead of adding a second one.
    pub fn enqueue(&self, meet_id: i64, file_path: &str) -> Result<i64> {
        let (id, created) = self.write("enqueue", |conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM parse_queue
                     WHERE meet_id = ?1 AND file_path = ?2
                       AND status IN ('queued', 'retry', 'processing')
                     ORDER BY id LIMIT 1",
                    params![meet_id, file_path],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(id) = existing {
                return Ok((id, false));
            }

            let now = now_timestamp();
            conn.execute(
                "INSERT INTO parse_queue (meet_id, file_path, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![meet_id, file_path, QueueStatus::Queued.as_str(), now],
            )?;
            Ok((conn.last_insert_rowid(), true))
        })?;

        if created {
            debug!(item_id = id, meet_id, file = file_path, "Enqueued results file");
        }
        Ok(id)
    }

    /// Queue every downloaded meet matching `filter`; returns the item ids
    pub fn enqueue_downloaded(&self, filter: &MeetFilter) -> Result<Vec<i64>> {
        let meets = self.find_meets(filter)?;
        let mut ids = Vec::with_capacity(meets.len());
        for meet in meets {
            if let Some(path) = meet.file_path.as_deref() {
                ids.push(self.enqueue(meet.id, path)?);
            }
        }
        info!(filter = ?filter, items = ids.len(), "Enqueued downloaded meets");
        Ok(ids)
    }

    /// Move every failed item to `retry`; returns how many moved
    pub fn requeue_failed(&self) -> Result<usize> {
        let moved = self.write("requeue_failed", |conn| {
            Ok(conn.execute(
                "UPDATE parse_queue SET status = ?1, updated_at = ?2 WHERE status = ?3",
                params![
                    QueueStatus::Retry.as_str(),
                    now_timestamp(),
                    QueueStatus::Error.as_str()
                ],
            )?)
        })?;
        info!(items = moved, "Requeued failed items");
        Ok(moved)
    }

    /// Items a worker pass should pick up, oldest first
    pub fn pending_items(&self) -> Result<Vec<ParseQueueItem>> {
        let pending = QueueStatus::ALL.iter().filter(|status| status.is_pending());
        let sql = format!(
            "SELECT {} FROM parse_queue
             WHERE status IN ({})
             ORDER BY created_at, id",
            ITEM_COLUMNS,
            status_list(pending)
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let items = stmt
            .query_map([], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Every item, or only those in `status`, oldest first
    pub fn queue_items(&self, status: Option<QueueStatus>) -> Result<Vec<ParseQueueItem>> {
        let mut sql = format!("SELECT {} FROM parse_queue", ITEM_COLUMNS);
        if status.is_some() {
            sql.push_str(" WHERE status = ?1");
        }
        sql.push_str(" ORDER BY created_at, id");

        let mut stmt = self.conn().prepare(&sql)?;
        let items = match status {
            Some(status) => stmt
                .query_map([status.as_str()], item_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map([], item_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(items)
    }

    pub fn get_queue_item(&self, item_id: i64) -> Result<Option<ParseQueueItem>> {
        let sql = format!("SELECT {} FROM parse_queue WHERE id = ?1", ITEM_COLUMNS);
        Ok(self
            .conn()
            .query_row(&sql, [item_id], item_from_row)
            .optional()?)
    }

    pub fn queue_summary(&self) -> Result<QueueSummary> {
        let mut stmt = self
            .conn()
            .prepare("SELECT status, COUNT(*) FROM parse_queue GROUP BY status")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut summary = QueueSummary::default();
        for (status, count) in rows {
            *summary.slot(status.parse()?) += count;
        }
        Ok(summary)
    }

    /// Move an item to `next`, recording `message`
    ///
    /// The current status must be one of `next`'s predecessors; the check is
    /// part of the `UPDATE` so a concurrent change cannot slip between.
    pub fn set_queue_status(
        &self,
        item_id: i64,
        next: QueueStatus,
        message: Option<&str>,
    ) -> Result<()> {
        let allowed = next.predecessors();
        let updated = if allowed.is_empty() {
            0
        } else {
            let sql = format!(
                "UPDATE parse_queue SET status = ?2, message = ?3, updated_at = ?4
                 WHERE id = ?1 AND status IN ({})",
                status_list(allowed)
            );
            self.write("set_queue_status", |conn| {
                Ok(conn.execute(
                    &sql,
                    params![item_id, next.as_str(), message, now_timestamp()],
                )?)
            })?
        };

        if updated == 0 {
            return match self.get_queue_item(item_id)? {
                Some(item) => Err(Error::invalid_status_transition(
                    item_id,
                    item.status.as_str(),
                    next.as_str(),
                )),
                None => Err(Error::queue_item_not_found(item_id)),
            };
        }

        debug!(item_id, status = %next, "Queue item status changed");
        Ok(())
    }

    pub fn mark_processing(&self, item_id: i64) -> Result<()> {
        self.set_queue_status(item_id, QueueStatus::Processing, None)
    }

    pub fn mark_done(&self, item_id: i64, message: &str) -> Result<()> {
        self.set_queue_status(item_id, QueueStatus::Done, Some(message))
    }

    pub fn mark_error(&self, item_id: i64, message: &str) -> Result<()> {
        self.set_queue_status(item_id, QueueStatus::Error, Some(message))
    }
}
