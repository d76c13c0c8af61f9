//! Drain pass summary

use crate::app::models::QueueStatus;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Outcome message for one processed item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemMessage {
    pub item_id: i64,
    pub meet_id: i64,
    pub status: QueueStatus,
    pub message: String,
}

/// Totals for one worker pass plus the most recent item messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Items in the pass snapshot
    pub total: usize,
    pub done: usize,
    pub error: usize,
    pub messages: VecDeque<ItemMessage>,
    #[serde(skip)]
    message_limit: usize,
}

impl DrainReport {
    pub fn new(total: usize, message_limit: usize) -> Self {
        Self {
            total,
            message_limit,
            ..Self::default()
        }
    }

    pub fn record_done(&mut self, item_id: i64, meet_id: i64, message: impl Into<String>) {
        self.done += 1;
        self.push(item_id, meet_id, QueueStatus::Done, message.into());
    }

    pub fn record_error(&mut self, item_id: i64, meet_id: i64, message: impl Into<String>) {
        self.error += 1;
        self.push(item_id, meet_id, QueueStatus::Error, message.into());
    }

    fn push(&mut self, item_id: i64, meet_id: i64, status: QueueStatus, message: String) {
        if self.message_limit == 0 {
            return;
        }
        if self.messages.len() == self.message_limit {
            self.messages.pop_front();
        }
        self.messages.push_back(ItemMessage {
            item_id,
            meet_id,
            status,
            message,
        });
    }

    pub fn is_clean(&self) -> bool {
        self.error == 0
    }
}

impl fmt::Display for DrainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} items: {} done, {} error",
            self.total, self.done, self.error
        )
    }
}
