//! Durable parse queue
//!
//! Queue items move `queued|retry -> processing -> done|error`, with
//! `error -> retry` as the only way back. The worker snapshots pending items
//! at the start of a pass and ingests them strictly one at a time; a failure
//! on one item is logged and recorded on that item without stopping the pass.

pub mod queue;
pub mod report;
pub mod worker;

#[cfg(test)]
pub mod tests;

pub use queue::QueueSummary;
pub use report::{DrainReport, ItemMessage};
pub use worker::QueueWorker;
