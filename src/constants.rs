//! Application constants for the TM results ingestion engine
//!
//! This module contains default values, archive conventions and storage
//! parameters used throughout the crate.

// =============================================================================
// Archive Conventions
// =============================================================================

/// Extension of the mandatory primary results member inside a result archive
pub const PRIMARY_MEMBER_EXTENSION: &str = "hy3";

/// Extension of the optional secondary results member
pub const SECONDARY_MEMBER_EXTENSION: &str = "cl2";

/// Prefix for the scoped temporary extraction directory
pub const DEFAULT_TEMP_PREFIX: &str = "hy3_";

// =============================================================================
// Schema Model
// =============================================================================

/// Embedded default record layout document
pub const BUILTIN_SCHEMA_DOCUMENT: &str = include_str!("../models/hy3-results.json");

/// Embedded default region code table
pub const BUILTIN_REGION_CODES: &str = include_str!("../models/region_codes.json");

/// Schema document versions this build understands
pub const SUPPORTED_SCHEMA_VERSIONS: &[u32] = &[1];

// =============================================================================
// Storage
// =============================================================================

/// Default database file name
pub const DEFAULT_DB_FILE: &str = "meets.db";

/// Application directory created under the user data directory
pub const APP_DIR_NAME: &str = "tm-results";

/// Environment variable overriding the database path
pub const DB_PATH_ENV: &str = "TM_RESULTS_DB";

/// Default SQLite busy timeout (bounded wait for lock acquisition)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Lock-contention retry defaults
pub mod retry {
    /// Total attempts including the first one
    pub const MAX_ATTEMPTS: u32 = 5;

    /// Delay before the second attempt; doubles on each retry
    pub const INITIAL_BACKOFF_MS: u64 = 25;

    /// Upper bound for a single backoff sleep
    pub const MAX_BACKOFF_MS: u64 = 1_000;
}

// =============================================================================
// Parse Queue
// =============================================================================

/// Number of per-item messages kept in a drain report
pub const DEFAULT_RECENT_MESSAGE_LIMIT: usize = 20;

/// Queue status values as stored in the `parse_queue.status` column
pub mod queue_status {
    pub const QUEUED: &str = "queued";
    pub const PROCESSING: &str = "processing";
    pub const DONE: &str = "done";
    pub const ERROR: &str = "error";
    pub const RETRY: &str = "retry";
}

/// Error log kinds written by the queue worker
pub mod log_kinds {
    /// Unhandled failure while ingesting one queue item
    pub const INGEST_ERROR: &str = "IngestError";
}
