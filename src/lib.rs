//! TM Results Library
//!
//! A Rust library for ingesting swim-meet result archives produced by meet
//! management software (HY3 fixed-width files inside zip containers) into a
//! relational SQLite store.
//!
//! This library provides tools for:
//! - Loading a versioned, declarative schema model of the HY3 record layouts
//! - Decoding fixed-width result files into meets, teams and swimmers
//! - Extracting the primary results member from archives in a scoped temp area
//! - Resolving decoded entities against storage, merging duplicate meets
//! - Draining a durable parse queue sequentially with per-item failure isolation
//! - Recording warnings and failures in an append-only error log

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod storage;
    pub mod services {
        pub mod archive_extractor;
        pub mod entity_resolver;
        pub mod error_log;
        pub mod hy3_decoder;
        pub mod parse_queue;
        pub mod schema_model;
        pub mod source_name;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{DecodedBundle, Meet, QueueStatus, Swimmer, Team};
pub use app::services::schema_model::SchemaModel;
pub use app::storage::Store;
pub use config::Config;

/// Result type alias for the TM results engine
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for ingestion operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// SQLite operation failed
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Lock contention persisted after every retry attempt
    #[error("Database locked during '{operation}' after {attempts} attempts")]
    LockContention { operation: String, attempts: u32 },

    /// Schema model document is structurally invalid
    #[error("Schema model error: {message}")]
    Schema { message: String },

    /// Schema model or region table could not be deserialized
    #[error("Failed to parse schema document '{path}': {source}")]
    SchemaParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Archive container could not be read
    #[error("Archive error in '{path}': {source}")]
    Archive {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Meet row not found
    #[error("Meet not found: id = {meet_id}")]
    MeetNotFound { meet_id: i64 },

    /// Parse queue item not found
    #[error("Parse queue item not found: id = {item_id}")]
    QueueItemNotFound { item_id: i64 },

    /// Queue status change that would move an item backwards
    #[error("Invalid status transition for queue item {item_id}: {from} -> {to}")]
    InvalidStatusTransition {
        item_id: i64,
        from: String,
        to: String,
    },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a database error with context
    pub fn database(message: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Database {
            message: message.into(),
            source,
        }
    }

    /// Create a lock contention error
    pub fn lock_contention(operation: impl Into<String>, attempts: u32) -> Self {
        Self::LockContention {
            operation: operation.into(),
            attempts,
        }
    }

    /// Create a schema model error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create a schema parse error
    pub fn schema_parse(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::SchemaParse {
            path: path.into(),
            source,
        }
    }

    /// Create an archive error
    pub fn archive(path: impl Into<String>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a meet not found error
    pub fn meet_not_found(meet_id: i64) -> Self {
        Self::MeetNotFound { meet_id }
    }

    /// Create a queue item not found error
    pub fn queue_item_not_found(item_id: i64) -> Self {
        Self::QueueItemNotFound { item_id }
    }

    /// Create an invalid status transition error
    pub fn invalid_status_transition(
        item_id: i64,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::InvalidStatusTransition {
            item_id,
            from: from.into(),
            to: to.into(),
        }
    }

    /// The underlying SQLite failure, if this error carries one
    fn sqlite_failure(&self) -> Option<&rusqlite::ffi::Error> {
        match self {
            Self::Database {
                source: rusqlite::Error::SqliteFailure(code, _),
                ..
            } => Some(code),
            _ => None,
        }
    }

    /// True for transient SQLite lock failures (`SQLITE_BUSY` / `SQLITE_LOCKED`)
    pub fn is_lock_contention(&self) -> bool {
        matches!(
            self.sqlite_failure().map(|e| e.code),
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
        )
    }

    /// True when a write hit a UNIQUE or PRIMARY KEY constraint
    pub fn is_unique_violation(&self) -> bool {
        self.sqlite_failure().is_some_and(|e| {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        })
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        Self::Database {
            message: "SQLite operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::SchemaParse {
            path: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Archive {
            path: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration {
            message: format!("Invalid configuration file: {}", error),
        }
    }
}
