//! SQLite-backed durable store
//!
//! One blocking connection shared by the resolver, the parse queue and the
//! error log. Other processes may hold the database at the same time, so all
//! writes go through [`Store::write`] which applies the lock-contention retry
//! policy uniformly.
//!
//! Table-specific operations live next to the services that own them
//! (`meets.rs` here, the error log and queue in their service modules) as
//! further `impl Store` blocks.

pub mod meets;
pub mod migrations;
pub mod retry;

pub use meets::MeetFilter;
pub use retry::{RetryPolicy, with_lock_retry};

use crate::config::{Config, DatabaseConfig};
use crate::{Error, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, Transaction};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Durable store for meets, teams, swimmers, the parse queue and error log
#[derive(Debug)]
pub struct Store {
    conn: Connection,
    retry: RetryPolicy,
}

/// Row counts of the entity and association tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub meets: i64,
    pub teams: i64,
    pub swimmers: i64,
    pub meet_teams: i64,
    pub meet_swimmers: i64,
    pub meet_team_swimmers: i64,
}

/// UTC timestamp with fixed precision so stored values sort lexically
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Store {
    /// Open (or create) the database described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(
            &config.database.path,
            &config.database,
            RetryPolicy::from(&config.retry),
        )
    }

    /// Open a database file, creating parent directories and applying migrations
    pub fn open(path: &Path, database: &DatabaseConfig, retry: RetryPolicy) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::io(
                        format!("Failed to create database directory {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::database(format!("Failed to open {}", path.display()), e))?;

        // WAL lets external readers proceed while this process writes
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let store = Self::initialize(conn, database, retry)?;
        info!(path = %path.display(), "Opened results database");
        Ok(store)
    }

    /// In-memory database with the default retry policy, for tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn, &DatabaseConfig::default(), RetryPolicy::default())
    }

    fn initialize(conn: Connection, database: &DatabaseConfig, retry: RetryPolicy) -> Result<Self> {
        conn.busy_timeout(database.busy_timeout())?;

        let applied = migrations::run_migrations(&conn)?;
        debug!(applied, "Schema migrations checked");

        // Enabled after migrations so table rebuilds are unconstrained
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn, retry })
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Borrow the connection for reads
    ///
    /// Reads are assumed uncontended and are not retried.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run one write operation under the lock-contention retry policy
    pub fn write<T, F>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut(&Connection) -> Result<T>,
    {
        with_lock_retry(&self.retry, operation, || op(&self.conn))
    }

    /// Run a multi-statement write in one transaction under the retry policy
    ///
    /// The transaction rolls back when `op` fails, so a retried attempt starts
    /// from a clean state.
    pub fn write_transaction<T, F>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut(&Transaction<'_>) -> Result<T>,
    {
        with_lock_retry(&self.retry, operation, || {
            let tx = self.conn.unchecked_transaction()?;
            let value = op(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }

    /// Count rows in the entity and association tables
    pub fn counts(&self) -> Result<StoreCounts> {
        let count = |table: &str| -> Result<i64> {
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
        };

        Ok(StoreCounts {
            meets: count("meets")?,
            teams: count("teams")?,
            swimmers: count("swimmers")?,
            meet_teams: count("meet_teams")?,
            meet_swimmers: count("meet_swimmers")?,
            meet_team_swimmers: count("meet_team_swimmers")?,
        })
    }
}
