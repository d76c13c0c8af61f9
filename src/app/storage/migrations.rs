//! Numbered schema migrations
//!
//! SQL files are embedded at compile time and applied once each, tracked by
//! the `schema_version` table.

use crate::{Error, Result};
use rusqlite::Connection;
use tracing::info;

struct Migration {
    version: i32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("migrations/001_baseline.sql"),
}];

fn ensure_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| Error::database("Failed to create schema_version table", e))
}

/// Highest applied migration version, or 0 on a fresh database
pub fn current_version(conn: &Connection) -> Result<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| Error::database("Failed to read schema version", e))
}

/// Apply every pending migration inside its own transaction
///
/// Returns the number of migrations applied.
pub fn run_migrations(conn: &Connection) -> Result<usize> {
    ensure_schema_version_table(conn)?;
    let current = current_version(conn)?;

    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql).map_err(|e| {
            Error::database(format!("Migration {:03} failed", migration.version), e)
        })?;
        tx.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [migration.version],
        )?;
        tx.commit()?;

        info!(version = migration.version, "Applied schema migration");
        applied += 1;
    }

    Ok(applied)
}
