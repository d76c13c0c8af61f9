//! Meet association rows

use super::EntityResolver;
use crate::Result;
use rusqlite::params;

impl EntityResolver<'_> {
    /// Returns true when the link was new
    pub fn link_meet_team(&self, meet_id: i64, team_id: i64) -> Result<bool> {
        self.store.write("link_meet_team", |conn| {
            Ok(conn.execute(
                "INSERT OR IGNORE INTO meet_teams (meet_id, team_id) VALUES (?1, ?2)",
                params![meet_id, team_id],
            )? > 0)
        })
    }

    pub fn link_meet_swimmer(&self, meet_id: i64, swimmer_id: i64) -> Result<bool> {
        self.store.write("link_meet_swimmer", |conn| {
            Ok(conn.execute(
                "INSERT OR IGNORE INTO meet_swimmers (meet_id, swimmer_id) VALUES (?1, ?2)",
                params![meet_id, swimmer_id],
            )? > 0)
        })
    }

    pub fn link_meet_team_swimmer(&self, meet_id: i64, team_id: i64, swimmer_id: i64) -> Result<bool> {
        self.store.write("link_meet_team_swimmer", |conn| {
            Ok(conn.execute(
                "INSERT OR IGNORE INTO meet_team_swimmers (meet_id, team_id, swimmer_id)
                 VALUES (?1, ?2, ?3)",
                params![meet_id, team_id, swimmer_id],
            )? > 0)
        })
    }
}
