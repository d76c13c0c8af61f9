//! Global swimmer upsert

use super::EntityResolver;
use crate::app::models::Swimmer;
use crate::Result;
use rusqlite::params;

impl EntityResolver<'_> {
    /// Insert-or-ignore a swimmer, then look up its id by the full identity
    ///
    /// Null birth dates and membership numbers compare equal to each other,
    /// matching the unique index.
    pub fn upsert_swimmer(&self, swimmer: &Swimmer, team_id: i64) -> Result<i64> {
        self.store.write("upsert_swimmer", |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO swimmers
                     (first_name, last_name, gender, birth_date, mm_number, team_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    swimmer.first_name,
                    swimmer.last_name,
                    swimmer.gender,
                    swimmer.birth_date,
                    swimmer.external_id,
                    team_id,
                ],
            )?;

            Ok(conn.query_row(
                "SELECT id FROM swimmers
                 WHERE first_name = ?1 AND last_name = ?2 AND gender = ?3
                   AND IFNULL(birth_date, '') = IFNULL(?4, '')
                   AND IFNULL(mm_number, -1) = IFNULL(?5, -1)
                   AND team_id = ?6",
                params![
                    swimmer.first_name,
                    swimmer.last_name,
                    swimmer.gender,
                    swimmer.birth_date,
                    swimmer.external_id,
                    team_id,
                ],
                |row| row.get(0),
            )?)
        })
    }
}
