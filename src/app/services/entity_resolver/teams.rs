//! Global team upsert

use super::EntityResolver;
use crate::app::models::Team;
use crate::Result;
use rusqlite::params;

impl EntityResolver<'_> {
    /// Insert a team or fill the null columns of the existing `(code, name)` row
    ///
    /// An existing team type is never replaced. Returns the row id.
    pub fn upsert_team(&self, team: &Team) -> Result<i64> {
        let identity = &team.identity;
        self.store.write("upsert_team", |conn| {
            Ok(conn.query_row(
                "INSERT INTO teams
                     (team_code, team_name, team_type, region_code, region,
                      address_1, address_2, city, postal_code)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(team_code, team_name) DO UPDATE SET
                     team_type = COALESCE(teams.team_type, excluded.team_type),
                     region_code = COALESCE(teams.region_code, excluded.region_code),
                     region = COALESCE(teams.region, excluded.region),
                     address_1 = COALESCE(teams.address_1, excluded.address_1),
                     address_2 = COALESCE(teams.address_2, excluded.address_2),
                     city = COALESCE(teams.city, excluded.city),
                     postal_code = COALESCE(teams.postal_code, excluded.postal_code)
                 RETURNING id",
                params![
                    identity.code,
                    identity.name,
                    identity.team_type,
                    identity.region_code,
                    identity.region,
                    team.address_1,
                    team.address_2,
                    team.city,
                    team.postal_code,
                ],
                |row| row.get(0),
            )?)
        })
    }
}
