//! Entity resolver: decoded bundles into durable storage
//!
//! Resolution of one results file runs in this order:
//!
//! 1. The pending meet row is updated from the decoded meet, or merged into
//!    the row that already carries the same canonical identity.
//! 2. Teams are upserted by `(code, name)` and linked to the meet.
//! 3. Swimmers are inserted-or-ignored, their ids looked up, and linked to
//!    the meet and to the meet/team pair.
//!
//! Each write commits on its own under the store's retry policy. Running the
//! resolver twice on the same bundle leaves row counts unchanged.

pub mod links;
pub mod meet_update;
pub mod merge;
pub mod swimmers;
pub mod teams;

#[cfg(test)]
pub mod tests;

pub use meet_update::MeetResolution;

use crate::app::models::{
    DecodeWarning, DecodedBundle, Meet, NewErrorLogEntry, Team, WarningKind,
};
use crate::app::storage::Store;
use crate::Result;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// What one resolution wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveOutcome {
    /// Surviving meet row
    pub meet_id: i64,
    /// Pending row merged away, if a duplicate was found
    pub merged_from: Option<i64>,
    pub teams: usize,
    pub swimmers: usize,
    pub new_team_links: usize,
    pub new_swimmer_links: usize,
    pub new_team_swimmer_links: usize,
    pub link_warnings: usize,
}

/// Upserts decoded entities and merges duplicate meets
#[derive(Debug, Clone, Copy)]
pub struct EntityResolver<'s> {
    store: &'s Store,
}

impl<'s> EntityResolver<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Resolve a decoded meet and its entities against pending row `meet_id`
    ///
    /// `file_path` only labels link warnings written to the error log.
    pub fn resolve(
        &self,
        meet_id: i64,
        meet: &Meet,
        bundle: &DecodedBundle,
        file_path: Option<&str>,
    ) -> Result<ResolveOutcome> {
        let resolution = self.update_meet(meet_id, meet)?;
        let meet_id = resolution.meet_id;

        let mut outcome = ResolveOutcome {
            meet_id,
            merged_from: resolution.merged_from,
            ..ResolveOutcome::default()
        };

        let mut team_ids: HashMap<(String, String), i64> = HashMap::new();
        for team in &bundle.teams {
            let team_id = self.upsert_team(team)?;
            let (code, name) = team.key();
            team_ids.insert((code.to_string(), name.to_string()), team_id);
            if self.link_meet_team(meet_id, team_id)? {
                outcome.new_team_links += 1;
            }
        }

        let mut swimmer_ids = HashSet::new();
        for swimmer in &bundle.swimmers {
            let key = (swimmer.team.code.clone(), swimmer.team.name.clone());
            let team_id = match team_ids.get(&key) {
                Some(id) => *id,
                None => {
                    let id = self.upsert_team(&Team::new(swimmer.team.clone()))?;
                    self.link_meet_team(meet_id, id)?;
                    team_ids.insert(key, id);
                    id
                }
            };

            let swimmer_id = self.upsert_swimmer(swimmer, team_id)?;
            swimmer_ids.insert(swimmer_id);
            if self.link_meet_swimmer(meet_id, swimmer_id)? {
                outcome.new_swimmer_links += 1;
            }
            if self.link_meet_team_swimmer(meet_id, team_id, swimmer_id)? {
                outcome.new_team_swimmer_links += 1;
            }
        }

        outcome.teams = team_ids.len();
        outcome.swimmers = swimmer_ids.len();

        for warning in self.link_warnings(&outcome) {
            let mut entry = NewErrorLogEntry::from_warning(&warning).meet(meet_id);
            if let Some(path) = file_path {
                entry = entry.file(path);
            }
            self.store.log_error(&entry)?;
            outcome.link_warnings += 1;
        }

        info!(
            meet_id,
            merged_from = ?outcome.merged_from,
            teams = outcome.teams,
            swimmers = outcome.swimmers,
            "Resolved meet"
        );
        Ok(outcome)
    }

    fn link_warnings(&self, outcome: &ResolveOutcome) -> Vec<DecodeWarning> {
        let mut warnings = Vec::new();
        if outcome.teams == 0 {
            warnings.push(DecodeWarning::new(
                WarningKind::LinkWarning,
                format!("No teams linked for meet {}", outcome.meet_id),
            ));
        }
        if outcome.swimmers == 0 {
            warnings.push(DecodeWarning::new(
                WarningKind::LinkWarning,
                format!("No swimmers linked for meet {}", outcome.meet_id),
            ));
        }
        if !warnings.is_empty() {
            debug!(meet_id = outcome.meet_id, count = warnings.len(), "Link warnings");
        }
        warnings
    }
}
