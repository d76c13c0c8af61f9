//! Decoding accumulator
//!
//! The decoder folds lines into a [`DecodeState`]. The state carries the
//! context later records depend on (meet type for team layouts, the open team
//! for addresses and swimmers) alongside everything emitted so far.

use super::records::{MeetCore, MeetExtended};
use crate::app::models::{DecodeWarning, DecodedBundle, Meet, Swimmer, Team, WarningKind};

#[derive(Debug, Clone, Default)]
pub struct DecodeState {
    pub(crate) meet_core: Option<MeetCore>,
    pub(crate) meet_extended: Option<MeetExtended>,
    pub(crate) teams: Vec<Team>,
    pub(crate) swimmers: Vec<Swimmer>,
    pub(crate) warnings: Vec<DecodeWarning>,
    pub(crate) lines_seen: usize,
}

impl DecodeState {
    /// Meet-type code in effect for subsequent team records
    pub fn meet_type_code(&self) -> Option<&str> {
        self.meet_extended
            .as_ref()
            .and_then(|ext| ext.meet_type_code.as_deref())
    }

    /// Most recently opened team
    pub fn open_team(&self) -> Option<&Team> {
        self.teams.last()
    }

    pub fn open_team_mut(&mut self) -> Option<&mut Team> {
        self.teams.last_mut()
    }

    pub fn warn(mut self, warnings: Vec<DecodeWarning>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    /// Combine meet-core and meet-extended fields into the bundle
    pub fn finish(self) -> DecodedBundle {
        let mut warnings = self.warnings;

        let meet = match self.meet_core {
            Some(core) => {
                let ext = self.meet_extended.unwrap_or_default();
                Some(Meet {
                    name: core.name,
                    location: core.location,
                    start_date: core.start_date,
                    end_date: core.end_date,
                    year: core.year,
                    meet_type_code: ext.meet_type_code,
                    meet_type: ext.meet_type,
                    course_code: ext.course_code,
                    course: ext.course,
                })
            }
            None => {
                warnings.push(DecodeWarning::new(
                    WarningKind::MissingMeetRecord,
                    format!(
                        "No meet record found in {} lines",
                        self.lines_seen
                    ),
                ));
                None
            }
        };

        DecodedBundle {
            meet,
            teams: self.teams,
            swimmers: self.swimmers,
            warnings,
        }
    }
}
