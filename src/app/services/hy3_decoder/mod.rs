//! HY3 fixed-width record decoder
//!
//! Turns the lines of a results file into a [`DecodedBundle`] using a
//! [`SchemaModel`]. Each non-empty line is dispatched on its leading record
//! code:
//!
//! - meet core: name, location and dates in the schema's date format
//! - meet extended: meet type and course, which also select the team layout
//! - team core: code, name, classified type and region
//! - team extended: address fields for the most recently opened team
//! - swimmer: requires an open team; carries a copy of that team's identity
//!
//! Unknown record codes are skipped. Decoding never fails; problems become
//! absent fields or warnings and the whole input is always consumed.

pub mod records;
pub mod state;
pub mod team_rules;

#[cfg(test)]
pub mod tests;

pub use state::DecodeState;
pub use team_rules::classify_team;

use crate::app::models::{DecodeWarning, DecodedBundle, WarningKind};
use crate::app::services::schema_model::SchemaModel;
use records::{
    decode_meet_core, decode_meet_extended, decode_swimmer, decode_team_core,
    decode_team_extended,
};
use serde_json::json;
use tracing::{debug, trace};

/// Characters of an offending line kept in warning context
const LINE_EXCERPT_CHARS: usize = 50;

/// Stateless decoder bound to one schema model
#[derive(Debug, Clone, Copy)]
pub struct Hy3Decoder<'a> {
    schema: &'a SchemaModel,
}

impl<'a> Hy3Decoder<'a> {
    pub fn new(schema: &'a SchemaModel) -> Self {
        Self { schema }
    }

    /// Decode the full text of a results file
    pub fn decode_text(&self, text: &str) -> DecodedBundle {
        self.decode_lines(text.lines())
    }

    /// Decode an ordered sequence of lines
    pub fn decode_lines<I, S>(&self, lines: I) -> DecodedBundle
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let state = lines
            .into_iter()
            .enumerate()
            .fold(DecodeState::default(), |state, (index, line)| {
                self.step(state, index + 1, line.as_ref())
            });

        let bundle = state.finish();
        debug!(
            meet = bundle.meet.as_ref().map(|m| m.name.as_str()).unwrap_or("<none>"),
            teams = bundle.teams.len(),
            swimmers = bundle.swimmers.len(),
            warnings = bundle.warnings.len(),
            "Decoded results file"
        );
        bundle
    }

    /// Fold one line into the accumulator
    pub fn step(&self, mut state: DecodeState, line_no: usize, raw: &str) -> DecodeState {
        state.lines_seen = line_no;

        let line = raw.trim_start_matches('\u{feff}').trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return state;
        }

        let layouts = self.schema.layouts();
        let code = self.schema.record_code(line);

        if code == layouts.meet_info.row_identifier {
            let (core, warnings) = decode_meet_core(line, line_no, self.schema);
            state.meet_core = Some(core);
            state.warn(warnings)
        } else if code == layouts.meet_info_extended.row_identifier {
            let (extended, warnings) = decode_meet_extended(line, line_no, self.schema);
            state.meet_extended = Some(extended);
            state.warn(warnings)
        } else if code == layouts.team_info.row_identifier {
            let team = decode_team_core(line, self.schema, state.meet_type_code());
            state.teams.push(team);
            state
        } else if code == layouts.team_info_extended.row_identifier {
            let address = decode_team_extended(line, self.schema);
            match state.open_team_mut() {
                Some(team) => address.apply_to(team),
                None => trace!(line_no, "Team address record without a team, ignored"),
            }
            state
        } else if code == layouts.swimmer_info.row_identifier {
            match state.open_team().map(|team| team.identity.clone()) {
                Some(team) => {
                    let swimmer = decode_swimmer(line, self.schema, team);
                    state.swimmers.push(swimmer);
                    state
                }
                None => {
                    let excerpt: String = line.chars().take(LINE_EXCERPT_CHARS).collect();
                    let warning = DecodeWarning::new(
                        WarningKind::SwimmerWithoutTeam,
                        "Encountered swimmer before any team",
                    )
                    .at_line(line_no)
                    .with_context(json!({ "line": excerpt }));
                    state.warn(vec![warning])
                }
            }
        } else {
            trace!(line_no, code, "Skipping unhandled record type");
            state
        }
    }
}

/// Decode lines with a one-off decoder
pub fn decode_lines<I, S>(lines: I, schema: &SchemaModel) -> DecodedBundle
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Hy3Decoder::new(schema).decode_lines(lines)
}
