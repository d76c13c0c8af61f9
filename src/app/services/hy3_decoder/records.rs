//! Per-record field extraction
//!
//! Each function reads one fixed-width line through its layout and returns
//! the extracted values plus any warnings. None of them fail: unparseable
//! fields come back as `None`.

use super::team_rules::classify_team;
use crate::app::models::{DecodeWarning, Swimmer, Team, TeamIdentity, WarningKind};
use crate::app::services::schema_model::{DateFormat, FieldSpan, SchemaModel};
use chrono::{Datelike, NaiveDate};
use serde_json::json;
use tracing::debug;

/// Fields of the meet-core record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetCore {
    pub name: String,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub year: Option<i32>,
}

/// Fields of the meet-extended record, resolved through the lookups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetExtended {
    pub meet_type_code: Option<String>,
    pub meet_type: Option<String>,
    pub course_code: Option<String>,
    pub course: Option<String>,
}

/// Team address fields from the team-extended record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamAddress {
    pub address_1: Option<String>,
    pub address_2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

impl TeamAddress {
    pub fn apply_to(self, team: &mut Team) {
        team.address_1 = self.address_1;
        team.address_2 = self.address_2;
        team.city = self.city;
        team.postal_code = self.postal_code;
    }
}

/// Parse a date field, warning when a non-blank token is not a date
fn parse_date_field(
    line: &str,
    line_no: usize,
    field: &str,
    span: FieldSpan,
    format: DateFormat,
    warnings: &mut Vec<DecodeWarning>,
) -> Option<NaiveDate> {
    let token = span.slice(line);
    if token.is_empty() {
        return None;
    }

    let date = format.parse(token);
    if date.is_none() {
        warnings.push(
            DecodeWarning::new(
                WarningKind::UnparseableDate,
                format!("Unparseable {} '{}' (expected {:?})", field, token, format),
            )
            .at_line(line_no)
            .with_context(json!({ "field": field, "token": token })),
        );
    }
    date
}

pub fn decode_meet_core(
    line: &str,
    line_no: usize,
    schema: &SchemaModel,
) -> (MeetCore, Vec<DecodeWarning>) {
    let layout = &schema.layouts().meet_info;
    let mut warnings = Vec::new();

    let start_date = parse_date_field(
        line,
        line_no,
        "meet_date_start",
        layout.meet_date_start,
        layout.date_format,
        &mut warnings,
    );
    let end_date = parse_date_field(
        line,
        line_no,
        "meet_date_end",
        layout.meet_date_end,
        layout.date_format,
        &mut warnings,
    );

    let core = MeetCore {
        name: layout.name.slice(line).to_string(),
        location: layout.location.value(line),
        start_date,
        end_date,
        year: start_date.map(|d| d.year()),
    };
    (core, warnings)
}

pub fn decode_meet_extended(
    line: &str,
    line_no: usize,
    schema: &SchemaModel,
) -> (MeetExtended, Vec<DecodeWarning>) {
    let layout = &schema.layouts().meet_info_extended;
    let lookups = schema.lookups();
    let mut warnings = Vec::new();

    let meet_type_code = layout.meet_type_code.value(line);
    let course_code = layout.course_code.value(line);

    let meet_type = lookups.meet_type_label(meet_type_code.as_deref().unwrap_or_default());
    if let Some(code) = meet_type_code.as_deref().filter(|_| !meet_type.recognized) {
        warnings.push(
            DecodeWarning::new(
                WarningKind::UnrecognizedCode,
                format!("Unknown meet type code '{}', using '{}'", code, meet_type.label),
            )
            .at_line(line_no)
            .with_context(json!({ "table": "meet_type", "code": code })),
        );
    }

    let course = lookups.course_label(course_code.as_deref().unwrap_or_default());
    if let Some(code) = course_code.as_deref().filter(|_| !course.recognized) {
        warnings.push(
            DecodeWarning::new(
                WarningKind::UnrecognizedCode,
                format!("Unknown course code '{}'", code),
            )
            .at_line(line_no)
            .with_context(json!({ "table": "course", "code": code })),
        );
    }

    let extended = MeetExtended {
        meet_type_code,
        meet_type: non_empty(meet_type.label),
        course_code,
        course: non_empty(course.label),
    };
    (extended, warnings)
}

pub fn decode_team_core(line: &str, schema: &SchemaModel, meet_type_code: Option<&str>) -> Team {
    let layout = &schema.layouts().team_info;
    let name = layout.team_name.slice(line);
    let entry = layout.overrides.meet_type.resolve(meet_type_code);

    let identity = classify_team(
        name,
        entry.team_code.slice(line),
        entry.region_code.and_then(|span| span.value(line)),
        entry.team_type.as_deref(),
        meet_type_code,
        schema,
    );
    Team::new(identity)
}

pub fn decode_team_extended(line: &str, schema: &SchemaModel) -> TeamAddress {
    let layout = &schema.layouts().team_info_extended;
    TeamAddress {
        address_1: layout.address_1.value(line),
        address_2: layout.address_2.value(line),
        city: layout.city.value(line),
        postal_code: layout.postal_code.value(line),
    }
}

/// Swimmer fields with a copy of the enclosing team's identity
pub fn decode_swimmer(line: &str, schema: &SchemaModel, team: TeamIdentity) -> Swimmer {
    let layout = &schema.layouts().swimmer_info;

    let raw_id = layout.mm_number.slice(line);
    let external_id = match raw_id.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) if raw_id.is_empty() => None,
        Err(_) => {
            debug!(value = raw_id, "Ignoring non-numeric membership number");
            None
        }
    };

    let raw_birth_date = layout.birth_date.slice(line);
    let birth_date = layout.birth_date_format.parse(raw_birth_date);
    if birth_date.is_none() && !raw_birth_date.is_empty() {
        debug!(value = raw_birth_date, "Ignoring unparseable birth date");
    }

    Swimmer {
        first_name: layout.first_name.slice(line).to_string(),
        last_name: layout.last_name.slice(line).to_string(),
        gender: layout.gender.slice(line).to_string(),
        birth_date,
        external_id,
        team,
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
