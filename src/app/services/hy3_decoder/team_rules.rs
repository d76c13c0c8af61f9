//! Team classification and region resolution

use crate::app::models::TeamIdentity;
use crate::app::services::schema_model::SchemaModel;

/// Team type used when neither a name rule nor the override names one
pub const UNCLASSIFIED_TEAM_TYPE: &str = "Other";

/// Build a team identity from raw team-core values
///
/// The type comes from the first matching name rule (or the configured rule
/// default), then the meet-type override, then [`UNCLASSIFIED_TEAM_TYPE`].
/// The region code is dropped when the name alone classifies the team as
/// school-like, or when the meet type is school-designated, before the region
/// name is looked up. A school-like override type keeps the region.
pub fn classify_team(
    name: &str,
    code: &str,
    raw_region_code: Option<String>,
    override_type: Option<&str>,
    meet_type_code: Option<&str>,
    schema: &SchemaModel,
) -> TeamIdentity {
    let lookups = schema.lookups();

    let name_type = lookups.classify_team_name(name);
    let team_type = name_type
        .or(override_type)
        .unwrap_or(UNCLASSIFIED_TEAM_TYPE)
        .to_string();

    let school_context = name_type.is_some_and(|t| lookups.is_school_team_type(t))
        || lookups.is_school_meet_type(meet_type_code);
    let region_code = raw_region_code.filter(|_| !school_context);
    let region = region_code
        .as_deref()
        .and_then(|code| schema.regions().lookup(code))
        .map(str::to_string);

    TeamIdentity {
        code: code.to_string(),
        name: name.to_string(),
        team_type,
        region_code,
        region,
    }
}
