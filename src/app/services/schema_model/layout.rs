//! Record layouts: field spans, date formats and per-record field maps

use super::lookup::LookupTables;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the override entry used when the meet-type code has no entry
pub const FALLBACK_OVERRIDE_KEY: &str = "fallback";

/// A 1-based `{start, length}` character span within a fixed-width line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpan {
    pub start: usize,
    pub length: usize,
}

impl FieldSpan {
    pub const fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Trimmed text covered by this span
    ///
    /// Spans are counted in characters. Lines shorter than the span yield the
    /// available part, or an empty string when the span starts past the end.
    pub fn slice<'a>(&self, line: &'a str) -> &'a str {
        let begin = self.start.saturating_sub(1);
        let start_byte = line
            .char_indices()
            .nth(begin)
            .map(|(i, _)| i)
            .unwrap_or(line.len());
        let rest = &line[start_byte..];
        let end_byte = rest
            .char_indices()
            .nth(self.length)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        rest[..end_byte].trim()
    }

    /// Trimmed text, or `None` when blank
    pub fn value(&self, line: &str) -> Option<String> {
        let text = self.slice(line);
        (!text.is_empty()).then(|| text.to_string())
    }

    pub fn is_valid(&self) -> bool {
        self.start >= 1 && self.length >= 1
    }
}

/// Numeric source date layouts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "MMDDYYYY")]
    MonthDayYear,
    #[serde(rename = "DDMMYYYY")]
    DayMonthYear,
    #[serde(rename = "YYYYMMDD")]
    YearMonthDay,
}

impl DateFormat {
    /// Parse an 8-digit token into a calendar date
    ///
    /// Anything other than exactly eight ASCII digits forming a real date
    /// returns `None`.
    pub fn parse(&self, token: &str) -> Option<NaiveDate> {
        let token = token.trim();
        if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let number = |range: std::ops::Range<usize>| token[range].parse::<u32>().ok();
        let (year, month, day) = match self {
            DateFormat::MonthDayYear => (number(4..8)?, number(0..2)?, number(2..4)?),
            DateFormat::DayMonthYear => (number(4..8)?, number(2..4)?, number(0..2)?),
            DateFormat::YearMonthDay => (number(0..4)?, number(4..6)?, number(6..8)?),
        };

        NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
    }
}

/// Meet-core record layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetCoreLayout {
    pub row_identifier: String,
    #[serde(default)]
    pub date_format: DateFormat,
    pub name: FieldSpan,
    pub location: FieldSpan,
    pub meet_date_start: FieldSpan,
    pub meet_date_end: FieldSpan,
}

/// Meet-extended record layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetExtendedLayout {
    pub row_identifier: String,
    pub meet_type_code: FieldSpan,
    pub course_code: FieldSpan,
}

/// Where the team code and region code sit for one meet type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamOverride {
    pub team_code: FieldSpan,
    #[serde(default)]
    pub region_code: Option<FieldSpan>,
    #[serde(default)]
    pub team_type: Option<String>,
}

/// Team overrides keyed by meet-type code, with a mandatory fallback entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, TeamOverride>",
    into = "BTreeMap<String, TeamOverride>"
)]
pub struct MeetTypeOverrides {
    by_code: BTreeMap<String, TeamOverride>,
    fallback: TeamOverride,
}

impl TryFrom<BTreeMap<String, TeamOverride>> for MeetTypeOverrides {
    type Error = String;

    fn try_from(mut map: BTreeMap<String, TeamOverride>) -> Result<Self, Self::Error> {
        let fallback = map.remove(FALLBACK_OVERRIDE_KEY).ok_or_else(|| {
            format!(
                "team override table has no '{}' entry",
                FALLBACK_OVERRIDE_KEY
            )
        })?;
        Ok(Self {
            by_code: map,
            fallback,
        })
    }
}

impl From<MeetTypeOverrides> for BTreeMap<String, TeamOverride> {
    fn from(overrides: MeetTypeOverrides) -> Self {
        let mut map = overrides.by_code;
        map.insert(FALLBACK_OVERRIDE_KEY.to_string(), overrides.fallback);
        map
    }
}

impl MeetTypeOverrides {
    /// Override for `meet_type_code`, or the fallback entry
    pub fn resolve(&self, meet_type_code: Option<&str>) -> &TeamOverride {
        meet_type_code
            .and_then(|code| self.by_code.get(code))
            .unwrap_or(&self.fallback)
    }

    /// Every entry including the fallback
    pub fn entries(&self) -> impl Iterator<Item = (&str, &TeamOverride)> {
        self.by_code
            .iter()
            .map(|(code, entry)| (code.as_str(), entry))
            .chain(std::iter::once((FALLBACK_OVERRIDE_KEY, &self.fallback)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamOverrideTables {
    pub meet_type: MeetTypeOverrides,
}

/// Team-core record layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamCoreLayout {
    pub row_identifier: String,
    pub team_name: FieldSpan,
    pub overrides: TeamOverrideTables,
}

/// Team-extended (address) record layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamExtendedLayout {
    pub row_identifier: String,
    pub address_1: FieldSpan,
    pub address_2: FieldSpan,
    pub city: FieldSpan,
    pub postal_code: FieldSpan,
}

/// Swimmer record layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwimmerLayout {
    pub row_identifier: String,
    #[serde(default)]
    pub birth_date_format: DateFormat,
    pub gender: FieldSpan,
    pub mm_number: FieldSpan,
    pub last_name: FieldSpan,
    pub first_name: FieldSpan,
    pub birth_date: FieldSpan,
}

/// The complete layout document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordLayouts {
    pub schema_version: u32,
    pub record_code_length: usize,
    pub meet_info: MeetCoreLayout,
    pub meet_info_extended: MeetExtendedLayout,
    pub team_info: TeamCoreLayout,
    pub team_info_extended: TeamExtendedLayout,
    pub swimmer_info: SwimmerLayout,
    pub lookups: LookupTables,
}

impl RecordLayouts {
    /// `(record name, row identifier)` for every record type
    pub fn record_codes(&self) -> [(&'static str, &str); 5] {
        [
            ("meet_info", self.meet_info.row_identifier.as_str()),
            ("meet_info_extended", self.meet_info_extended.row_identifier.as_str()),
            ("team_info", self.team_info.row_identifier.as_str()),
            ("team_info_extended", self.team_info_extended.row_identifier.as_str()),
            ("swimmer_info", self.swimmer_info.row_identifier.as_str()),
        ]
    }

    /// `(field name, span)` for every span in the document
    pub fn spans(&self) -> Vec<(String, FieldSpan)> {
        let meet = &self.meet_info;
        let ext = &self.meet_info_extended;
        let team_ext = &self.team_info_extended;
        let swimmer = &self.swimmer_info;

        let mut spans = vec![
            ("meet_info.name".to_string(), meet.name),
            ("meet_info.location".to_string(), meet.location),
            ("meet_info.meet_date_start".to_string(), meet.meet_date_start),
            ("meet_info.meet_date_end".to_string(), meet.meet_date_end),
            ("meet_info_extended.meet_type_code".to_string(), ext.meet_type_code),
            ("meet_info_extended.course_code".to_string(), ext.course_code),
            ("team_info.team_name".to_string(), self.team_info.team_name),
            ("team_info_extended.address_1".to_string(), team_ext.address_1),
            ("team_info_extended.address_2".to_string(), team_ext.address_2),
            ("team_info_extended.city".to_string(), team_ext.city),
            ("team_info_extended.postal_code".to_string(), team_ext.postal_code),
            ("swimmer_info.gender".to_string(), swimmer.gender),
            ("swimmer_info.mm_number".to_string(), swimmer.mm_number),
            ("swimmer_info.last_name".to_string(), swimmer.last_name),
            ("swimmer_info.first_name".to_string(), swimmer.first_name),
            ("swimmer_info.birth_date".to_string(), swimmer.birth_date),
        ];

        for (code, entry) in self.team_info.overrides.meet_type.entries() {
            spans.push((format!("overrides.{}.team_code", code), entry.team_code));
            if let Some(region) = entry.region_code {
                spans.push((format!("overrides.{}.region_code", code), region));
            }
        }
        spans
    }
}
