//! Code lookup tables and the region reverse map

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Ordered substring rule for classifying a team by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamNameRule {
    pub needle: String,
    pub team_type: String,
}

/// Result of mapping a raw code through a lookup table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLabel {
    pub label: String,
    /// False when the fallback label was applied
    pub recognized: bool,
}

/// Code → label tables and team classification rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupTables {
    pub meet_type: BTreeMap<String, String>,
    pub meet_type_fallback: String,
    pub course: BTreeMap<String, String>,
    #[serde(default)]
    pub course_fallback: String,
    pub school_meet_type_codes: Vec<String>,
    pub school_team_types: Vec<String>,
    pub team_name_rules: Vec<TeamNameRule>,
    #[serde(default)]
    pub team_type_default: Option<String>,
}

fn lookup(table: &BTreeMap<String, String>, fallback: &str, code: &str) -> CodeLabel {
    match table.get(code) {
        Some(label) => CodeLabel {
            label: label.clone(),
            recognized: true,
        },
        None => CodeLabel {
            label: fallback.to_string(),
            recognized: false,
        },
    }
}

impl LookupTables {
    pub fn meet_type_label(&self, code: &str) -> CodeLabel {
        lookup(&self.meet_type, &self.meet_type_fallback, code)
    }

    pub fn course_label(&self, code: &str) -> CodeLabel {
        lookup(&self.course, &self.course_fallback, code)
    }

    pub fn is_school_meet_type(&self, code: Option<&str>) -> bool {
        code.is_some_and(|code| self.school_meet_type_codes.iter().any(|c| c == code))
    }

    pub fn is_school_team_type(&self, team_type: &str) -> bool {
        self.school_team_types.iter().any(|t| t == team_type)
    }

    /// Team type from the first rule whose needle occurs in the lowercased
    /// name, else the configured default
    pub fn classify_team_name(&self, team_name: &str) -> Option<&str> {
        let name = team_name.to_lowercase();
        self.team_name_rules
            .iter()
            .find(|rule| !rule.needle.is_empty() && name.contains(&rule.needle.to_lowercase()))
            .map(|rule| rule.team_type.as_str())
            .or(self.team_type_default.as_deref())
    }
}

/// Many-codes → one-name region table with normalized lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionTable {
    by_code: HashMap<String, String>,
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl RegionTable {
    /// Build the reverse map from `region name → [codes]`
    ///
    /// Blank codes are skipped. When a code is listed under two regions the
    /// later region (in name order) wins.
    pub fn from_names(regions: &BTreeMap<String, Vec<String>>) -> Self {
        let by_code = regions
            .iter()
            .flat_map(|(name, codes)| codes.iter().map(move |code| (code, name)))
            .filter(|(code, _)| !code.trim().is_empty())
            .map(|(code, name)| (normalize_code(code), name.clone()))
            .collect();
        Self { by_code }
    }

    /// Region name for a code, ignoring case and surrounding whitespace
    pub fn lookup(&self, code: &str) -> Option<&str> {
        self.by_code.get(&normalize_code(code)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
