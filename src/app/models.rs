//! Data models for swim-meet result ingestion
//!
//! This module contains the decoded entities emitted by the HY3 decoder, the
//! stored rows read back from SQLite, and the parse queue / error log records.

use crate::constants::queue_status;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Decoded Entities
// =============================================================================

/// Meet fields decoded from the meet-core and meet-extended records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meet {
    /// Meet name as printed in the results file
    pub name: String,

    /// Venue or facility text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// First day of competition
    pub start_date: Option<NaiveDate>,

    /// Last day of competition
    pub end_date: Option<NaiveDate>,

    /// Year derived from the parsed start date
    pub year: Option<i32>,

    /// Raw meet-type code from the meet-extended record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meet_type_code: Option<String>,

    /// Meet-type label resolved through the lookup table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meet_type: Option<String>,

    /// Raw course code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,

    /// Course label (e.g. "SCM", "LCM")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
}

/// Identity and classification fields of a team, copied onto every swimmer
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamIdentity {
    /// Short team code (may be empty)
    pub code: String,

    /// Full team name
    pub name: String,

    /// Classified team type (club, school, region, ...)
    pub team_type: String,

    /// Region code, discarded for school teams and school meets
    pub region_code: Option<String>,

    /// Region display name resolved from the region table
    pub region: Option<String>,
}

/// A team decoded from a team-core record plus optional team-extended record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(flatten)]
    pub identity: TeamIdentity,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_1: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_2: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl Team {
    /// Create a team with no address information
    pub fn new(identity: TeamIdentity) -> Self {
        Self {
            identity,
            ..Self::default()
        }
    }

    /// The (code, name) pair used as the global team identity
    pub fn key(&self) -> (&str, &str) {
        (&self.identity.code, &self.identity.name)
    }
}

/// A swimmer decoded from a swimmer record
///
/// The team is embedded by value so the record stays self-contained once
/// decoding has moved past the team it belonged to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swimmer {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub birth_date: Option<NaiveDate>,

    /// External membership number
    pub external_id: Option<i64>,

    pub team: TeamIdentity,
}

// =============================================================================
// Warnings
// =============================================================================

/// Kinds of non-fatal conditions reported by extraction, decoding and linking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// Archive path does not exist
    FileNotFound,
    /// Archive could not be opened as a container
    UnreadableArchive,
    /// No member with the primary results extension
    MissingPrimaryFile,
    /// More than one primary member; the first was used
    MultiplePrimaryCandidates,
    /// No member with the secondary extension (informational)
    MissingSecondaryFile,
    /// Member name escapes the extraction directory
    UnsafeMemberName,
    /// Results file contains no meet-core record
    MissingMeetRecord,
    /// Swimmer record encountered before any team record
    SwimmerWithoutTeam,
    /// Code not present in a lookup table; fallback applied
    UnrecognizedCode,
    /// Date token present but unparseable
    UnparseableDate,
    /// Meet resolved with zero linked teams or swimmers
    LinkWarning,
}

impl WarningKind {
    /// Name stored in the error log `error_type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::FileNotFound => "FileNotFound",
            WarningKind::UnreadableArchive => "UnreadableArchive",
            WarningKind::MissingPrimaryFile => "MissingPrimaryFile",
            WarningKind::MultiplePrimaryCandidates => "MultiplePrimaryCandidates",
            WarningKind::MissingSecondaryFile => "MissingSecondaryFile",
            WarningKind::UnsafeMemberName => "UnsafeMemberName",
            WarningKind::MissingMeetRecord => "MissingMeetRecord",
            WarningKind::SwimmerWithoutTeam => "SwimmerWithoutTeam",
            WarningKind::UnrecognizedCode => "UnrecognizedCode",
            WarningKind::UnparseableDate => "UnparseableDate",
            WarningKind::LinkWarning => "LinkWarning",
        }
    }

    /// Informational warnings never block ingestion
    pub fn is_informational(&self) -> bool {
        matches!(self, WarningKind::MissingSecondaryFile)
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal warning with optional source line and structured context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeWarning {
    pub kind: WarningKind,
    pub message: String,

    /// 1-based line number in the results file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub context: serde_json::Value,
}

impl DecodeWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            context: serde_json::Value::Null,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

/// Output of decoding one results file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedBundle {
    /// Absent when the file has no meet-core record or could not be read
    pub meet: Option<Meet>,
    pub teams: Vec<Team>,
    pub swimmers: Vec<Swimmer>,
    pub warnings: Vec<DecodeWarning>,
}

impl DecodedBundle {
    /// A bundle with no entities and a single warning
    pub fn aborted(warning: DecodeWarning) -> Self {
        Self {
            warnings: vec![warning],
            ..Self::default()
        }
    }

    pub fn count_warnings(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}

// =============================================================================
// Stored Meet Rows
// =============================================================================

/// A discovered meet to register before its results file is ingested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMeet {
    pub region: String,
    pub name: String,

    /// Source reference (download link)
    pub url: String,

    /// Local path of the downloaded archive, if any
    pub file_path: Option<String>,
}

impl NewMeet {
    pub fn new(region: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            name: name.into(),
            url: url.into(),
            file_path: None,
        }
    }

    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }
}

/// A row of the `meets` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetRow {
    pub id: i64,
    pub region: String,
    pub name: String,
    pub url: String,
    pub file_path: Option<String>,
    pub processed_timestamp: String,
    pub downloaded: bool,
    pub uploaded: bool,
    pub processed_by_target: bool,
    pub parsed: bool,
    pub parsed_timestamp: Option<String>,

    /// Date token taken from the downloaded file name (e.g. "08Aug2025")
    pub meet_date_token: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub location: Option<String>,
    pub course: Option<String>,
    pub meet_type: Option<String>,
}

/// Boolean progress flags that merge by logical OR
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressFlags {
    pub downloaded: bool,
    pub uploaded: bool,
    pub processed_by_target: bool,
    pub parsed: bool,
}

impl ProgressFlags {
    pub fn union(self, other: Self) -> Self {
        Self {
            downloaded: self.downloaded || other.downloaded,
            uploaded: self.uploaded || other.uploaded,
            processed_by_target: self.processed_by_target || other.processed_by_target,
            parsed: self.parsed || other.parsed,
        }
    }
}

impl MeetRow {
    pub fn flags(&self) -> ProgressFlags {
        ProgressFlags {
            downloaded: self.downloaded,
            uploaded: self.uploaded,
            processed_by_target: self.processed_by_target,
            parsed: self.parsed,
        }
    }
}

// =============================================================================
// Parse Queue
// =============================================================================

/// Lifecycle of a parse queue item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Queued,
    Processing,
    Done,
    Error,
    Retry,
}

impl QueueStatus {
    pub const ALL: [QueueStatus; 5] = [
        QueueStatus::Queued,
        QueueStatus::Processing,
        QueueStatus::Done,
        QueueStatus::Error,
        QueueStatus::Retry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Queued => queue_status::QUEUED,
            QueueStatus::Processing => queue_status::PROCESSING,
            QueueStatus::Done => queue_status::DONE,
            QueueStatus::Error => queue_status::ERROR,
            QueueStatus::Retry => queue_status::RETRY,
        }
    }

    /// Statuses a worker pass picks up
    pub fn is_pending(&self) -> bool {
        matches!(self, QueueStatus::Queued | QueueStatus::Retry)
    }

    /// Statuses this one may legally move to
    ///
    /// Items only move forward; `Error -> Retry` is the explicit requeue.
    pub fn predecessors(&self) -> &'static [QueueStatus] {
        match self {
            QueueStatus::Queued => &[],
            QueueStatus::Processing => &[QueueStatus::Queued, QueueStatus::Retry],
            QueueStatus::Done | QueueStatus::Error => &[QueueStatus::Processing],
            QueueStatus::Retry => &[QueueStatus::Error],
        }
    }

    pub fn can_advance_to(&self, next: QueueStatus) -> bool {
        next.predecessors().contains(self)
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        QueueStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| Error::configuration(format!("Unknown queue status: '{}'", s)))
    }
}

/// A row of the `parse_queue` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseQueueItem {
    pub id: i64,
    pub meet_id: i64,
    pub file_path: String,
    pub status: QueueStatus,
    pub message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// =============================================================================
// Error Log
// =============================================================================

/// An entry to append to the error log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewErrorLogEntry {
    pub file_path: Option<String>,
    pub meet_id: Option<i64>,
    pub region: Option<String>,
    pub kind: String,
    pub message: String,
    pub context: Option<serde_json::Value>,
}

impl NewErrorLogEntry {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file_path: None,
            meet_id: None,
            region: None,
            kind: kind.into(),
            message: message.into(),
            context: None,
        }
    }

    /// Build an entry from a decode or link warning
    pub fn from_warning(warning: &DecodeWarning) -> Self {
        let mut context = serde_json::json!({ "kind": warning.kind.as_str() });
        if let Some(line) = warning.line {
            context["line"] = serde_json::json!(line);
        }
        if !warning.context.is_null() {
            context["detail"] = warning.context.clone();
        }

        Self::new(warning.kind.as_str(), warning.message.clone()).context(context)
    }

    pub fn file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn meet(mut self, meet_id: i64) -> Self {
        self.meet_id = Some(meet_id);
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }
}

/// A row of the `error_log` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub id: i64,
    pub timestamp: String,
    pub file_path: Option<String>,
    pub meet_id: Option<i64>,
    pub region: Option<String>,
    pub kind: String,
    pub message: String,
    pub context: Option<serde_json::Value>,
}
