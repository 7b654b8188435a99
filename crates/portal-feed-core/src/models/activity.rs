use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filter::FilterParseError;
use super::Timestamped;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Compliance,
    ResultUpload,
    ResultDeleted,
    TimetableUpload,
    NewsUpload,
    StudentRegistration,
    SystemMaintenance,
}

impl ActivityType {
    pub const ALL: [ActivityType; 7] = [
        Self::Compliance,
        Self::ResultUpload,
        Self::ResultDeleted,
        Self::TimetableUpload,
        Self::NewsUpload,
        Self::StudentRegistration,
        Self::SystemMaintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliance => "COMPLIANCE",
            Self::ResultUpload => "RESULT_UPLOAD",
            Self::ResultDeleted => "RESULT_DELETED",
            Self::TimetableUpload => "TIMETABLE_UPLOAD",
            Self::NewsUpload => "NEWS_UPLOAD",
            Self::StudentRegistration => "STUDENT_REGISTRATION",
            Self::SystemMaintenance => "SYSTEM_MAINTENANCE",
        }
    }

    /// Human-readable name for headers and filter pickers
    pub fn label(&self) -> &'static str {
        match self {
            Self::Compliance => "Compliance",
            Self::ResultUpload => "Result Upload",
            Self::ResultDeleted => "Result Deleted",
            Self::TimetableUpload => "Timetable Upload",
            Self::NewsUpload => "News Upload",
            Self::StudentRegistration => "Student Registration",
            Self::SystemMaintenance => "System Maintenance",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| FilterParseError::new("type", s))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityStatus {
    New,
    Read,
    Critical,
    Info,
}

impl ActivityStatus {
    pub const ALL: [ActivityStatus; 4] = [Self::New, Self::Read, Self::Critical, Self::Info];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Read => "READ",
            Self::Critical => "CRITICAL",
            Self::Info => "INFO",
        }
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityStatus {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| FilterParseError::new("status", s))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| FilterParseError::new("priority", s))
    }
}

/// Audit-style event shown to administrators.
///
/// Records are fetched read-only from the event store; `timestamp` is the
/// creation instant and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub status: ActivityStatus,
    pub priority: Priority,
    /// Type-specific details (course code, semester, file name, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Activity {
    pub fn is_new(&self) -> bool {
        self.status == ActivityStatus::New
    }

    pub fn is_high_priority(&self) -> bool {
        self.priority == Priority::High
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

impl Timestamped for Activity {
    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
