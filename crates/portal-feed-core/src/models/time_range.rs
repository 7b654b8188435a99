use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filter::FilterParseError;
use crate::calendar::Calendar;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [Self::All, Self::Today, Self::Week, Self::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All time",
            Self::Today => "Today",
            Self::Week => "This week",
            Self::Month => "This month",
        }
    }

    /// Whether `instant` falls inside this range as seen from `now`.
    pub fn contains(&self, calendar: &Calendar, instant: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            Self::Today => calendar.is_same_day(instant, now),
            Self::Week => calendar.is_same_week(instant, now),
            Self::Month => calendar.is_same_month(instant, now),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| FilterParseError::new("timeRange", s))
    }
}
