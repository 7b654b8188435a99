use std::fmt;
use std::str::FromStr;

use super::activity::{ActivityStatus, ActivityType, Priority};
use super::time_range::TimeRange;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {dimension} value: {value}")]
pub struct FilterParseError {
    pub dimension: &'static str,
    pub value: String,
}

impl FilterParseError {
    pub fn new(dimension: &'static str, value: &str) -> Self {
        Self {
            dimension,
            value: value.to_string(),
        }
    }
}

/// One filter dimension: either everything, or records equal to one value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(value) => write!(f, "{}", value),
        }
    }
}

impl<T: FromStr<Err = FilterParseError>> FromStr for Selection<T> {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// The four independently settable feed filter dimensions.
///
/// The default value is the cleared state (every dimension `All`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilterState {
    pub time_range: TimeRange,
    pub activity_type: Selection<ActivityType>,
    pub status: Selection<ActivityStatus>,
    pub priority: Selection<Priority>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cleared state; `self` is left untouched.
    pub fn clear(&self) -> Self {
        Self::default()
    }

    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = time_range;
        self
    }

    pub fn with_type(mut self, activity_type: Selection<ActivityType>) -> Self {
        self.activity_type = activity_type;
        self
    }

    pub fn with_status(mut self, status: Selection<ActivityStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Selection<Priority>) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_cleared(&self) -> bool {
        self.active_dimensions() == 0
    }

    /// Number of dimensions narrowing the feed (drives the "clear filters" affordance).
    pub fn active_dimensions(&self) -> usize {
        [
            self.time_range != TimeRange::All,
            !self.activity_type.is_all(),
            !self.status.is_all(),
            !self.priority.is_all(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timeRange={} type={} status={} priority={}",
            self.time_range, self.activity_type, self.status, self.priority
        )
    }
}
