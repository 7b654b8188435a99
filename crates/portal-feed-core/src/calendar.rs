//! Calendar conventions for every "today / this week / this month" decision.
//!
//! Instants are stored in UTC and converted to a fixed UTC offset before any
//! calendar comparison. Weeks are ISO-8601 weeks starting on Monday.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Offsets outside +/-24h are rejected.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    pub fn is_same_day(&self, instant: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.local_date(instant) == self.local_date(now)
    }

    pub fn is_yesterday(&self, instant: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.local_date(now).pred_opt() == Some(self.local_date(instant))
    }

    pub fn is_same_week(&self, instant: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.local_date(instant).iso_week() == self.local_date(now).iso_week()
    }

    pub fn is_same_month(&self, instant: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let date = self.local_date(instant);
        let today = self.local_date(now);
        date.year() == today.year() && date.month() == today.month()
    }

    pub fn weekday(&self, instant: DateTime<Utc>) -> Weekday {
        self.local_date(instant).weekday()
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// "Month D, YYYY", e.g. "October 7, 2026".
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
