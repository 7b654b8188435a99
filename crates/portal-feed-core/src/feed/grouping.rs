use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc, Weekday};

use crate::calendar::{format_long_date, weekday_name, Calendar};
use crate::models::Timestamped;

/// Date-relative heading for a group of feed items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketLabel {
    Today,
    Yesterday,
    /// Earlier in the current week
    Weekday(Weekday),
    Date(NaiveDate),
}

impl BucketLabel {
    pub fn for_instant(calendar: &Calendar, instant: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if calendar.is_same_day(instant, now) {
            Self::Today
        } else if calendar.is_yesterday(instant, now) {
            Self::Yesterday
        } else if calendar.is_same_week(instant, now) {
            Self::Weekday(calendar.weekday(instant))
        } else {
            Self::Date(calendar.local_date(instant))
        }
    }
}

impl fmt::Display for BucketLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today => f.write_str("Today"),
            Self::Yesterday => f.write_str("Yesterday"),
            Self::Weekday(day) => f.write_str(weekday_name(*day)),
            Self::Date(date) => f.write_str(&format_long_date(*date)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateBucket<T> {
    pub label: BucketLabel,
    pub items: Vec<T>,
}

impl<T> DateBucket<T> {
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Header text, e.g. "Today (2)"
    pub fn header(&self) -> String {
        format!("{} ({})", self.label, self.count())
    }
}

/// Buckets in the order their label was first met while scanning the input.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketedFeed<T> {
    buckets: Vec<DateBucket<T>>,
}

impl<T> Default for BucketedFeed<T> {
    fn default() -> Self {
        Self { buckets: Vec::new() }
    }
}

impl<T> BucketedFeed<T> {
    pub fn buckets(&self) -> &[DateBucket<T>] {
        &self.buckets
    }

    pub fn into_buckets(self) -> Vec<DateBucket<T>> {
        self.buckets
    }

    pub fn get(&self, label: &BucketLabel) -> Option<&DateBucket<T>> {
        self.buckets.iter().find(|b| &b.label == label)
    }

    pub fn labels(&self) -> Vec<BucketLabel> {
        self.buckets.iter().map(|b| b.label).collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Items across all buckets.
    pub fn total_items(&self) -> usize {
        self.buckets.iter().map(DateBucket::count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DateBucket<T>> {
        self.buckets.iter()
    }
}

pub fn group<T: Timestamped + Clone>(sorted: &[T], calendar: &Calendar) -> BucketedFeed<T> {
    group_at(sorted, calendar, Utc::now())
}

/// Group items that are already sorted newest first.
///
/// Items keep their input order inside each bucket.
pub fn group_at<T: Timestamped + Clone>(
    sorted: &[T],
    calendar: &Calendar,
    now: DateTime<Utc>,
) -> BucketedFeed<T> {
    let mut buckets: Vec<DateBucket<T>> = Vec::new();
    let mut positions: HashMap<BucketLabel, usize> = HashMap::new();

    for item in sorted {
        let label = BucketLabel::for_instant(calendar, item.timestamp(), now);
        let pos = *positions.entry(label).or_insert_with(|| {
            buckets.push(DateBucket {
                label,
                items: Vec::new(),
            });
            buckets.len() - 1
        });
        buckets[pos].items.push(item.clone());
    }

    BucketedFeed { buckets }
}
