use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::calendar::Calendar;
use crate::models::{Activity, ActivityType};

/// Summary counters for the feed header.
///
/// Always computed over the full collection so the numbers stay put while
/// the user changes filters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub total: usize,
    pub new: usize,
    /// High-priority records
    pub critical: usize,
    pub today: usize,
}

pub fn summarize(all: &[Activity], calendar: &Calendar) -> FeedStats {
    summarize_at(all, calendar, Utc::now())
}

pub fn summarize_at(all: &[Activity], calendar: &Calendar, now: DateTime<Utc>) -> FeedStats {
    all.iter().fold(FeedStats::default(), |mut stats, activity| {
        stats.total += 1;
        if activity.is_new() {
            stats.new += 1;
        }
        if activity.is_high_priority() {
            stats.critical += 1;
        }
        if calendar.is_same_day(activity.timestamp, now) {
            stats.today += 1;
        }
        stats
    })
}

/// Record counts per activity type, most frequent first.
pub fn counts_by_type(all: &[Activity]) -> Vec<(ActivityType, usize)> {
    let mut counts: HashMap<ActivityType, usize> = HashMap::new();
    for activity in all {
        *counts.entry(activity.activity_type).or_insert(0) += 1;
    }
    let mut by_type: Vec<_> = counts.into_iter().collect();
    // Ties resolve by declaration order so the output is deterministic
    by_type.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    by_type
}
