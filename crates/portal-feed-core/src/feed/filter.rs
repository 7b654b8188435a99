use chrono::{DateTime, Utc};

use crate::calendar::Calendar;
use crate::models::{Activity, FilterState, Timestamped};

/// Filter `activities` against "now" and return the matches newest first.
pub fn apply(activities: &[Activity], filter: &FilterState, calendar: &Calendar) -> Vec<Activity> {
    apply_at(activities, filter, calendar, Utc::now())
}

/// Same as [`apply`] with an explicit "now".
///
/// Every dimension must match; a dimension set to `All` always matches. The
/// result is sorted by timestamp descending whatever the input order.
pub fn apply_at(
    activities: &[Activity],
    filter: &FilterState,
    calendar: &Calendar,
    now: DateTime<Utc>,
) -> Vec<Activity> {
    let mut result: Vec<Activity> = activities
        .iter()
        .filter(|activity| matches(activity, filter, calendar, now))
        .cloned()
        .collect();
    sort_newest_first(&mut result);
    result
}

pub fn matches(
    activity: &Activity,
    filter: &FilterState,
    calendar: &Calendar,
    now: DateTime<Utc>,
) -> bool {
    filter.time_range.contains(calendar, activity.timestamp, now)
        && filter.activity_type.matches(&activity.activity_type)
        && filter.status.matches(&activity.status)
        && filter.priority.matches(&activity.priority)
}

/// Stable sort, so records sharing a timestamp keep their relative order.
pub fn sort_newest_first<T: Timestamped>(items: &mut [T]) {
    items.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityStatus, ActivityType, Priority, Selection, TimeRange};
    use crate::testing::{at, days_ago, fixed_now, make_activity, make_typed_activity};

    fn assert_sorted_desc(items: &[Activity]) {
        for pair in items.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    #[test]
    fn test_today_range_keeps_only_today() {
        let activities = vec![
            make_activity("yesterday", at(2026, 10, 15, 18, 0)),
            make_activity("nine", at(2026, 10, 16, 9, 0)),
            make_activity("ten", at(2026, 10, 16, 10, 0)),
        ];
        let filter = FilterState::new().with_time_range(TimeRange::Today);
        let result = apply_at(&activities, &filter, &Calendar::utc(), fixed_now());

        let ids: Vec<&str> = result.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["ten", "nine"]);
    }

    #[test]
    fn test_cleared_filter_returns_everything_sorted() {
        let activities = vec![
            make_activity("old", days_ago(40, 8)),
            make_activity("new", days_ago(0, 8)),
            make_activity("mid", days_ago(3, 8)),
        ];
        let result = apply_at(&activities, &FilterState::new(), &Calendar::utc(), fixed_now());
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].id, "new");
        assert_eq!(result[2].id, "old");
        assert_sorted_desc(&result);
    }

    #[test]
    fn test_all_dimensions_are_anded() {
        use ActivityStatus::*;
        use ActivityType::*;
        use Priority::*;

        // Friday 2026-10-16; the current ISO week starts Monday 2026-10-12.
        let activities = vec![
            make_typed_activity("a", at(2026, 10, 16, 8, 0), ResultUpload, New, High),
            make_typed_activity("b", at(2026, 10, 12, 8, 0), ResultUpload, New, Low),
            make_typed_activity("c", at(2026, 10, 14, 8, 0), ResultUpload, Read, High),
            make_typed_activity("d", at(2026, 10, 13, 8, 0), ResultDeleted, New, High),
            make_typed_activity("e", at(2026, 10, 11, 8, 0), ResultUpload, New, High),
            make_typed_activity("f", at(2026, 10, 15, 23, 59), ResultUpload, New, Medium),
            make_typed_activity("g", at(2026, 9, 30, 8, 0), ResultUpload, New, High),
            make_typed_activity("h", at(2026, 10, 14, 8, 0), Compliance, Critical, High),
            make_typed_activity("i", at(2026, 10, 16, 11, 0), TimetableUpload, New, Low),
            make_typed_activity("j", at(2026, 10, 13, 7, 0), ResultUpload, Info, Low),
            make_typed_activity("k", at(2026, 10, 5, 8, 0), ResultUpload, New, Low),
            make_typed_activity("l", at(2026, 10, 14, 9, 0), NewsUpload, New, Medium),
        ];
        let filter = FilterState::new()
            .with_type(Selection::Only(ResultUpload))
            .with_status(Selection::Only(New))
            .with_time_range(TimeRange::Week);

        let result = apply_at(&activities, &filter, &Calendar::utc(), fixed_now());
        let ids: Vec<&str> = result.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "f", "b"]);
        assert_sorted_desc(&result);
    }

    #[test]
    fn test_priority_filter() {
        let activities = vec![
            make_typed_activity("x", days_ago(1, 9), ActivityType::Compliance, ActivityStatus::Critical, Priority::High),
            make_typed_activity("y", days_ago(1, 10), ActivityType::Compliance, ActivityStatus::Info, Priority::Medium),
        ];
        let filter = FilterState::new().with_priority(Selection::Only(Priority::High));
        let result = apply_at(&activities, &filter, &Calendar::utc(), fixed_now());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "x");
    }

    #[test]
    fn test_month_range() {
        let activities = vec![
            make_activity("this-month", at(2026, 10, 1, 0, 0)),
            make_activity("last-month", at(2026, 9, 30, 23, 59)),
            make_activity("last-year", at(2025, 10, 16, 12, 0)),
        ];
        let filter = FilterState::new().with_time_range(TimeRange::Month);
        let result = apply_at(&activities, &filter, &Calendar::utc(), fixed_now());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "this-month");
    }

    #[test]
    fn test_empty_input() {
        let result = apply_at(&[], &FilterState::new(), &Calendar::utc(), fixed_now());
        assert!(result.is_empty());
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let ts = days_ago(2, 10);
        let activities = vec![
            make_activity("first", ts),
            make_activity("second", ts),
            make_activity("newest", days_ago(0, 1)),
        ];
        let result = apply_at(&activities, &FilterState::new(), &Calendar::utc(), fixed_now());
        let ids: Vec<&str> = result.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "first", "second"]);
    }
}
