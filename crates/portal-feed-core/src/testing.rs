//! Fixture builders shared by the unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::models::{Activity, ActivityStatus, ActivityType, Notification, Priority};

/// Friday 2026-10-16 12:00 UTC; every fixed-clock test reads "now" from here.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn days_ago(days: i64, hour: u32) -> DateTime<Utc> {
    let day = fixed_now() - Duration::days(days);
    day.date_naive()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
        .and_utc()
}

pub fn make_activity(id: &str, timestamp: DateTime<Utc>) -> Activity {
    Activity {
        id: id.to_string(),
        activity_type: ActivityType::NewsUpload,
        title: format!("Activity {}", id),
        description: String::new(),
        timestamp,
        status: ActivityStatus::Info,
        priority: Priority::Low,
        metadata: Default::default(),
        link: None,
    }
}

pub fn make_typed_activity(
    id: &str,
    timestamp: DateTime<Utc>,
    activity_type: ActivityType,
    status: ActivityStatus,
    priority: Priority,
) -> Activity {
    Activity {
        activity_type,
        status,
        priority,
        ..make_activity(id, timestamp)
    }
}

pub fn make_notification(id: &str, created_at: DateTime<Utc>, is_read: bool) -> Notification {
    Notification {
        id: id.to_string(),
        notification_type: "RESULT_PUBLISHED".to_string(),
        title: format!("Notification {}", id),
        message: String::new(),
        created_at,
        is_read,
        priority: None,
        link: None,
    }
}
