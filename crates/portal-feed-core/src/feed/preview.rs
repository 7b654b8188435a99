use chrono::{DateTime, Utc};

use crate::calendar::Calendar;
use crate::constants::BADGE_CAP;
use crate::feed::filter::sort_newest_first;
use crate::models::Notification;

/// Compact dropdown view: the newest few notifications plus the badge.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub items: Vec<Notification>,
    pub unread: u64,
}

impl Preview {
    pub fn build(notifications: &[Notification], limit: usize, unread: u64) -> Self {
        let mut items = notifications.to_vec();
        sort_newest_first(&mut items);
        items.truncate(limit);
        Self { items, unread }
    }

    pub fn badge(&self) -> String {
        badge_label(self.unread)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Empty for zero, the number up to 99, then "99+".
pub fn badge_label(count: u64) -> String {
    match count {
        0 => String::new(),
        n if n > BADGE_CAP => format!("{}+", BADGE_CAP),
        n => n.to_string(),
    }
}

/// "Just now", "5m ago", "3h ago", "2d ago", then the short date.
pub fn relative_time_label(instant: DateTime<Utc>, now: DateTime<Utc>, calendar: &Calendar) -> String {
    let elapsed = now.signed_duration_since(instant);
    let minutes = elapsed.num_minutes();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        calendar
            .local_date(instant)
            .format("%b %-d, %Y")
            .to_string()
    }
}
