pub mod activity;
pub mod filter;
pub mod notification;
pub mod time_range;

pub use activity::{Activity, ActivityStatus, ActivityType, Priority};
pub use filter::{FilterParseError, FilterState, Selection};
pub use notification::Notification;
pub use time_range::TimeRange;

use chrono::{DateTime, Utc};

/// Anything that can be placed on the feed timeline.
pub trait Timestamped {
    fn id(&self) -> &str;
    fn timestamp(&self) -> DateTime<Utc>;
}
