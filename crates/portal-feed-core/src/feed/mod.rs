//! Pure feed transformations: filtering, date bucketing, summary stats and
//! the compact preview. Nothing here touches the event store or shared state.

pub mod filter;
pub mod grouping;
pub mod preview;
pub mod stats;

pub use filter::{apply, apply_at, matches, sort_newest_first};
pub use grouping::{group, group_at, BucketLabel, BucketedFeed, DateBucket};
pub use preview::{badge_label, relative_time_label, Preview};
pub use stats::{counts_by_type, summarize, summarize_at, FeedStats};
