//! Read/write contract of the event store that owns activity and
//! notification records, plus the HTTP and in-memory implementations.

pub mod http;
pub mod memory;

pub use http::HttpEventStore;
pub use memory::{InMemoryEventStore, StoreOp};

use std::future::Future;

use crate::error::FeedResult;
use crate::models::{Activity, Notification};

/// Operations the feed engine consumes from the event store.
///
/// Ordering of returned records is not guaranteed; callers sort. Both
/// mark-read operations are idempotent on the store side.
pub trait EventStore: Send + Sync + 'static {
    fn list_activities(&self, limit: usize) -> impl Future<Output = FeedResult<Vec<Activity>>> + Send;

    fn list_notifications(
        &self,
        limit: usize,
    ) -> impl Future<Output = FeedResult<Vec<Notification>>> + Send;

    fn unread_count(&self) -> impl Future<Output = FeedResult<u64>> + Send;

    fn mark_notification_read(&self, id: &str) -> impl Future<Output = FeedResult<()>> + Send;

    fn mark_all_notifications_read(&self) -> impl Future<Output = FeedResult<()>> + Send;
}
