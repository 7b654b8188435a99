use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;

use super::EventStore;
use crate::error::{FeedError, FeedResult};
use crate::models::{Activity, Notification};

/// Event store operations, used to script failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListActivities,
    ListNotifications,
    UnreadCount,
    MarkRead,
    MarkAllRead,
}

#[derive(Default)]
struct MemoryState {
    activities: Vec<Activity>,
    notifications: Vec<Notification>,
    failures: HashMap<StoreOp, VecDeque<FeedError>>,
    /// Scripted (count, delay) answers for `unread_count`, consumed in order
    count_script: VecDeque<(u64, Duration)>,
    /// Scripted (records, delay) answers for `list_notifications`
    notification_script: VecDeque<(Vec<Notification>, Duration)>,
    latency: HashMap<StoreOp, Duration>,
    calls: HashMap<StoreOp, usize>,
}

/// Process-local event store for tests and demos.
///
/// Failures and latency can be scripted per operation, and every call is
/// counted so callers can assert on request side effects.
#[derive(Default)]
pub struct InMemoryEventStore {
    state: Mutex<MemoryState>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(activities: Vec<Activity>, notifications: Vec<Notification>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock();
            state.activities = activities;
            state.notifications = notifications;
        }
        store
    }

    pub fn set_activities(&self, activities: Vec<Activity>) {
        self.state.lock().activities = activities;
    }

    pub fn set_notifications(&self, notifications: Vec<Notification>) {
        self.state.lock().notifications = notifications;
    }

    pub fn push_notification(&self, notification: Notification) {
        self.state.lock().notifications.push(notification);
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state.lock().notifications.clone()
    }

    /// Make the next call of `op` fail with `error`. Queued errors are used in order.
    pub fn fail_next(&self, op: StoreOp, error: FeedError) {
        self.state
            .lock()
            .failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Answer the next `unread_count` call with `count` after `delay`.
    pub fn script_unread_count(&self, count: u64, delay: Duration) {
        self.state.lock().count_script.push_back((count, delay));
    }

    /// Answer the next `list_notifications` call with `records` after `delay`.
    pub fn script_notifications(&self, records: Vec<Notification>, delay: Duration) {
        self.state
            .lock()
            .notification_script
            .push_back((records, delay));
    }

    pub fn set_latency(&self, op: StoreOp, delay: Duration) {
        self.state.lock().latency.insert(op, delay);
    }

    pub fn calls(&self, op: StoreOp) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Record the call and pick up any scripted failure and latency.
    /// The lock is released before the caller awaits.
    fn begin(&self, op: StoreOp) -> (Option<FeedError>, Duration) {
        let mut state = self.state.lock();
        *state.calls.entry(op).or_insert(0) += 1;
        let failure = state.failures.get_mut(&op).and_then(VecDeque::pop_front);
        let delay = state.latency.get(&op).copied().unwrap_or_default();
        (failure, delay)
    }

    async fn enter(&self, op: StoreOp) -> FeedResult<()> {
        let (failure, delay) = self.begin(op);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl EventStore for InMemoryEventStore {
    async fn list_activities(&self, limit: usize) -> FeedResult<Vec<Activity>> {
        self.enter(StoreOp::ListActivities).await?;
        let state = self.state.lock();
        Ok(state.activities.iter().take(limit).cloned().collect())
    }

    async fn list_notifications(&self, limit: usize) -> FeedResult<Vec<Notification>> {
        let scripted = self.state.lock().notification_script.pop_front();
        if let Some((mut records, delay)) = scripted {
            self.begin(StoreOp::ListNotifications);
            tokio::time::sleep(delay).await;
            records.truncate(limit);
            return Ok(records);
        }

        self.enter(StoreOp::ListNotifications).await?;
        let state = self.state.lock();
        Ok(state.notifications.iter().take(limit).cloned().collect())
    }

    async fn unread_count(&self) -> FeedResult<u64> {
        let scripted = self.state.lock().count_script.pop_front();
        if let Some((count, delay)) = scripted {
            self.begin(StoreOp::UnreadCount);
            tokio::time::sleep(delay).await;
            return Ok(count);
        }

        self.enter(StoreOp::UnreadCount).await?;
        let state = self.state.lock();
        Ok(state.notifications.iter().filter(|n| !n.is_read).count() as u64)
    }

    async fn mark_notification_read(&self, id: &str) -> FeedResult<()> {
        self.enter(StoreOp::MarkRead).await?;
        let mut state = self.state.lock();
        // Unknown and already-read ids succeed, like the real store
        if let Some(n) = state.notifications.iter_mut().find(|n| n.id == id) {
            n.is_read = true;
        }
        Ok(())
    }

    async fn mark_all_notifications_read(&self) -> FeedResult<()> {
        self.enter(StoreOp::MarkAllRead).await?;
        let mut state = self.state.lock();
        for n in state.notifications.iter_mut() {
            n.is_read = true;
        }
        Ok(())
    }
}
