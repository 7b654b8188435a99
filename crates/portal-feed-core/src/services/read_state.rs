//! Single and bulk mark-read, applied optimistically to the local inbox
//! before the event store is told.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use super::inbox::NotificationInbox;
use super::unread::UnreadCountTracker;
use crate::config::{FeedConfig, MarkReadPolicy};
use crate::error::{FeedError, FeedResult};
use crate::models::Notification;
use crate::store::EventStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// The event store confirmed the write.
    Marked,
    /// Nothing to do; no request was sent.
    AlreadyRead,
}

/// Retry settings derived from [`FeedConfig`].
#[derive(Debug, Clone, Copy)]
struct WritePolicy {
    policy: MarkReadPolicy,
    retry_attempts: u32,
    retry_backoff: Duration,
}

pub struct ReadStateReconciler<S> {
    store: Arc<S>,
    tracker: Arc<UnreadCountTracker<S>>,
    inbox: Mutex<NotificationInbox>,
    write_policy: WritePolicy,
}

impl<S: EventStore> ReadStateReconciler<S> {
    pub fn new(store: Arc<S>, tracker: Arc<UnreadCountTracker<S>>, config: &FeedConfig) -> Self {
        Self {
            store,
            tracker,
            inbox: Mutex::new(NotificationInbox::new()),
            write_policy: WritePolicy {
                policy: config.mark_read_policy,
                retry_attempts: config.retry_attempts,
                retry_backoff: config.retry_backoff(),
            },
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inbox.lock().items().to_vec()
    }

    pub fn notification(&self, id: &str) -> Option<Notification> {
        self.inbox.lock().get(id).cloned()
    }

    pub fn local_unread(&self) -> usize {
        self.inbox.lock().unread_len()
    }

    /// Ids whose read write is still owed to the event store.
    pub fn pending_writes(&self) -> Vec<String> {
        self.inbox.lock().pending_ids()
    }

    pub fn has_pending_writes(&self) -> bool {
        self.inbox.lock().has_pending()
    }

    /// Replace the held notifications with a fresh fetch.
    ///
    /// On failure the previous records stay in place.
    pub async fn load(&self, limit: usize) -> FeedResult<usize> {
        let fetched = self.store.list_notifications(limit).await?;
        let mut inbox = self.inbox.lock();
        inbox.replace_all(fetched);
        Ok(inbox.items().len())
    }

    pub fn replace(&self, notifications: Vec<Notification>) {
        self.inbox.lock().replace_all(notifications);
    }

    /// Mark one notification read.
    ///
    /// The local flag is set before the request goes out. A record that is
    /// already read returns `AlreadyRead` without a request, so calling this
    /// twice decrements the counter at most once.
    pub async fn mark_one_read(&self, id: &str) -> FeedResult<MarkOutcome> {
        {
            let mut inbox = self.inbox.lock();
            match inbox.get(id) {
                None => {
                    return Err(FeedError::UnknownNotification { id: id.to_string() });
                }
                Some(n) if n.is_read => return Ok(MarkOutcome::AlreadyRead),
                Some(_) => {}
            }
            inbox.mark_read(id);
        }

        match self.write(|| self.store.mark_notification_read(id)).await {
            Ok(()) => {
                self.tracker.decrease_count(1);
                debug!(id, "notification marked read");
                Ok(MarkOutcome::Marked)
            }
            Err(err) => {
                let mut inbox = self.inbox.lock();
                match self.write_policy.policy {
                    MarkReadPolicy::Rollback => {
                        warn!(id, error = %err, "mark read failed, rolling back");
                        inbox.revert(&[id.to_string()]);
                    }
                    MarkReadPolicy::Retry => {
                        warn!(id, error = %err, "mark read failed, parked for next sync");
                        inbox.park(id);
                    }
                }
                Err(err)
            }
        }
    }

    /// Mark every held notification read and reset the counter on success.
    ///
    /// With nothing unread locally and a zero counter this is a no-op and
    /// no request is sent.
    pub async fn mark_all_read(&self) -> FeedResult<MarkOutcome> {
        let changed = {
            let mut inbox = self.inbox.lock();
            if inbox.unread_len() == 0 && self.tracker.count() == 0 {
                return Ok(MarkOutcome::AlreadyRead);
            }
            inbox.mark_all_read()
        };

        match self.write(|| self.store.mark_all_notifications_read()).await {
            Ok(()) => {
                self.tracker.reset_count();
                self.inbox.lock().settle_all();
                debug!(count = changed.len(), "all notifications marked read");
                Ok(MarkOutcome::Marked)
            }
            Err(err) => {
                let mut inbox = self.inbox.lock();
                match self.write_policy.policy {
                    MarkReadPolicy::Rollback => {
                        warn!(error = %err, count = changed.len(), "mark all read failed, rolling back");
                        inbox.revert(&changed);
                    }
                    MarkReadPolicy::Retry => {
                        warn!(error = %err, "mark all read failed, parked for next sync");
                        inbox.park_all();
                    }
                }
                Err(err)
            }
        }
    }

    /// Re-send writes that previously ran out of retries.
    ///
    /// Returns how many writes the event store confirmed. Writes that fail
    /// again stay parked.
    pub async fn flush_pending(&self) -> FeedResult<usize> {
        let (ids, pending_all) = {
            let inbox = self.inbox.lock();
            (inbox.pending_ids(), inbox.has_pending_all())
        };
        if ids.is_empty() && !pending_all {
            return Ok(0);
        }

        if pending_all {
            self.store.mark_all_notifications_read().await?;
            self.tracker.reset_count();
            self.inbox.lock().settle_all();
            debug!("parked mark all read delivered");
            return Ok(1);
        }

        let mut delivered = 0;
        for id in ids {
            self.store.mark_notification_read(&id).await?;
            self.inbox.lock().settle(&id);
            self.tracker.decrease_count(1);
            delivered += 1;
        }
        debug!(delivered, "parked mark read writes delivered");
        Ok(delivered)
    }

    /// Run `op`, retrying transient failures when the policy asks for it.
    async fn write<F, Fut>(&self, mut op: F) -> FeedResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = FeedResult<()>>,
    {
        let retries = match self.write_policy.policy {
            MarkReadPolicy::Rollback => 0,
            MarkReadPolicy::Retry => self.write_policy.retry_attempts,
        };

        let mut attempt = 0;
        loop {
            match op().await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_auth() => {
                    error!(error = %err, "mark read rejected, re-authentication required");
                    return Err(err);
                }
                Err(err) if attempt >= retries || !err.is_transient() => return Err(err),
                Err(err) => {
                    let delay = self
                        .write_policy
                        .retry_backoff
                        .saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    debug!(attempt, error = %err, "retrying mark read in {:?}", delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryEventStore, StoreOp};
    use crate::testing::{at, make_notification};

    type Harness = (
        Arc<InMemoryEventStore>,
        Arc<UnreadCountTracker<InMemoryEventStore>>,
        ReadStateReconciler<InMemoryEventStore>,
    );

    fn config(policy: MarkReadPolicy) -> FeedConfig {
        FeedConfig {
            mark_read_policy: policy,
            retry_attempts: 2,
            retry_backoff_ms: 1,
            ..FeedConfig::default()
        }
    }

    /// Four notifications, two unread, loaded and counted.
    async fn harness(policy: MarkReadPolicy) -> Harness {
        let store = Arc::new(InMemoryEventStore::with_records(
            vec![],
            vec![
                make_notification("n1", at(2026, 10, 16, 9, 0), false),
                make_notification("n2", at(2026, 10, 16, 8, 0), true),
                make_notification("n3", at(2026, 10, 15, 9, 0), false),
                make_notification("n4", at(2026, 10, 14, 9, 0), true),
            ],
        ));
        let tracker = Arc::new(UnreadCountTracker::new(store.clone()));
        let reconciler = ReadStateReconciler::new(store.clone(), tracker.clone(), &config(policy));
        reconciler.load(50).await.unwrap();
        tracker.refresh_count().await.unwrap();
        (store, tracker, reconciler)
    }

    #[tokio::test]
    async fn test_mark_one_read_decrements_once() {
        let (store, tracker, reconciler) = harness(MarkReadPolicy::Retry).await;
        assert_eq!(tracker.count(), 2);

        assert_eq!(reconciler.mark_one_read("n1").await.unwrap(), MarkOutcome::Marked);
        assert_eq!(reconciler.mark_one_read("n1").await.unwrap(), MarkOutcome::AlreadyRead);

        assert_eq!(tracker.count(), 1);
        assert_eq!(store.calls(StoreOp::MarkRead), 1);
        assert!(reconciler.notification("n1").unwrap().is_read);
    }

    #[tokio::test]
    async fn test_mark_read_on_read_record_sends_nothing() {
        let (store, tracker, reconciler) = harness(MarkReadPolicy::Retry).await;
        assert_eq!(reconciler.mark_one_read("n2").await.unwrap(), MarkOutcome::AlreadyRead);
        assert_eq!(store.calls(StoreOp::MarkRead), 0);
        assert_eq!(tracker.count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let (_store, _tracker, reconciler) = harness(MarkReadPolicy::Retry).await;
        let err = reconciler.mark_one_read("missing").await.unwrap_err();
        assert_eq!(err, FeedError::UnknownNotification { id: "missing".to_string() });
    }

    #[tokio::test]
    async fn test_flag_is_set_before_request_completes() {
        let (store, _tracker, reconciler) = harness(MarkReadPolicy::Retry).await;
        store.set_latency(StoreOp::MarkRead, Duration::from_millis(50));

        let reconciler = Arc::new(reconciler);
        let background = {
            let reconciler = reconciler.clone();
            tokio::spawn(async move { reconciler.mark_one_read("n3").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(reconciler.notification("n3").unwrap().is_read);
        // A concurrent second call is already a no-op
        assert_eq!(reconciler.mark_one_read("n3").await.unwrap(), MarkOutcome::AlreadyRead);

        assert_eq!(background.await.unwrap().unwrap(), MarkOutcome::Marked);
        assert_eq!(store.calls(StoreOp::MarkRead), 1);
    }

    #[tokio::test]
    async fn test_mark_all_read_then_again() {
        let (store, tracker, reconciler) = harness(MarkReadPolicy::Retry).await;

        assert_eq!(reconciler.mark_all_read().await.unwrap(), MarkOutcome::Marked);
        assert!(reconciler.notifications().iter().all(|n| n.is_read));
        assert_eq!(reconciler.notifications().len(), 4);
        assert_eq!(tracker.count(), 0);

        assert_eq!(reconciler.mark_all_read().await.unwrap(), MarkOutcome::AlreadyRead);
        assert_eq!(tracker.count(), 0);
        assert_eq!(store.calls(StoreOp::MarkAllRead), 1);
    }

    #[tokio::test]
    async fn test_rollback_policy_reverts_flag() {
        let (store, tracker, reconciler) = harness(MarkReadPolicy::Rollback).await;
        store.fail_next(StoreOp::MarkRead, FeedError::network("503"));

        let err = reconciler.mark_one_read("n1").await.unwrap_err();
        assert!(err.is_transient());
        assert!(!reconciler.notification("n1").unwrap().is_read);
        assert_eq!(tracker.count(), 2);
        // Rollback never retries
        assert_eq!(store.calls(StoreOp::MarkRead), 1);

        // A later attempt goes through normally
        assert_eq!(reconciler.mark_one_read("n1").await.unwrap(), MarkOutcome::Marked);
        assert_eq!(tracker.count(), 1);
    }

    #[tokio::test]
    async fn test_rollback_policy_reverts_bulk() {
        let (store, tracker, reconciler) = harness(MarkReadPolicy::Rollback).await;
        store.fail_next(StoreOp::MarkAllRead, FeedError::network("timeout"));

        assert!(reconciler.mark_all_read().await.is_err());
        assert_eq!(reconciler.local_unread(), 2);
        // Records that were read before stay read
        assert!(reconciler.notification("n2").unwrap().is_read);
        assert_eq!(tracker.count(), 2);
    }

    #[tokio::test]
    async fn test_retry_policy_recovers_from_transient_failure() {
        let (store, tracker, reconciler) = harness(MarkReadPolicy::Retry).await;
        store.fail_next(StoreOp::MarkRead, FeedError::network("reset"));

        assert_eq!(reconciler.mark_one_read("n1").await.unwrap(), MarkOutcome::Marked);
        assert_eq!(store.calls(StoreOp::MarkRead), 2);
        assert_eq!(tracker.count(), 1);
        assert!(!reconciler.has_pending_writes());
    }

    #[tokio::test]
    async fn test_retry_policy_parks_after_exhaustion() {
        let (store, tracker, reconciler) = harness(MarkReadPolicy::Retry).await;
        for _ in 0..3 {
            store.fail_next(StoreOp::MarkRead, FeedError::network("down"));
        }

        assert!(reconciler.mark_one_read("n1").await.is_err());
        assert_eq!(store.calls(StoreOp::MarkRead), 3);
        // Flag stays set, counter untouched, write owed
        assert!(reconciler.notification("n1").unwrap().is_read);
        assert_eq!(tracker.count(), 2);
        assert_eq!(reconciler.pending_writes(), vec!["n1".to_string()]);

        // Reload from a server that has not seen the write keeps it read
        reconciler.load(50).await.unwrap();
        assert!(reconciler.notification("n1").unwrap().is_read);

        assert_eq!(reconciler.flush_pending().await.unwrap(), 1);
        assert!(!reconciler.has_pending_writes());
        assert_eq!(tracker.count(), 1);
        assert_eq!(store.unread_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let (store, _tracker, reconciler) = harness(MarkReadPolicy::Retry).await;
        store.fail_next(StoreOp::MarkRead, FeedError::auth("expired"));

        let err = reconciler.mark_one_read("n3").await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(store.calls(StoreOp::MarkRead), 1);
    }

    #[tokio::test]
    async fn test_parked_mark_all_is_flushed() {
        let (store, tracker, reconciler) = harness(MarkReadPolicy::Retry).await;
        for _ in 0..3 {
            store.fail_next(StoreOp::MarkAllRead, FeedError::network("down"));
        }
        assert!(reconciler.mark_all_read().await.is_err());
        assert_eq!(reconciler.local_unread(), 0);
        assert_eq!(tracker.count(), 2);

        assert_eq!(reconciler.flush_pending().await.unwrap(), 1);
        assert_eq!(tracker.count(), 0);
        assert_eq!(store.unread_count().await.unwrap(), 0);
        assert_eq!(reconciler.flush_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_records() {
        let (store, _tracker, reconciler) = harness(MarkReadPolicy::Retry).await;
        store.fail_next(StoreOp::ListNotifications, FeedError::malformed("not json"));
        assert!(reconciler.load(50).await.is_err());
        assert_eq!(reconciler.notifications().len(), 4);
    }
}
