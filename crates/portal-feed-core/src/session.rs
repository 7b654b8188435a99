//! Wires the event store, the unread counter and the read-state reconciler
//! into one session that UI surfaces can share.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::calendar::Calendar;
use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};
use crate::feed::{self, BucketedFeed, FeedStats, Preview};
use crate::models::{Activity, FilterState, Notification};
use crate::services::{MarkOutcome, PollHandle, ReadStateReconciler, UnreadCountTracker, UnreadCountView};
use crate::store::EventStore;

/// What the full feed page renders for one filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedView {
    pub buckets: BucketedFeed<Activity>,
    /// Header counters over the unfiltered collection
    pub stats: FeedStats,
    pub matched: usize,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedPageState {
    /// Nothing fetched yet.
    Loading,
    Ready(FeedView),
    /// No record matches. `filtered_out` is true when records exist but the
    /// filter hides all of them.
    Empty { stats: FeedStats, filtered_out: bool },
    /// The last fetch failed. `stale` carries the last good snapshot, which
    /// must be shown as out of date.
    Error {
        error: FeedError,
        stale: Option<FeedView>,
    },
}

impl FeedPageState {
    /// Whether a retry affordance makes sense.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Error { error, .. } => error.is_transient(),
            _ => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Empty { .. } => "empty",
            Self::Error { .. } => "error",
        }
    }
}

#[derive(Default)]
struct FeedCache {
    /// Last-known-good activity collection
    activities: Option<Vec<Activity>>,
    fetched_at: Option<DateTime<Utc>>,
    last_error: Option<FeedError>,
    issued: u64,
    applied: u64,
    in_flight: usize,
}

pub struct FeedSession<S: EventStore> {
    config: FeedConfig,
    calendar: Calendar,
    store: Arc<S>,
    tracker: Arc<UnreadCountTracker<S>>,
    reconciler: ReadStateReconciler<S>,
    cache: Mutex<FeedCache>,
    poll: Mutex<Option<PollHandle>>,
    closed: AtomicBool,
}

impl<S: EventStore> FeedSession<S> {
    pub fn new(config: FeedConfig, store: S) -> Self {
        Self::with_shared_store(config, Arc::new(store))
    }

    pub fn with_shared_store(config: FeedConfig, store: Arc<S>) -> Self {
        let calendar = config.calendar();
        let tracker = Arc::new(UnreadCountTracker::new(store.clone()));
        let reconciler = ReadStateReconciler::new(store.clone(), tracker.clone(), &config);

        Self {
            config,
            calendar,
            store,
            tracker,
            reconciler,
            cache: Mutex::new(FeedCache::default()),
            poll: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Begin polling the unread count. Must run inside a Tokio runtime.
    pub fn start(&self) -> FeedResult<()> {
        self.ensure_open()?;
        let mut poll = self.poll.lock();
        if poll.is_none() {
            info!(
                interval_secs = self.config.poll_interval_secs,
                "starting unread count polling"
            );
            *poll = Some(self.tracker.start_polling(self.config.poll_interval()));
        }
        Ok(())
    }

    pub fn is_polling(&self) -> bool {
        self.poll
            .lock()
            .as_ref()
            .map(PollHandle::is_running)
            .unwrap_or(false)
    }

    /// Cancel polling and stop accepting writes from in-flight requests.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.tracker.retire();
        if let Some(mut handle) = self.poll.lock().take() {
            handle.cancel();
        }
        info!("feed session shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> FeedResult<()> {
        if self.is_closed() {
            Err(FeedError::SessionClosed)
        } else {
            Ok(())
        }
    }

    // ===== Sync =====

    /// Re-fetch activities and notifications.
    ///
    /// Parked mark-read writes are delivered first. Both lists are applied
    /// only if no later refresh has landed and the session is still open. A
    /// failed activity fetch keeps the previous snapshot and is reported
    /// through [`Self::page`].
    pub async fn refresh(&self) -> FeedResult<()> {
        self.ensure_open()?;

        if self.reconciler.has_pending_writes() {
            if let Err(err) = self.reconciler.flush_pending().await {
                warn!(error = %err, "parked mark read writes still failing");
            }
        }

        let seq = {
            let mut cache = self.cache.lock();
            cache.issued += 1;
            cache.in_flight += 1;
            cache.issued
        };

        let (activities, notifications) = futures::future::join(
            self.store.list_activities(self.config.activity_limit),
            self.store.list_notifications(self.config.notification_limit),
        )
        .await;

        let mut cache = self.cache.lock();
        cache.in_flight -= 1;
        self.ensure_open()?;

        if seq <= cache.applied {
            debug!(seq, applied = cache.applied, "discarding stale feed response");
            return Ok(());
        }
        cache.applied = seq;

        let notifications = match notifications {
            Ok(notifications) => {
                self.reconciler.replace(notifications);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "notification refresh failed, keeping previous inbox");
                Err(err)
            }
        };

        match activities {
            Ok(activities) => {
                debug!(count = activities.len(), "feed refreshed");
                cache.activities = Some(activities);
                cache.fetched_at = Some(Utc::now());
                cache.last_error = None;
            }
            Err(err) => {
                warn!(error = %err, "feed refresh failed, keeping last snapshot");
                cache.last_error = Some(err.clone());
                return Err(err);
            }
        }

        notifications
    }

    pub async fn refresh_unread(&self) -> FeedResult<u64> {
        self.ensure_open()?;
        self.tracker.refresh_count().await
    }

    pub fn is_loading(&self) -> bool {
        self.cache.lock().in_flight > 0
    }

    // ===== Views =====

    pub fn page(&self, filter: &FilterState) -> FeedPageState {
        self.page_at(filter, Utc::now())
    }

    pub fn page_at(&self, filter: &FilterState, now: DateTime<Utc>) -> FeedPageState {
        let cache = self.cache.lock();
        let view = match (&cache.activities, cache.fetched_at) {
            (Some(all), Some(fetched_at)) => Some(self.build_view(all, filter, fetched_at, now)),
            _ => None,
        };

        if let Some(error) = &cache.last_error {
            return FeedPageState::Error {
                error: error.clone(),
                stale: view,
            };
        }

        match view {
            None => FeedPageState::Loading,
            Some(view) if view.matched == 0 => FeedPageState::Empty {
                stats: view.stats,
                filtered_out: view.stats.total > 0,
            },
            Some(view) => FeedPageState::Ready(view),
        }
    }

    fn build_view(
        &self,
        all: &[Activity],
        filter: &FilterState,
        fetched_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> FeedView {
        let filtered = feed::apply_at(all, filter, &self.calendar, now);
        FeedView {
            matched: filtered.len(),
            buckets: feed::group_at(&filtered, &self.calendar, now),
            stats: feed::summarize_at(all, &self.calendar, now),
            fetched_at,
        }
    }

    /// Counters over the full last-known-good collection.
    pub fn stats(&self) -> Option<FeedStats> {
        self.stats_at(Utc::now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> Option<FeedStats> {
        self.cache
            .lock()
            .activities
            .as_ref()
            .map(|all| feed::summarize_at(all, &self.calendar, now))
    }

    /// Last-known-good activity collection, unfiltered.
    pub fn activities(&self) -> Vec<Activity> {
        self.cache.lock().activities.clone().unwrap_or_default()
    }

    pub fn preview(&self) -> Preview {
        Preview::build(
            &self.reconciler.notifications(),
            self.config.preview_limit,
            self.tracker.count(),
        )
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.reconciler.notifications()
    }

    pub fn unread_count(&self) -> u64 {
        self.tracker.count()
    }

    pub fn unread_view(&self) -> UnreadCountView {
        self.tracker.view()
    }

    pub fn last_unread_error(&self) -> Option<FeedError> {
        self.tracker.last_error()
    }

    pub fn pending_writes(&self) -> Vec<String> {
        self.reconciler.pending_writes()
    }

    // ===== Read state =====

    pub async fn mark_read(&self, id: &str) -> FeedResult<MarkOutcome> {
        self.ensure_open()?;
        self.reconciler.mark_one_read(id).await
    }

    pub async fn mark_all_read(&self) -> FeedResult<MarkOutcome> {
        self.ensure_open()?;
        self.reconciler.mark_all_read().await
    }
}

impl<S: EventStore> Drop for FeedSession<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
