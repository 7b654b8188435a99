//! The single authoritative unread counter.
//!
//! One `UnreadCountTracker` exists per session. Surfaces read it through
//! [`UnreadCountView`] handles; nothing else keeps a copy. A periodic poll
//! overwrites the value with the event store's count, while mark-read flows
//! nudge it down optimistically in between.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::{FeedError, FeedResult};
use crate::feed::badge_label;
use crate::store::EventStore;

struct CountState {
    count: u64,
    /// Sequence number handed to the most recently issued fetch
    issued: u64,
    /// Sequence number of the fetch whose result is currently applied
    applied: u64,
    last_error: Option<FeedError>,
    retired: bool,
}

pub struct UnreadCountTracker<S> {
    store: Arc<S>,
    state: Mutex<CountState>,
    count_tx: watch::Sender<u64>,
}

impl<S: EventStore> UnreadCountTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        let (count_tx, _) = watch::channel(0);
        Self {
            store,
            state: Mutex::new(CountState {
                count: 0,
                issued: 0,
                applied: 0,
                last_error: None,
                retired: false,
            }),
            count_tx,
        }
    }

    pub fn count(&self) -> u64 {
        self.state.lock().count
    }

    /// A read-only handle on the counter for badges and previews.
    pub fn view(&self) -> UnreadCountView {
        UnreadCountView {
            rx: self.count_tx.subscribe(),
        }
    }

    pub fn last_error(&self) -> Option<FeedError> {
        self.state.lock().last_error.clone()
    }

    pub fn is_retired(&self) -> bool {
        self.state.lock().retired
    }

    /// Fetch the authoritative count and overwrite the local value.
    ///
    /// Responses are applied in issue order: a response older than the one
    /// already applied is dropped, so the last issued fetch wins even when
    /// several are in flight. On failure the counter is left unchanged.
    pub async fn refresh_count(&self) -> FeedResult<u64> {
        let seq = {
            let mut state = self.state.lock();
            if state.retired {
                return Err(FeedError::SessionClosed);
            }
            state.issued += 1;
            state.issued
        };

        let result = self.store.unread_count().await;

        let mut state = self.state.lock();
        if state.retired {
            debug!(seq, "discarding unread count for retired session");
            return Err(FeedError::SessionClosed);
        }

        match result {
            Ok(count) => {
                if seq <= state.applied {
                    debug!(seq, applied = state.applied, "discarding stale unread count");
                    return Ok(state.count);
                }
                state.applied = seq;
                state.last_error = None;
                self.publish(&mut state, count);
                debug!(seq, count, "unread count refreshed");
                Ok(count)
            }
            Err(err) => {
                if err.is_auth() {
                    error!(error = %err, "unread count refresh needs re-authentication");
                } else {
                    warn!(error = %err, "unread count refresh failed, keeping {}", state.count);
                }
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Optimistic local decrement, clamped at zero.
    pub fn decrease_count(&self, n: u64) -> u64 {
        let mut state = self.state.lock();
        if state.retired {
            return state.count;
        }
        let next = state.count.saturating_sub(n);
        self.publish(&mut state, next);
        next
    }

    pub fn reset_count(&self) {
        let mut state = self.state.lock();
        if !state.retired {
            self.publish(&mut state, 0);
        }
    }

    /// Stop accepting writes; late responses are discarded from now on.
    pub fn retire(&self) {
        self.state.lock().retired = true;
    }

    fn publish(&self, state: &mut CountState, count: u64) {
        state.count = count;
        self.count_tx.send_replace(count);
    }

    /// Refresh now, then every `interval` until the returned handle is
    /// cancelled or dropped. An authentication failure stops the loop.
    pub fn start_polling(self: &Arc<Self>, interval: Duration) -> PollHandle {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let tracker = Arc::clone(self);
        let task = tokio::spawn(run_poll_loop(tracker, interval, cancel_rx));

        PollHandle {
            cancel_tx,
            task: Some(task),
        }
    }
}

async fn run_poll_loop<S: EventStore>(
    tracker: Arc<UnreadCountTracker<S>>,
    interval: Duration,
    mut cancel_rx: watch::Receiver<bool>,
) {
    debug!(interval_secs = interval.as_secs_f64(), "unread count polling started");

    loop {
        // The in-flight fetch is dropped if cancellation arrives first
        tokio::select! {
            _ = wait_for_cancel(&mut cancel_rx) => break,
            result = tracker.refresh_count() => {
                match result {
                    Err(err) if err.is_auth() => {
                        warn!("unread count polling stopped until re-authentication");
                        break;
                    }
                    Err(FeedError::SessionClosed) => break,
                    // Transient failures wait for the next tick
                    _ => {}
                }
            }
        }

        tokio::select! {
            _ = wait_for_cancel(&mut cancel_rx) => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!("unread count polling stopped");
}

/// Resolves once cancellation is requested or the handle is gone.
async fn wait_for_cancel(cancel_rx: &mut watch::Receiver<bool>) {
    while !*cancel_rx.borrow() {
        if cancel_rx.changed().await.is_err() {
            return;
        }
    }
}

/// Owns the poll task; cancelling or dropping it stops polling.
pub struct PollHandle {
    cancel_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn cancel(&mut self) {
        let _ = self.cancel_tx.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Derived, read-only view of the session's unread counter.
#[derive(Clone)]
pub struct UnreadCountView {
    rx: watch::Receiver<u64>,
}

impl UnreadCountView {
    pub fn get(&self) -> u64 {
        *self.rx.borrow()
    }

    pub fn badge(&self) -> String {
        badge_label(self.get())
    }

    /// Wait for the next change and return the new value.
    pub async fn changed(&mut self) -> FeedResult<u64> {
        self.rx
            .changed()
            .await
            .map_err(|_| FeedError::SessionClosed)?;
        Ok(*self.rx.borrow_and_update())
    }
}
