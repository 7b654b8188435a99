//! Shared defaults
//!
//! Centralized location for the tunables that the config layer, the
//! services and the CLI all fall back to.

/// Interval between authoritative unread-count polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// How many activities a feed sync requests from the event store.
pub const DEFAULT_ACTIVITY_LIMIT: usize = 100;

/// How many notifications a feed sync requests from the event store.
pub const DEFAULT_NOTIFICATION_LIMIT: usize = 50;

/// Rows shown in the compact preview list.
pub const DEFAULT_PREVIEW_LIMIT: usize = 5;

/// Per-request timeout for the HTTP event store.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

// Mark-read retry defaults
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Badge values above this render as "99+".
pub const BADGE_CAP: u64 = 99;

/// Default event store endpoint
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
