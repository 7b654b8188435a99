use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calendar::Calendar;
use crate::constants::*;

/// What to do when a mark-read write fails after the optimistic update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkReadPolicy {
    /// Revert the local flag to unread.
    Rollback,
    /// Keep the flag, retry with backoff, then park the write for the next sync.
    #[default]
    Retry,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Feed engine configuration, loadable from a camelCase JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedConfig {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    pub poll_interval_secs: u64,
    pub activity_limit: usize,
    pub notification_limit: usize,
    pub preview_limit: usize,
    /// Offset used for every calendar decision (today, this week, ...)
    pub utc_offset_minutes: i32,
    pub request_timeout_secs: u64,
    pub mark_read_policy: MarkReadPolicy,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
            notification_limit: DEFAULT_NOTIFICATION_LIMIT,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            utc_offset_minutes: 0,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            mark_read_policy: MarkReadPolicy::default(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl FeedConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Zero is treated as one second so the poll loop never spins.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Out-of-range offsets fall back to UTC.
    pub fn calendar(&self) -> Calendar {
        Calendar::from_offset_minutes(self.utc_offset_minutes).unwrap_or_else(|| {
            warn!(
                offset_minutes = self.utc_offset_minutes,
                "utcOffsetMinutes out of range, using UTC"
            );
            Calendar::utc()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config_minimal() {
        let config = FeedConfig::from_json("{}").unwrap();
        assert_eq!(config, FeedConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.mark_read_policy, MarkReadPolicy::Retry);
    }

    #[test]
    fn test_parse_config_full() {
        let json = r#"{
            "baseUrl": "https://portal.example.edu/api",
            "authToken": "tok-123",
            "pollIntervalSecs": 15,
            "previewLimit": 3,
            "utcOffsetMinutes": 60,
            "markReadPolicy": "rollback",
            "retryAttempts": 0
        }"#;
        let config = FeedConfig::from_json(json).unwrap();
        assert_eq!(config.base_url, "https://portal.example.edu/api");
        assert_eq!(config.auth_token.as_deref(), Some("tok-123"));
        assert_eq!(config.poll_interval(), Duration::from_secs(15));
        assert_eq!(config.preview_limit, 3);
        assert_eq!(config.mark_read_policy, MarkReadPolicy::Rollback);
        assert_eq!(config.retry_attempts, 0);
        // Untouched fields keep their defaults
        assert_eq!(config.activity_limit, DEFAULT_ACTIVITY_LIMIT);
        assert_eq!(config.calendar().offset().local_minus_utc(), 3600);
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let config = FeedConfig::from_json(r#"{"pollIntervalSecs": 0}"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_bad_offset_falls_back_to_utc() {
        let config = FeedConfig::from_json(r#"{"utcOffsetMinutes": 100000}"#).unwrap();
        assert_eq!(config.calendar(), Calendar::utc());
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        assert!(FeedConfig::from_json(r#"{"markReadPolicy": "ignore"}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"baseUrl": "http://127.0.0.1:9000"}}"#).unwrap();
        let config = FeedConfig::load(file.path()).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000");

        let missing = FeedConfig::load(Path::new("/nonexistent/portal-feed.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_json_roundtrip_omits_missing_token() {
        let json = FeedConfig::default().to_json().unwrap();
        assert!(!json.contains("authToken"));
        assert_eq!(FeedConfig::from_json(&json).unwrap(), FeedConfig::default());
    }
}
