use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::EventStore;
use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};
use crate::models::{Activity, Notification};

/// Body of the unread-count endpoint; a bare number is accepted as well.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UnreadCountBody {
    Wrapped { count: u64 },
    Bare(u64),
}

/// Event store client speaking JSON over HTTP.
///
/// 401/403 map to `AuthRequired`, any other non-2xx to `Network`, and a body
/// that does not decode to `MalformedResponse`.
pub struct HttpEventStore {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpEventStore {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::network(format!("Failed to build HTTP client: {}", e)))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| FeedError::network(format!("Invalid event store URL {}: {}", base_url, e)))?;

        Ok(Self {
            base_url,
            auth_token,
            client,
        })
    }

    pub fn from_config(config: &FeedConfig) -> FeedResult<Self> {
        Self::new(
            config.base_url.clone(),
            config.auth_token.clone(),
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL plus `segments`, each percent-encoded as a single path segment.
    fn endpoint(&self, segments: &[&str]) -> FeedResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FeedError::network(format!("Invalid event store URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| FeedError::network(format!("Event store URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> FeedResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| FeedError::network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FeedError::auth(format!(
                "Event store rejected credentials ({})",
                status
            )));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FeedError::network(format!(
                "Event store error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str], limit: Option<usize>) -> FeedResult<T> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        let mut builder = self.request(Method::GET, url);
        if let Some(limit) = limit {
            builder = builder.query(&[("limit", limit)]);
        }

        let response = self.send(builder).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| FeedError::network(e.to_string()))?;

        serde_json::from_slice(&body)
            .map_err(|e| FeedError::malformed(format!("Unexpected body from {}: {}", path, e)))
    }

    async fn patch(&self, segments: &[&str]) -> FeedResult<()> {
        let url = self.endpoint(segments)?;
        self.send(self.request(Method::PATCH, url)).await?;
        Ok(())
    }
}

impl EventStore for HttpEventStore {
    async fn list_activities(&self, limit: usize) -> FeedResult<Vec<Activity>> {
        let activities: Vec<Activity> = self.get_json(&["activities"], Some(limit)).await?;
        debug!(count = activities.len(), "fetched activities");
        Ok(activities)
    }

    async fn list_notifications(&self, limit: usize) -> FeedResult<Vec<Notification>> {
        let notifications: Vec<Notification> =
            self.get_json(&["notifications"], Some(limit)).await?;
        debug!(count = notifications.len(), "fetched notifications");
        Ok(notifications)
    }

    async fn unread_count(&self) -> FeedResult<u64> {
        let body: UnreadCountBody = self.get_json(&["notifications", "unread-count"], None).await?;
        Ok(match body {
            UnreadCountBody::Wrapped { count } => count,
            UnreadCountBody::Bare(count) => count,
        })
    }

    async fn mark_notification_read(&self, id: &str) -> FeedResult<()> {
        self.patch(&["notifications", id, "read"]).await
    }

    async fn mark_all_notifications_read(&self) -> FeedResult<()> {
        self.patch(&["notifications", "read-all"]).await
    }
}
