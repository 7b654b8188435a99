/// Errors surfaced by the event store and the stateful feed services.
///
/// `AuthRequired` is terminal for the current session; `Network` and
/// `MalformedResponse` are transient and leave the last-known-good state
/// in place until the next poll.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("Authentication required: {message}")]
    AuthRequired { message: String },
    #[error("Network failure: {message}")]
    Network { message: String },
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },
    #[error("Unknown notification: {id}")]
    UnknownNotification { id: String },
    #[error("Feed session has been shut down")]
    SessionClosed,
}

pub type FeedResult<T> = Result<T, FeedError>;

impl FeedError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::AuthRequired {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthRequired { .. })
    }

    /// Whether the next scheduled poll may succeed where this one failed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::MalformedResponse { .. })
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FeedError::malformed(err.to_string())
        } else {
            FeedError::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::malformed(err.to_string())
    }
}
