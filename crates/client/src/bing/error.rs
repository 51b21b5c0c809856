//! Bing API client error types.

use std::sync::Arc;

use crate::provider::ErrorKind;

/// Errors from the Bing Web Search client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// No subscription key configured.
    #[error("missing API key: bing_api_key not set")]
    MissingApiKey,

    /// Invalid search query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid count parameter (must be 1-50).
    #[error("invalid count: must be 1-50")]
    InvalidCount,

    /// Invalid market code.
    #[error("invalid market: {0}")]
    InvalidMarket(String),

    /// Invalid endpoint URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Authentication failed (invalid subscription key).
    #[error("authentication failed: invalid subscription key")]
    AuthError,

    /// Rate limited by Bing.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::Timeout | SearchError::Network(_) => ErrorKind::Network,
            SearchError::Parse(_) => ErrorKind::Decode,
            _ => ErrorKind::Upstream,
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { SearchError::Timeout } else { SearchError::Network(Arc::new(err)) }
    }
}

impl From<SearchError> for sift_core::Error {
    fn from(err: SearchError) -> Self {
        match err.kind() {
            ErrorKind::Decode => sift_core::Error::DecodeFailure(err.to_string()),
            _ => sift_core::Error::UpstreamUnavailable(err.to_string()),
        }
    }
}
