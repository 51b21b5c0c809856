//! Chat completions client error types.

use std::sync::Arc;

use crate::provider::ErrorKind;

/// Errors from the chat completions client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    /// No API key configured.
    #[error("missing API key: openai_api_key not set")]
    MissingApiKey,

    /// Invalid base URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Authentication failed.
    #[error("authentication failed: invalid API key")]
    AuthError,

    /// Rate limited by the API.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// Non-success HTTP status.
    #[error("HTTP error {status}: {body}")]
    HttpError { status: u16, body: String },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error, including a connection dropped mid-stream.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Error object reported inside a stream.
    #[error("API error: {0}")]
    Api(String),

    /// Response or stream chunk could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// The streamed body ended before the `[DONE]` marker.
    #[error("stream ended before [DONE]")]
    Truncated,

    /// The completion contained no choices.
    #[error("empty response: no choices returned")]
    EmptyResponse,
}

impl LlmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::Timeout | LlmError::Network(_) | LlmError::Truncated => ErrorKind::Network,
            LlmError::Parse(_) | LlmError::EmptyResponse => ErrorKind::Decode,
            _ => ErrorKind::Upstream,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { LlmError::Timeout } else { LlmError::Network(Arc::new(err)) }
    }
}

impl From<LlmError> for sift_core::Error {
    fn from(err: LlmError) -> Self {
        match err.kind() {
            ErrorKind::Decode => sift_core::Error::DecodeFailure(err.to_string()),
            _ => sift_core::Error::UpstreamUnavailable(err.to_string()),
        }
    }
}
