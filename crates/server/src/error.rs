//! HTTP-facing errors for the sift server.
//!
//! Degraded upstream and cache paths are handled inside the pipeline; only
//! what the caller has to act on becomes an [`ApiError`].

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::pipeline::RelatedError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Authorization header missing or not matching the route's key.
    #[error("UNAUTHORIZED: missing or invalid credential")]
    Unauthorized,

    /// The language model could not produce a response.
    #[error("UPSTREAM_UNAVAILABLE: {0}")]
    Upstream(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<RelatedError> for ApiError {
    fn from(err: RelatedError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], self.to_string()).into_response()
    }
}
