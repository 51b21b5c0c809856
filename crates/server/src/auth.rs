//! Static per-route credential check.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;

/// Key expected by one route; `None` leaves the route open.
pub type RouteKey = Option<Arc<str>>;

pub fn route_key(configured: Option<&str>) -> RouteKey {
    configured.filter(|key| !key.is_empty()).map(Arc::from)
}

/// Reject requests whose `Authorization` header does not carry the route key.
///
/// The key is accepted bare or behind a `Bearer ` prefix.
pub async fn require_key(State(expected): State<RouteKey>, request: Request, next: Next) -> Result<Response, ApiError> {
    let Some(expected) = expected else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value));

    if provided == Some(&*expected) {
        Ok(next.run(request).await)
    } else {
        tracing::debug!(path = %request.uri().path(), "rejected request with invalid credential");
        Err(ApiError::Unauthorized)
    }
}
