//! `GET /sources`: search results behind a previously generated answer.

use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};

use super::{QueryParams, text_response};
use crate::pipeline::Sources;
use crate::state::AppState;

/// Body sent when no results are cached for the query.
pub const SOURCES_MISSING: &str = "Error Retrieving Sources";

pub async fn sources(State(state): State<AppState>, Query(params): Query<QueryParams>) -> Response {
    match state.pipeline.sources(&params.q, &params.lang).await {
        Sources::Found(results) => Json(results).into_response(),
        Sources::Missing => text_response(Body::from(SOURCES_MISSING)),
    }
}
