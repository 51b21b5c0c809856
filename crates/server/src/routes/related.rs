//! `GET /related`: follow-up questions for a query.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::response::Response;

use super::{QueryParams, text_response};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn related(State(state): State<AppState>, Query(params): Query<QueryParams>) -> Result<Response, ApiError> {
    let questions = state.pipeline.related_questions(&params.q, &params.lang).await?;
    Ok(text_response(Body::from(questions)))
}
