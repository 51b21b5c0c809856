//! `GET /search`: the streamed answer for a query.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::response::Response;
use tokio_util::io::ReaderStream;

use super::{QueryParams, text_response};
use crate::pipeline::Answer;
use crate::state::AppState;

/// Cached answers are sent whole; fresh answers are streamed as generated.
///
/// The cache writes of a fresh answer are left running after the handler returns.
pub async fn search(State(state): State<AppState>, Query(params): Query<QueryParams>) -> Response {
    match state.pipeline.answer(&params.q, &params.lang).await {
        Answer::Cached(text) => text_response(Body::from(text)),
        Answer::Streaming(stream) => text_response(Body::from_stream(ReaderStream::new(stream.reader))),
        Answer::Unavailable(message) => text_response(Body::from(message)),
    }
}
