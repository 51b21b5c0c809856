//! HTTP routes.
//!
//! Each query route sits behind its own credential (see [`crate::auth`]);
//! `/health` is always open. CORS and request tracing wrap the whole router.

pub mod related;
pub mod search;
pub mod sources;

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde::{Deserialize, Serialize};
use sift_core::AppConfig;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{require_key, route_key};
use crate::state::AppState;

const CORS_MAX_AGE: Duration = Duration::from_secs(10_800);

/// `?q=&lang=` shared by the query routes. Missing values are empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub lang: String,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

pub(crate) fn text_response(body: Body) -> Response {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(CORS_MAX_AGE)
}

/// Build the application router.
pub fn router(state: AppState, config: &AppConfig) -> Router {
    let search = Router::new()
        .route("/search", get(search::search))
        .route_layer(middleware::from_fn_with_state(route_key(config.search_api_key.as_deref()), require_key));

    let sources = Router::new()
        .route("/sources", get(sources::sources))
        .route_layer(middleware::from_fn_with_state(route_key(config.sources_api_key.as_deref()), require_key));

    let related = Router::new()
        .route("/related", get(related::related))
        .route_layer(middleware::from_fn_with_state(route_key(config.related_api_key.as_deref()), require_key));

    Router::new()
        .merge(search)
        .merge(sources)
        .merge(related)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.allowed_origins))
        .with_state(state)
}
