//! sift HTTP service.
//!
//! This crate provides:
//! - The cache-aside answer pipeline and its streaming reader
//! - The axum routes, per-route credential checks and CORS setup

pub mod auth;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use pipeline::{Answer, AnswerPipeline, Sources};
pub use routes::router;
pub use state::AppState;
