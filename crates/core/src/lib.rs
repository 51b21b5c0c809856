//! Core types and shared functionality for sift.
//!
//! This crate provides:
//! - Cache key normalization and the SQLite-backed artifact cache
//! - Unified error types
//! - Layered configuration

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{ArtifactCache, CacheDb, CacheKey};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
