//! SQLite-backed artifact cache.
//!
//! Persistent key/value storage with per-entry expiry, accessed
//! asynchronously via tokio-rusqlite. It provides:
//!
//! - Canonical cache keys derived from (query, language)
//! - TTL'd upserts and expiry-aware reads
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod key;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use key::{CacheKey, cache_key, normalize_query};
pub use store::{ArtifactCache, DEFAULT_TTL};
