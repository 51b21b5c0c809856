//! Unified error types for sift.
//!
//! The variants follow the failure classes the answer pipeline partitions on:
//! storage failures degrade to cache misses, upstream failures degrade to
//! weaker answers or a fixed user-facing message, and none of them are fatal
//! to the process.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the sift crates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cache storage is unreachable or a statement failed.
    #[error("CACHE_UNAVAILABLE: {0}")]
    CacheUnavailable(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_UNAVAILABLE: migration failed: {0}")]
    MigrationFailed(String),

    /// Search provider or language model could not be reached or refused the request.
    #[error("UPSTREAM_UNAVAILABLE: {0}")]
    UpstreamUnavailable(String),

    /// An upstream payload could not be decoded.
    #[error("DECODE_FAILURE: {0}")]
    DecodeFailure(String),
}

impl Error {
    /// Short machine-readable code, used as a structured logging field.
    pub fn code(&self) -> &'static str {
        match self {
            Error::CacheUnavailable(_) | Error::MigrationFailed(_) => "CACHE_UNAVAILABLE",
            Error::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            Error::DecodeFailure(_) => "DECODE_FAILURE",
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::CacheUnavailable(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::CacheUnavailable(tokio_rusqlite::Error::Close(c)),
            _ => Error::CacheUnavailable(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::CacheUnavailable(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::CacheUnavailable(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::DecodeFailure(err.to_string())
    }
}
