//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::net::SocketAddr;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `listen_addr` is not a socket address
    /// - `cache_ttl_secs` or `purge_interval_secs` is 0
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `search_count` is outside 1-50
    /// - `model` or `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid {
                field: "listen_addr".into(),
                reason: format!("'{}' is not a socket address", self.listen_addr),
            });
        }

        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid { field: "cache_ttl_secs".into(), reason: "must be greater than 0".into() });
        }
        if self.purge_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "purge_interval_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if !(1..=50).contains(&self.search_count) {
            return Err(ConfigError::Invalid { field: "search_count".into(), reason: "must be between 1 and 50".into() });
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "model".into(), reason: "must not be empty".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.allowed_origins.is_empty() {
            tracing::warn!("allowed_origins is empty; browsers will reject cross-origin requests");
        }

        Ok(())
    }
}
