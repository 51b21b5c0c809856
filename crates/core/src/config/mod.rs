//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SIFT_*)
//! 2. TOML config file (if SIFT_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SIFT_*)
/// 2. TOML config file (if SIFT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SIFT_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// TTL in seconds applied to answers, search results and related questions.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Interval in seconds between sweeps that delete expired cache rows.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,

    /// Bing Web Search endpoint.
    #[serde(default = "default_bing_endpoint")]
    pub bing_endpoint: String,

    /// Bing subscription key.
    ///
    /// Set via SIFT_BING_API_KEY environment variable.
    #[serde(default)]
    pub bing_api_key: Option<String>,

    /// Number of web results requested per query.
    #[serde(default = "default_search_count")]
    pub search_count: u8,

    /// Market code sent with every search (e.g. "en-US").
    #[serde(default = "default_search_market")]
    pub search_market: String,

    /// Base URL of the OpenAI-compatible chat completions API.
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// API key for the chat completions API.
    ///
    /// Set via SIFT_OPENAI_API_KEY environment variable.
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// Chat model used for answers and related questions.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_answer_max_tokens")]
    pub answer_max_tokens: u32,

    #[serde(default = "default_related_max_tokens")]
    pub related_max_tokens: u32,

    /// System role for the related-questions completion.
    #[serde(default = "default_related_system_role")]
    pub related_system_role: String,

    /// Task text appended to the related-questions prompt.
    #[serde(default = "default_related_task")]
    pub related_task: String,

    /// Credential expected in the Authorization header of `/search`.
    #[serde(default)]
    pub search_api_key: Option<String>,

    /// Credential expected in the Authorization header of `/sources`.
    #[serde(default)]
    pub sources_api_key: Option<String>,

    /// Credential expected in the Authorization header of `/related`.
    #[serde(default)]
    pub related_api_key: Option<String>,

    /// Origins allowed by the CORS layer.
    ///
    /// Set via SIFT_ALLOWED_ORIGINS environment variable (comma-separated).
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// User-Agent string for upstream requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upstream connect timeout in milliseconds.
    ///
    /// Only connection setup is bounded, for both the search and model APIs;
    /// responses take as long as the upstream needs.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./sift-cache.sqlite")
}

fn default_cache_ttl_secs() -> u64 {
    10_800 // 3h
}

fn default_purge_interval_secs() -> u64 {
    3_600
}

fn default_bing_endpoint() -> String {
    "https://api.bing.microsoft.com/v7.0/search".into()
}

fn default_search_count() -> u8 {
    10
}

fn default_search_market() -> String {
    "en-US".into()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-3.5-turbo".into()
}

fn default_answer_max_tokens() -> u32 {
    256
}

fn default_related_max_tokens() -> u32 {
    150
}

fn default_related_system_role() -> String {
    "You suggest follow-up questions for a search engine.".into()
}

fn default_related_task() -> String {
    "Write three short follow-up questions a user might search next, one per line, \
     in the language of the search query."
        .into()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3001".into()]
}

fn default_user_agent() -> String {
    "sift/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            db_path: default_db_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
            purge_interval_secs: default_purge_interval_secs(),
            bing_endpoint: default_bing_endpoint(),
            bing_api_key: None,
            search_count: default_search_count(),
            search_market: default_search_market(),
            openai_base_url: default_openai_base_url(),
            openai_api_key: None,
            model: default_model(),
            answer_max_tokens: default_answer_max_tokens(),
            related_max_tokens: default_related_max_tokens(),
            related_system_role: default_related_system_role(),
            related_task: default_related_task(),
            search_api_key: None,
            sources_api_key: None,
            related_api_key: None,
            allowed_origins: default_allowed_origins(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache TTL as Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SIFT_`
    /// 2. TOML file from `SIFT_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SIFT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SIFT_")
                .ignore(&["CONFIG_FILE", "ALLOWED_ORIGINS"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let mut config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        if let Ok(origins) = std::env::var("SIFT_ALLOWED_ORIGINS") {
            config.allowed_origins = split_list(&origins);
        }

        config.validate()?;

        Ok(config)
    }

    /// Check if the Bing subscription key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_bing_api_key(&self) -> Result<&str, ConfigError> {
        self.bing_api_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "bing_api_key".into(),
            hint: "Set SIFT_BING_API_KEY environment variable".into(),
        })
    }

    /// Check if the chat completions API key is available.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_openai_api_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "openai_api_key".into(),
            hint: "Set SIFT_OPENAI_API_KEY environment variable".into(),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
