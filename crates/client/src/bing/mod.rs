//! Bing Web Search API client.
//!
//! ### Specification
//!
//! - **Endpoint**: `https://api.bing.microsoft.com/v7.0/search` (configurable)
//! - **Authentication**: `Ocp-Apim-Subscription-Key` header.
//! - **Compression**: gzip bodies are requested and decoded transparently.
//! - **Normalization**: `webPages.value[]` is flattened into [`SearchResult`]s in ranking order.
//! - **Retries**: none. A failed call is reported once and the caller decides.

pub mod error;
pub mod request;
pub mod response;

pub use error::SearchError;
pub use request::SearchRequest;
pub use response::{BingApiResponse, SearchResult};

use async_trait::async_trait;
use reqwest::header;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::provider::SearchProvider;

/// Default Bing Web Search endpoint.
const DEFAULT_ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/search";

/// Default connect timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "sift/0.1";

/// Bing API client configuration.
#[derive(Debug, Clone)]
pub struct BingConfig {
    /// Subscription key.
    pub api_key: String,
    /// Search endpoint URL.
    pub endpoint: String,
    /// Results requested per query (default 10).
    pub count: u8,
    /// Market code (default en-US).
    pub market: String,
    /// Connection setup timeout (default: 10s). Responses are not time-bounded.
    pub connect_timeout: Duration,
    /// User-agent string.
    pub user_agent: String,
}

impl Default for BingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            count: 10,
            market: "en-US".to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl BingConfig {
    /// Build the client configuration from the application config.
    pub fn from_app_config(config: &sift_core::AppConfig) -> Result<Self, SearchError> {
        let api_key = config.require_bing_api_key().map_err(|_| SearchError::MissingApiKey)?;

        Ok(Self {
            api_key: api_key.to_string(),
            endpoint: config.bing_endpoint.clone(),
            count: config.search_count,
            market: config.search_market.clone(),
            connect_timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        })
    }
}

/// Bing Web Search API client.
///
/// Holds a pooled `reqwest::Client`; build it once and share it.
#[derive(Debug, Clone)]
pub struct BingClient {
    http: reqwest::Client,
    endpoint: Url,
    config: Arc<BingConfig>,
}

impl BingClient {
    /// Create a new Bing client with the given configuration.
    pub fn new(config: BingConfig) -> Result<Self, SearchError> {
        if config.api_key.is_empty() {
            return Err(SearchError::MissingApiKey);
        }

        let endpoint = Url::parse(&config.endpoint).map_err(|e| SearchError::InvalidEndpoint(e.to_string()))?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| SearchError::Network(Arc::new(e)))?;

        Ok(Self { http, endpoint, config: Arc::new(config) })
    }

    /// Build a request for `query` with this client's count and market.
    pub fn request_for(&self, query: &str) -> SearchRequest {
        SearchRequest {
            q: query.to_string(),
            count: self.config.count,
            offset: 0,
            mkt: self.config.market.clone(),
        }
    }

    /// Execute a web search query.
    pub async fn search_with(&self, req: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        req.validate()?;

        let start = Instant::now();
        tracing::debug!(query = %req.q, count = req.count, market = %req.mkt, "searching Bing API");

        let http_response = self
            .http
            .get(self.endpoint.clone())
            .header("Ocp-Apim-Subscription-Key", &self.config.api_key)
            .header(header::ACCEPT, "application/json")
            .query(req)
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!("Bing API response status: {}", status);

        if status == 401 || status == 403 {
            return Err(SearchError::AuthError);
        }

        if status == 429 {
            return Err(SearchError::RateLimited);
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(SearchError::HttpError { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await?;
        let api_response: BingApiResponse =
            serde_json::from_slice(&bytes).map_err(|e| SearchError::Parse(e.to_string()))?;

        let results: Vec<SearchResult> = api_response.into();
        tracing::debug!("search completed in {:?}, {} results", start.elapsed(), results.len());

        Ok(results)
    }
}

#[async_trait]
impl SearchProvider for BingClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        self.search_with(&self.request_for(query)).await
    }
}
