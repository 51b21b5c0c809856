//! OpenAI-compatible chat completions client.
//!
//! ### Specification
//!
//! - **Endpoint**: `POST {base_url}/chat/completions`
//! - **Authentication**: `Authorization: Bearer {api_key}`.
//! - **Streaming**: `stream: true` responses are read as Server-Sent Events;
//!   `choices[0].delta.content` carries each token and `data: [DONE]` ends the stream.
//! - **Non-streaming**: `choices[0].message.content` is returned as-is.
//! - **Timeouts**: only connection setup is bounded; a generation may take as long as the model needs.

pub mod error;
pub mod prompt;
pub mod request;
pub mod sse;

pub use error::LlmError;
pub use request::{ChatMessage, ChatRequest, ChatResponse, Role};

use async_trait::async_trait;
use reqwest::header;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::provider::{Summarizer, TokenStream};

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default connect timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sampling temperature for related questions.
const RELATED_TEMPERATURE: f32 = 0.3;

/// Chat completions client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub answer_max_tokens: u32,
    pub related_max_tokens: u32,
    pub related_system_role: String,
    pub related_task: String,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gpt-3.5-turbo".to_string(),
            answer_max_tokens: 256,
            related_max_tokens: 150,
            related_system_role: String::new(),
            related_task: String::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: "sift/0.1".to_string(),
        }
    }
}

impl OpenAiConfig {
    /// Build the client configuration from the application config.
    pub fn from_app_config(config: &sift_core::AppConfig) -> Result<Self, LlmError> {
        let api_key = config.require_openai_api_key().map_err(|_| LlmError::MissingApiKey)?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: config.openai_base_url.clone(),
            model: config.model.clone(),
            answer_max_tokens: config.answer_max_tokens,
            related_max_tokens: config.related_max_tokens,
            related_system_role: config.related_system_role.clone(),
            related_task: config.related_task.clone(),
            connect_timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        })
    }
}

/// Chat completions client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    completions_url: Url,
    config: Arc<OpenAiConfig>,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let completions_url = Url::parse(&format!("{}/chat/completions", config.base_url.trim_end_matches('/')))
            .map_err(|e| LlmError::InvalidBaseUrl(e.to_string()))?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| LlmError::Network(Arc::new(e)))?;

        Ok(Self { http, completions_url, config: Arc::new(config) })
    }

    /// Send a request and return the response once its status is known to be a success.
    async fn send(&self, req: &ChatRequest) -> Result<reqwest::Response, LlmError> {
        tracing::debug!(model = %req.model, stream = req.stream, "sending chat completion request");

        let response = self
            .http
            .post(self.completions_url.clone())
            .bearer_auth(&self.config.api_key)
            .header(header::ACCEPT, if req.stream { "text/event-stream" } else { "application/json" })
            .json(req)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("chat completions response status: {}", status);

        if status == 401 || status == 403 {
            return Err(LlmError::AuthError);
        }

        if status == 429 {
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::HttpError { status: status.as_u16(), body });
        }

        Ok(response)
    }

    /// Start a streamed completion.
    ///
    /// Returns once the response headers arrived with a success status; tokens
    /// are read from the body lazily as the returned stream is polled.
    pub async fn chat_stream(&self, req: ChatRequest) -> Result<TokenStream, LlmError> {
        let response = self.send(&req.streaming()).await?;
        Ok(Box::pin(sse::token_stream(response.bytes_stream())))
    }

    /// Run a non-streaming completion and return the first choice's text.
    pub async fn chat(&self, req: ChatRequest) -> Result<String, LlmError> {
        let response = self.send(&req).await?;
        let bytes = response.bytes().await?;
        let parsed: ChatResponse = serde_json::from_slice(&bytes).map_err(|e| LlmError::Parse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl Summarizer for OpenAiClient {
    async fn summarize(&self, corpus: &str, query: &str, language: &str) -> Result<TokenStream, LlmError> {
        let req = ChatRequest::new(
            &self.config.model,
            prompt::ANSWER_SYSTEM_ROLE,
            prompt::answer_prompt(corpus, query, language),
        )
        .max_tokens(self.config.answer_max_tokens);

        self.chat_stream(req).await
    }

    async fn related_questions(&self, summary: &str, query: &str) -> Result<String, LlmError> {
        let req = ChatRequest::new(
            &self.config.model,
            &self.config.related_system_role,
            prompt::related_prompt(query, summary, &self.config.related_task),
        )
        .temperature(RELATED_TEMPERATURE)
        .max_tokens(self.config.related_max_tokens);

        self.chat(req).await
    }
}
