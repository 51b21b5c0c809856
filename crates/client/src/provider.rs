//! Collaborator contracts used by the answer pipeline.
//!
//! The pipeline only sees these traits; [`BingClient`](crate::BingClient) and
//! [`OpenAiClient`](crate::OpenAiClient) are the production implementations.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::bing::{SearchError, SearchResult};
use crate::openai::LlmError;

/// Coarse failure class of an upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection, TLS or timeout failure.
    Network,
    /// The upstream answered, but not with a usable success response.
    Upstream,
    /// The upstream payload could not be decoded.
    Decode,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Decode => "decode",
        }
    }
}

/// Live stream of generated answer text, in generation order.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Web search: one query in, the provider's ranked result list out.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError>;
}

/// Language model used to write answers and follow-up questions.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Start a streamed answer over the snippet corpus.
    ///
    /// An `Err` means the stream never started; errors after that arrive as
    /// items of the returned stream.
    async fn summarize(&self, corpus: &str, query: &str, language: &str) -> Result<TokenStream, LlmError>;

    /// Non-streaming completion producing related questions for an answer.
    async fn related_questions(&self, summary: &str, query: &str) -> Result<String, LlmError>;
}
