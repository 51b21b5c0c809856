//! Upstream clients for sift.
//!
//! This crate provides the web search and language model collaborators the
//! answer pipeline depends on, behind the [`SearchProvider`] and
//! [`Summarizer`] traits.

pub mod bing;
pub mod openai;
pub mod provider;

pub use bing::{BingClient, BingConfig, SearchError, SearchRequest, SearchResult};
pub use openai::{LlmError, OpenAiClient, OpenAiConfig};
pub use provider::{ErrorKind, SearchProvider, Summarizer, TokenStream};
