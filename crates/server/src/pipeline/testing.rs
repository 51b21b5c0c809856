//! In-process collaborators for pipeline and route tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{StreamExt, stream};
use sift_client::openai::sse::token_stream;
use sift_client::{LlmError, SearchError, SearchProvider, SearchResult, Summarizer, TokenStream};
use sift_core::{ArtifactCache, Error};
use tokio::sync::oneshot;

/// Search provider returning a fixed outcome and counting calls.
pub struct FakeSearch {
    outcome: Result<Vec<SearchResult>, SearchError>,
    pub calls: AtomicUsize,
}

impl FakeSearch {
    pub fn ok(results: Vec<SearchResult>) -> Self {
        Self { outcome: Ok(results), calls: AtomicUsize::new(0) }
    }

    pub fn failing() -> Self {
        Self { outcome: Err(SearchError::HttpError { status: 503 }), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

enum Script {
    Tokens(Vec<String>),
    FailStart,
    FailAfter(Vec<String>),
    Gated(Vec<String>),
    Sse(String),
}

/// Summarizer replaying scripted tokens and recording its inputs.
pub struct FakeSummarizer {
    script: Script,
    related: Option<String>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    corpus: Mutex<Option<String>>,
    summary: Mutex<Option<String>>,
    pub calls: AtomicUsize,
    pub related_calls: AtomicUsize,
}

fn owned(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

impl FakeSummarizer {
    fn with(script: Script) -> Self {
        Self {
            script,
            related: None,
            gate: Mutex::new(None),
            corpus: Mutex::new(None),
            summary: Mutex::new(None),
            calls: AtomicUsize::new(0),
            related_calls: AtomicUsize::new(0),
        }
    }

    pub fn tokens(tokens: &[&str]) -> Self {
        Self::with(Script::Tokens(owned(tokens)))
    }

    /// Fails before producing a stream, in both completion modes.
    pub fn failing_start() -> Self {
        Self::with(Script::FailStart)
    }

    /// Streams the tokens, then an API error.
    pub fn failing_after(tokens: &[&str]) -> Self {
        Self::with(Script::FailAfter(owned(tokens)))
    }

    /// Streams the first token, then waits for the returned sender before the rest.
    pub fn gated(tokens: &[&str]) -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        let fake = Self::with(Script::Gated(owned(tokens)));
        *fake.gate.lock().unwrap() = Some(rx);
        (tx, fake)
    }

    /// Decodes `body` as a streamed completion response.
    pub fn sse(body: &str) -> Self {
        Self::with(Script::Sse(body.to_string()))
    }

    /// Answers related-question requests with `text`.
    pub fn related(text: &str) -> Self {
        Self { related: Some(text.to_string()), ..Self::with(Script::Tokens(Vec::new())) }
    }

    pub fn last_corpus(&self) -> Option<String> {
        self.corpus.lock().unwrap().clone()
    }

    pub fn last_summary(&self) -> Option<String> {
        self.summary.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, corpus: &str, _query: &str, _language: &str) -> Result<TokenStream, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.corpus.lock().unwrap() = Some(corpus.to_string());

        match &self.script {
            Script::Tokens(tokens) => Ok(Box::pin(stream::iter(tokens.clone().into_iter().map(Ok::<_, LlmError>)))),
            Script::FailStart => Err(LlmError::HttpError { status: 503, body: "unavailable".into() }),
            Script::FailAfter(tokens) => Ok(Box::pin(stream::iter(
                tokens.clone().into_iter().map(Ok).chain(std::iter::once(Err(LlmError::Api("overloaded".into())))),
            ))),
            Script::Gated(tokens) => {
                let gate = self.gate.lock().unwrap().take();
                let mut tokens = tokens.clone().into_iter();
                let first = tokens.next();
                let rest: Vec<String> = tokens.collect();

                let head = stream::iter(first.map(Ok::<_, LlmError>));
                let tail = stream::once(async move {
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                    stream::iter(rest.into_iter().map(Ok::<_, LlmError>))
                })
                .flatten();
                Ok(Box::pin(head.chain(tail)))
            }
            Script::Sse(body) => {
                let bytes = stream::iter([Ok::<_, LlmError>(Bytes::from(body.clone()))]);
                Ok(Box::pin(token_stream(bytes)))
            }
        }
    }

    async fn related_questions(&self, summary: &str, _query: &str) -> Result<String, LlmError> {
        self.related_calls.fetch_add(1, Ordering::SeqCst);
        *self.summary.lock().unwrap() = Some(summary.to_string());

        match (&self.script, &self.related) {
            (Script::FailStart, _) => Err(LlmError::RateLimited),
            (_, Some(text)) => Ok(text.clone()),
            _ => Err(LlmError::EmptyResponse),
        }
    }
}

/// Cache whose storage is always unreachable.
pub struct FailingCache;

#[async_trait]
impl ArtifactCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, Error> {
        Err(Error::CacheUnavailable(tokio_rusqlite::Error::ConnectionClosed))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), Error> {
        Err(Error::CacheUnavailable(tokio_rusqlite::Error::ConnectionClosed))
    }
}
