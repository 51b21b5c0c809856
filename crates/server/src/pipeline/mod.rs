//! Cache-aside answer pipeline.
//!
//! On a miss the pipeline runs the search in a worker task, waits for the
//! complete snippet corpus, starts the streamed answer and hands the caller a
//! [`ChunkReader`] that yields tokens as they are generated. The completed
//! answer and the search results are written back to the cache by detached
//! tasks that never delay the response.
//!
//! ```text
//! cache check ── hit ──────────────────────────────▶ cached text
//!      │
//!     miss
//!      ▼
//! search worker ── results (cap 1) ──────────▶ results cache write
//!      │
//!      └── snippets (unbounded) ─▶ corpus ─▶ summarize
//!                                               │
//!                        tokens ─▶ ChunkReader ─┤
//!                                               └─▶ answer cache write
//! ```

pub mod reader;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use sift_client::openai::prompt::build_corpus;
use sift_client::{LlmError, SearchError, SearchProvider, SearchResult, Summarizer, TokenStream};
use sift_core::cache::DEFAULT_TTL;
use sift_core::{ArtifactCache, CacheKey, Error};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use reader::ChunkReader;
use reader::ChunkSender;

/// Body returned when the answer stream could not be started.
pub const SUMMARY_UNAVAILABLE: &str = "Error: the answer service is unavailable right now, please try again.\n";

type SearchOutcome = Result<Vec<SearchResult>, SearchError>;

/// Outcome of [`AnswerPipeline::answer`].
#[derive(Debug)]
pub enum Answer {
    /// Fresh cached answer; no upstream call was made.
    Cached(String),
    /// Answer being generated; read it from the stream.
    Streaming(AnswerStream),
    /// The model could not start an answer. Nothing was cached.
    Unavailable(&'static str),
}

/// A live answer plus the background cache writes it triggered.
#[derive(Debug)]
pub struct AnswerStream {
    pub reader: ChunkReader,
    pub writes: CacheWrites,
}

/// Handles of the detached cache-write tasks of one request.
///
/// Dropping this leaves the tasks running.
#[derive(Debug)]
pub struct CacheWrites {
    answer: JoinHandle<()>,
    results: JoinHandle<()>,
}

impl CacheWrites {
    /// Wait until both writes finished (or gave up).
    pub async fn settle(self) {
        if let Err(e) = self.answer.await {
            tracing::warn!(error = %e, "answer cache task failed");
        }
        if let Err(e) = self.results.await {
            tracing::warn!(error = %e, "results cache task failed");
        }
    }
}

/// Outcome of [`AnswerPipeline::sources`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sources {
    Found(Vec<SearchResult>),
    /// No results were cached for this query.
    Missing,
}

#[derive(Debug, thiserror::Error)]
pub enum RelatedError {
    #[error("related questions unavailable: {0}")]
    Upstream(#[from] LlmError),
}

/// Orchestrates cache, search and model for every request.
///
/// Built once at startup; cloning shares the underlying handles.
#[derive(Clone)]
pub struct AnswerPipeline {
    cache: Arc<dyn ArtifactCache>,
    search: Arc<dyn SearchProvider>,
    summarizer: Arc<dyn Summarizer>,
    ttl: Duration,
}

impl AnswerPipeline {
    pub fn new(cache: Arc<dyn ArtifactCache>, search: Arc<dyn SearchProvider>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { cache, search, summarizer, ttl: DEFAULT_TTL }
    }

    /// Override the TTL applied to every artifact.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Answer a query, from the cache when possible.
    pub async fn answer(&self, query: &str, language: &str) -> Answer {
        let key = CacheKey::new(query, language);

        if let Some(cached) = self.lookup(key.answer()).await {
            tracing::debug!(key = %key, "answer cache hit");
            return Answer::Cached(cached);
        }
        tracing::debug!(key = %key, "answer cache miss");

        let (results_tx, results_rx) = mpsc::channel(1);
        let (snippets_tx, mut snippets_rx) = mpsc::unbounded_channel();
        tokio::spawn(fetch_snippets(Arc::clone(&self.search), query.to_string(), results_tx, snippets_tx));

        let mut snippets = Vec::new();
        while let Some(snippet) = snippets_rx.recv().await {
            snippets.push(snippet);
        }
        let corpus = build_corpus(snippets.iter().map(String::as_str));

        let tokens = match self.summarizer.summarize(&corpus, query, language).await {
            Ok(tokens) => tokens,
            Err(e) => {
                degraded(e, "answer stream could not be started");
                return Answer::Unavailable(SUMMARY_UNAVAILABLE);
            }
        };

        let (chunks, reader) = reader::channel();
        let answer = tokio::spawn(stream_and_cache(
            Arc::clone(&self.cache),
            key.answer().to_string(),
            self.ttl,
            tokens,
            chunks,
        ));
        let results = tokio::spawn(cache_results(Arc::clone(&self.cache), key.results(), self.ttl, results_rx));

        Answer::Streaming(AnswerStream { reader, writes: CacheWrites { answer, results } })
    }

    /// Search results cached by an earlier answer for the same query.
    ///
    /// Storage failures and undecodable entries yield an empty list.
    pub async fn sources(&self, query: &str, language: &str) -> Sources {
        let key = CacheKey::new(query, language).results();

        match self.cache.get(&key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(results) => Sources::Found(results),
                Err(e) => {
                    let err = Error::from(e);
                    tracing::warn!(key = %key, code = err.code(), error = %err, "cached results are not valid JSON");
                    Sources::Found(Vec::new())
                }
            },
            Ok(None) => Sources::Missing,
            Err(e) => {
                tracing::warn!(key = %key, code = e.code(), error = %e, "cache read failed");
                Sources::Found(Vec::new())
            }
        }
    }

    /// Follow-up questions for a query, generated from its cached answer.
    pub async fn related_questions(&self, query: &str, language: &str) -> Result<String, RelatedError> {
        let key = CacheKey::new(query, language);
        let related_key = key.related_questions();

        if let Some(cached) = self.lookup(&related_key).await {
            tracing::debug!(key = %related_key, "related questions cache hit");
            return Ok(cached);
        }

        let summary = self.lookup(key.answer()).await.unwrap_or_default();
        let questions = self
            .summarizer
            .related_questions(&summary, query)
            .await
            .inspect_err(|e| {
                degraded(e.clone(), "related questions failed");
            })?;

        store(self.cache.as_ref(), &related_key, &questions, self.ttl).await;
        Ok(questions)
    }

    /// Cache read where a storage failure counts as a miss.
    async fn lookup(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, code = e.code(), error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }
}

/// Search worker: publishes the whole result list, then each snippet.
async fn fetch_snippets(
    search: Arc<dyn SearchProvider>, query: String, results_tx: mpsc::Sender<SearchOutcome>,
    snippets_tx: mpsc::UnboundedSender<String>,
) {
    let outcome = search.search(&query).await;

    let snippets: Vec<String> = match &outcome {
        Ok(results) => {
            tracing::debug!(count = results.len(), "search returned results");
            results.iter().map(|r| r.snippet.clone()).collect()
        }
        Err(e) => {
            degraded(e.clone(), "search failed, continuing with an empty corpus");
            Vec::new()
        }
    };

    if results_tx.send(outcome).await.is_err() {
        tracing::debug!("results receiver dropped");
    }

    for snippet in snippets {
        if snippets_tx.send(snippet).is_err() {
            break;
        }
    }
}

/// Generation worker: forwards tokens to the reader and caches the full text.
///
/// Keeps consuming after the client went away so the answer still lands in
/// the cache. A mid-stream error is sent as the last chunk and nothing is cached.
async fn stream_and_cache(
    cache: Arc<dyn ArtifactCache>, key: String, ttl: Duration, mut tokens: TokenStream, chunks: ChunkSender,
) {
    let mut buffer = String::new();
    let mut client_gone = false;
    let mut failed = false;

    while let Some(item) = tokens.next().await {
        let chunk = match item {
            Ok(token) => {
                buffer.push_str(&token);
                token
            }
            Err(e) => {
                let text = e.to_string();
                degraded(e, "answer stream failed mid-way");
                failed = true;
                text
            }
        };

        if !client_gone && chunks.send(Bytes::from(chunk)).is_err() {
            tracing::warn!(key = %key, "client disconnected, generation continues");
            client_gone = true;
        }

        if failed {
            break;
        }
    }
    drop(chunks);

    if failed {
        tracing::debug!(key = %key, "partial answer not cached");
        return;
    }

    tracing::info!(key = %key, bytes = buffer.len(), "answer stream completed");
    store(cache.as_ref(), &key, &buffer, ttl).await;
}

/// Wait for the search outcome and cache it when the search succeeded.
async fn cache_results(
    cache: Arc<dyn ArtifactCache>, key: String, ttl: Duration, mut results_rx: mpsc::Receiver<SearchOutcome>,
) {
    match results_rx.recv().await {
        Some(Ok(results)) => match serde_json::to_string(&results) {
            Ok(json) => store(cache.as_ref(), &key, &json, ttl).await,
            Err(e) => tracing::warn!(key = %key, error = %e, "search results could not be encoded"),
        },
        Some(Err(_)) => {}
        None => tracing::warn!(key = %key, "search worker ended without an outcome"),
    }
}

/// Log an upstream failure the pipeline recovers from, under its error code.
fn degraded(err: impl Into<Error>, message: &'static str) -> Error {
    let err = err.into();
    tracing::warn!(code = err.code(), error = %err, "{}", message);
    err
}

/// Best-effort cache write; failures are logged and dropped.
async fn store(cache: &dyn ArtifactCache, key: &str, value: &str, ttl: Duration) {
    match cache.set(key, value, ttl).await {
        Ok(()) => tracing::debug!(key, "cached artifact"),
        Err(e) => tracing::warn!(key, code = e.code(), error = %e, "cache write failed"),
    }
}
