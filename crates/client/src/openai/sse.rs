//! Server-Sent Events decoding for streamed completions.
//!
//! The network delivers arbitrary byte chunks; events are only parsed once a
//! full line is buffered, so a `data:` line split across chunks (or a UTF-8
//! sequence split inside it) is decoded correctly.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt, stream};

use super::error::LlmError;
use super::request::ChatChunk;

/// One decoded SSE line of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Payload of a `data:` line.
    Data(String),
    /// The `data: [DONE]` terminator.
    Done,
}

/// Incremental line decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the events of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(event) = parse_line(&line[..line.len() - 1]) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buf);
        parse_line(&rest)
    }
}

fn parse_line(raw: &[u8]) -> Option<SseEvent> {
    let line = String::from_utf8_lossy(raw);
    let line = line.strip_suffix('\r').unwrap_or(&line);

    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);

    if data == "[DONE]" { Some(SseEvent::Done) } else { Some(SseEvent::Data(data.to_string())) }
}

/// Decode one `data:` payload into the text it carries.
///
/// Returns `Ok(None)` for chunks without content (role announcements,
/// finish markers).
pub fn parse_chunk(data: &str) -> Result<Option<String>, LlmError> {
    let chunk: ChatChunk = serde_json::from_str(data).map_err(|e| LlmError::Parse(e.to_string()))?;

    if let Some(error) = chunk.error {
        return Err(LlmError::Api(error.message));
    }

    Ok(chunk.into_content().filter(|content| !content.is_empty()))
}

struct TokenState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, LlmError>>,
    done: bool,
}

impl<S> TokenState<S> {
    /// Queue the tokens of decoded events. Stops at `[DONE]` or the first error.
    fn absorb(&mut self, events: impl IntoIterator<Item = SseEvent>) {
        for event in events {
            match event {
                SseEvent::Done => {
                    self.done = true;
                    return;
                }
                SseEvent::Data(data) => match parse_chunk(&data) {
                    Ok(Some(token)) => self.pending.push_back(Ok(token)),
                    Ok(None) => {}
                    Err(e) => {
                        self.pending.push_back(Err(e));
                        self.done = true;
                        return;
                    }
                },
            }
        }
    }
}

/// Turn a streamed response body into a stream of text tokens.
///
/// The stream ends after `[DONE]` or right after the first error item. A body
/// that ends before `[DONE]` yields [`LlmError::Truncated`] as its last item.
pub fn token_stream<S, E>(bytes: S) -> impl Stream<Item = Result<String, LlmError>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<LlmError> + Send + 'static,
{
    let bytes: Pin<Box<dyn Stream<Item = Result<Bytes, E>> + Send>> = Box::pin(bytes);
    let state = TokenState { bytes, decoder: SseDecoder::new(), pending: VecDeque::new(), done: false };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(&chunk);
                    state.absorb(events);
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(e.into()));
                    state.done = true;
                }
                None => {
                    let tail = state.decoder.finish();
                    state.absorb(tail);
                    if !state.done {
                        state.pending.push_back(Err(LlmError::Truncated));
                        state.done = true;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_line(content: &str) -> String {
        format!("data: {{\"choices\":[{{\"index\":0,\"delta\":{{\"content\":{}}}}}]}}\n\n", serde_json::json!(content))
    }

    #[test]
    fn test_decoder_complete_lines() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: {\"a\":1}\n\ndata: [DONE]\n\n");
        assert_eq!(events, vec![SseEvent::Data("{\"a\":1}".into()), SseEvent::Done]);
    }

    #[test]
    fn test_decoder_split_lines() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert!(decoder.push(b":1}").is_empty());
        assert_eq!(decoder.push(b"\r\n"), vec![SseEvent::Data("{\"a\":1}".into())]);
    }

    #[test]
    fn test_decoder_split_utf8() {
        let line = "data: héllo\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&line[..split]).is_empty());
        assert_eq!(decoder.push(&line[split..]), vec![SseEvent::Data("héllo".into())]);
    }

    #[test]
    fn test_decoder_ignores_comments_and_fields() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": keep-alive\nevent: message\nid: 4\ndata:{}\n");
        assert_eq!(events, vec![SseEvent::Data("{}".into())]);
    }

    #[test]
    fn test_decoder_finish_flushes_tail() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: [DONE]").is_empty());
        assert_eq!(decoder.finish(), Some(SseEvent::Done));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_parse_chunk() {
        assert_eq!(parse_chunk(r#"{"choices":[{"delta":{"content":"x"}}]}"#).unwrap().as_deref(), Some("x"));
        assert_eq!(parse_chunk(r#"{"choices":[{"delta":{"content":""}}]}"#).unwrap(), None);
        assert!(matches!(parse_chunk("nope"), Err(LlmError::Parse(_))));
        assert!(matches!(parse_chunk(r#"{"error":{"message":"overloaded"}}"#), Err(LlmError::Api(m)) if m == "overloaded"));
    }

    async fn collect(chunks: Vec<String>) -> Vec<Result<String, LlmError>> {
        let body = stream::iter(chunks.into_iter().map(|c| Ok::<_, reqwest::Error>(Bytes::from(c))));
        token_stream(body).collect().await
    }

    #[tokio::test]
    async fn test_token_stream_in_order() {
        let body = format!("{}{}{}data: [DONE]\n\n", data_line("It "), data_line("is "), data_line("sunny."));
        let tokens: Vec<String> = collect(vec![body]).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(tokens, vec!["It ", "is ", "sunny."]);
    }

    #[tokio::test]
    async fn test_token_stream_arbitrary_chunking() {
        let body = format!("{}{}data: [DONE]\n\n", data_line("Hello, "), data_line("wörld"));
        let chunks: Vec<String> = body.chars().map(|c| c.to_string()).collect();
        let tokens: Vec<String> = collect(chunks).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(tokens.concat(), "Hello, wörld");
    }

    #[tokio::test]
    async fn test_token_stream_stops_at_done() {
        let body = format!("{}data: [DONE]\n\n{}", data_line("a"), data_line("ignored"));
        let tokens: Vec<String> = collect(vec![body]).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(tokens, vec!["a"]);
    }

    #[tokio::test]
    async fn test_token_stream_ends_after_error() {
        let body = format!("{}data: {{not json}}\n\n{}", data_line("partial"), data_line("never"));
        let items = collect(vec![body]).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_deref().unwrap(), "partial");
        assert!(matches!(items[1], Err(LlmError::Parse(_))));
    }

    #[tokio::test]
    async fn test_token_stream_without_done_marker_is_truncated() {
        let body = data_line("tail").trim_end().to_string();
        let items = collect(vec![body]).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_deref().unwrap(), "tail");
        assert!(matches!(items[1], Err(LlmError::Truncated)));
    }

    #[tokio::test]
    async fn test_token_stream_unterminated_done_line() {
        let body = format!("{}data: [DONE]", data_line("last"));
        let tokens: Vec<String> = collect(vec![body]).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(tokens, vec!["last"]);
    }

    #[tokio::test]
    async fn test_token_stream_empty_body_is_truncated() {
        let items = collect(Vec::new()).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(LlmError::Truncated)));
    }
}
