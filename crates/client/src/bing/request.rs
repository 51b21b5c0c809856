//! Bing Web Search request types and validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::bing::SearchError;

/// Market codes look like `en-US`.
static MARKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}-[A-Z]{2}$").expect("market regex is valid"));

/// Search request parameters for the Bing Web Search API.
///
/// Serialized as the query string of the GET request.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    /// Search query (required, max 400 chars).
    pub q: String,

    /// Number of results (1-50, default 10).
    pub count: u8,

    /// Number of results to skip (default 0).
    pub offset: u32,

    /// Market the results come from (default "en-US").
    pub mkt: String,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self { q: String::new(), count: 10, offset: 0, mkt: "en-US".to_string() }
    }
}

impl SearchRequest {
    pub fn new(q: impl Into<String>) -> Self {
        Self { q: q.into(), ..Default::default() }
    }

    /// Validate the search request parameters.
    ///
    /// Returns an error if any parameters are out of range or malformed.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.q.trim().is_empty() {
            return Err(SearchError::InvalidQuery("query cannot be empty".to_string()));
        }

        let chars = self.q.chars().count();
        if chars > 400 {
            return Err(SearchError::InvalidQuery(format!("query too long: {} chars (max 400)", chars)));
        }

        if !(1..=50).contains(&self.count) {
            return Err(SearchError::InvalidCount);
        }

        if !MARKET_RE.is_match(&self.mkt) {
            return Err(SearchError::InvalidMarket(self.mkt.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        let req = SearchRequest::new("weather today");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let req = SearchRequest::new("q");
        assert_eq!(req.count, 10);
        assert_eq!(req.offset, 0);
        assert_eq!(req.mkt, "en-US");
    }

    #[test]
    fn test_empty_query() {
        assert!(matches!(SearchRequest::new("").validate(), Err(SearchError::InvalidQuery(_))));
        assert!(matches!(SearchRequest::new("   ").validate(), Err(SearchError::InvalidQuery(_))));
    }

    #[test]
    fn test_query_too_long_chars() {
        let req = SearchRequest::new("a".repeat(401));
        assert!(matches!(req.validate(), Err(SearchError::InvalidQuery(_))));
    }

    #[test]
    fn test_invalid_count() {
        let req = SearchRequest { count: 0, ..SearchRequest::new("test") };
        assert!(matches!(req.validate(), Err(SearchError::InvalidCount)));

        let req = SearchRequest { count: 51, ..SearchRequest::new("test") };
        assert!(matches!(req.validate(), Err(SearchError::InvalidCount)));
    }

    #[test]
    fn test_invalid_market() {
        for mkt in ["en", "EN-us", "en_US", ""] {
            let req = SearchRequest { mkt: mkt.to_string(), ..SearchRequest::new("test") };
            assert!(matches!(req.validate(), Err(SearchError::InvalidMarket(_))), "market {:?} should be invalid", mkt);
        }
    }

    #[test]
    fn test_query_string_encoding() {
        let req = SearchRequest::new("rust & tokio");
        let encoded = serde_json::to_value(&req).unwrap();
        assert_eq!(encoded["q"], "rust & tokio");
        assert_eq!(encoded["count"], 10);
        assert_eq!(encoded["mkt"], "en-US");
    }
}
