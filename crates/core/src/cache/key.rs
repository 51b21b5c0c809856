//! Cache key derivation.
//!
//! Every artifact produced for a query lives under the same base key,
//! `"<language> : <normalized query>"`, with a per-artifact suffix so the
//! answer, the search results and the related questions expire independently.

/// Characters stripped from both ends of a query before it becomes a key.
pub const TRIM_PUNCTUATION: &[char] = &['!', '?', ',', '.', ';', ':', '-', '\'', '"', ' '];

const RESULTS_SUFFIX: &str = " : results";
const RELATED_QUESTIONS_SUFFIX: &str = " : relatedQuestions";

/// Normalize the query part of a cache key.
///
/// Punctuation from [`TRIM_PUNCTUATION`] and whitespace are stripped from both
/// ends in a single pass, then the result is lower-cased. Interior punctuation
/// is preserved.
pub fn normalize_query(query: &str) -> String {
    query
        .trim_matches(|c: char| TRIM_PUNCTUATION.contains(&c) || c.is_whitespace())
        .to_lowercase()
}

/// Compute the base cache key for a query in a given language.
pub fn cache_key(query: &str, language: &str) -> String {
    format!("{} : {}", language, normalize_query(query))
}

/// Base key plus the derived per-artifact keys for one (query, language) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    base: String,
}

impl CacheKey {
    pub fn new(query: &str, language: &str) -> Self {
        Self { base: cache_key(query, language) }
    }

    /// Key of the generated answer text.
    pub fn answer(&self) -> &str {
        &self.base
    }

    /// Key of the JSON-encoded search result list.
    pub fn results(&self) -> String {
        format!("{}{}", self.base, RESULTS_SUFFIX)
    }

    /// Key of the related-questions text.
    pub fn related_questions(&self) -> String {
        format!("{}{}", self.base, RELATED_QUESTIONS_SUFFIX)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base)
    }
}
