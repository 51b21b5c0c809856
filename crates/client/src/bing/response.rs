//! Bing Web Search response types and normalization.

use serde::{Deserialize, Serialize};

/// Raw response from the Bing Web Search API.
///
/// Only the `webPages` section is used; everything else is ignored.
#[derive(Debug, Deserialize)]
pub struct BingApiResponse {
    #[serde(default, rename = "webPages")]
    pub web_pages: Option<WebPages>,
}

/// Web page results container.
#[derive(Debug, Deserialize)]
pub struct WebPages {
    #[serde(default)]
    pub value: Vec<WebPage>,
}

/// Individual web page result from Bing.
#[derive(Debug, Deserialize)]
pub struct WebPage {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

/// Normalized search result.
///
/// Serialized with the field names clients of the sources endpoint and the
/// cache already depend on: `name`, `url`, `snippet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "name")]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

impl From<BingApiResponse> for Vec<SearchResult> {
    /// Flatten the nested Bing payload, keeping the provider's ranking order.
    fn from(raw: BingApiResponse) -> Self {
        raw.web_pages
            .map(|pages| {
                pages
                    .value
                    .into_iter()
                    .map(|page| SearchResult { title: page.name, url: page.url, snippet: page.snippet })
                    .collect()
            })
            .unwrap_or_default()
    }
}
