//! Web search abstraction.

use greenguide_core::AppResult;
use serde::{Deserialize, Serialize};

/// A single web search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,

    /// Extracted page content relevant to the query
    pub content: String,

    /// Provider relevance score, higher is better
    #[serde(default)]
    pub score: Option<f32>,
}

/// Trait for web search providers.
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    /// Get the provider name (e.g., "tavily").
    fn provider_name(&self) -> &str;

    /// Run `query` and return at most `max_results` hits, best first.
    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<SearchHit>>;
}

/// Render hits as a numbered block for a synthesis prompt.
pub fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("[{}] {} ({})\n{}", i + 1, hit.title, hit.url, hit.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
