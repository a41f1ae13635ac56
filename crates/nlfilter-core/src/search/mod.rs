//! Vector search over the article index
//!
//! Embeds the query, runs the native part of the filter in the index, then
//! applies tag constraints as a post-filter. Search failures are reported in
//! the response and never invalidate the filter that was generated.

mod embedder;
mod pinecone;
mod tag_match;

pub use embedder::{
    normalize_dimensions, Embedder, FallbackEmbedder, HashEmbedder, HttpEmbedder,
    LabeledEmbedding,
};
pub use pinecone::{PineconeIndex, VectorIndex};
pub use tag_match::{matches_all, split_tag_constraints, stored_tags, tag_matches};

use crate::config::{Config, IndexConfig};
use crate::error::Result;
use crate::filter::Filter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// One ranked result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SearchMatch {
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// Where the time went
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchTimings {
    pub embedding_ms: u64,
    pub query_ms: u64,
    pub total_ms: u64,
}

/// Search results, or the reason there are none
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub matches: Vec<SearchMatch>,
    pub total_count: usize,

    /// The filter as requested, including tag constraints
    pub filter_applied: Filter,

    /// The part of the filter the index evaluated
    pub native_filter: Filter,

    pub embedding_model: Option<String>,
    pub timings: SearchTimings,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Index statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    #[serde(default)]
    pub total_vector_count: u64,
    #[serde(default)]
    pub dimension: usize,
    #[serde(default)]
    pub index_fullness: f64,
}

/// Embedding plus index plus tag post-filter
pub struct SearchClient {
    embedder: FallbackEmbedder,
    index: Arc<dyn VectorIndex>,
    config: IndexConfig,
}

impl SearchClient {
    /// Create from explicit parts
    pub fn new(embedder: FallbackEmbedder, index: Arc<dyn VectorIndex>, config: &IndexConfig) -> Self {
        Self {
            embedder,
            index,
            config: config.clone(),
        }
    }

    /// Create from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = FallbackEmbedder::from_config(&config.embedding)?;
        let index = Arc::new(PineconeIndex::new(config.index.clone())?);
        Ok(Self::new(embedder, index, &config.index))
    }

    /// Result count after defaulting and clamping to `[1, max_top_k]`
    pub fn effective_top_k(&self, requested: Option<usize>) -> usize {
        self.config
            .clamp_top_k(requested.unwrap_or(self.config.default_top_k))
    }

    /// Run `query` against the index under `filter`
    pub async fn search(&self, query: &str, filter: &Filter, top_k: Option<usize>) -> SearchResponse {
        let start = Instant::now();
        let top_k = self.effective_top_k(top_k);
        let (native_filter, tag_constraints) = split_tag_constraints(filter);

        tracing::debug!(
            "Searching {} (top_k={}, native filter={}, {} tag constraints)",
            self.index.name(),
            top_k,
            native_filter,
            tag_constraints.len()
        );

        let embedding = self.embedder.embed_labeled(query).await;
        let embedding_ms = start.elapsed().as_millis() as u64;

        let query_start = Instant::now();
        let native = (!native_filter.is_empty()).then_some(&native_filter);
        let result = self.index.query(&embedding.vector, native, top_k).await;
        let query_ms = query_start.elapsed().as_millis() as u64;

        let (matches, error) = match result {
            Ok(matches) => {
                let raw_count = matches.len();
                let matches: Vec<SearchMatch> = matches
                    .into_iter()
                    .filter(|m| matches_all(&tag_constraints, &m.metadata))
                    .collect();
                if !tag_constraints.is_empty() {
                    tracing::debug!("Tag post-filter: {} -> {} matches", raw_count, matches.len());
                }
                (matches, None)
            }
            Err(e) => {
                tracing::warn!("Search failed: {}", e);
                (Vec::new(), Some(e.to_string()))
            }
        };

        let timings = SearchTimings {
            embedding_ms,
            query_ms,
            total_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            "Search returned {} matches in {}ms (embedding {}ms, query {}ms)",
            matches.len(),
            timings.total_ms,
            timings.embedding_ms,
            timings.query_ms
        );

        SearchResponse {
            total_count: matches.len(),
            matches,
            filter_applied: filter.clone(),
            native_filter,
            embedding_model: Some(embedding.model),
            timings,
            error,
        }
    }

    /// Index statistics
    pub async fn stats(&self) -> Result<IndexStats> {
        self.index.stats().await
    }
}
