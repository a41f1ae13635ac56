//! Query embedding with a fallback chain
//!
//! hosted API -> local OpenAI-compatible server -> deterministic hash
//! embedding. Every vector is normalized to the index dimension.

use crate::config::{EmbeddingConfig, EmbeddingEndpoint};
use crate::error::{NlFilterError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Truncate or zero-pad to `target` dimensions
pub fn normalize_dimensions(mut embedding: Vec<f32>, target: usize) -> Vec<f32> {
    embedding.resize(target, 0.0);
    embedding
}

/// Embedder backed by an OpenAI-compatible `/v1/embeddings` endpoint
pub struct HttpEmbedder {
    http_client: reqwest::Client,
    endpoint: EmbeddingEndpoint,
    dimensions: usize,
}

impl HttpEmbedder {
    pub fn new(endpoint: EmbeddingEndpoint, dimensions: usize, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NlFilterError::Http)?;

        Ok(Self {
            http_client,
            endpoint,
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            input: Vec<&'a str>,
        }

        #[derive(Deserialize)]
        struct EmbedResponse {
            data: Vec<EmbedData>,
        }

        #[derive(Deserialize)]
        struct EmbedData {
            embedding: Vec<f32>,
        }

        let request = EmbedRequest {
            model: &self.endpoint.model,
            input: vec![text],
        };

        let url = format!("{}/v1/embeddings", self.endpoint.url.trim_end_matches('/'));

        let mut req = self.http_client.post(&url).json(&request);

        if let Some(ref api_key) = self.endpoint.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await.map_err(NlFilterError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NlFilterError::Embedding(format!(
                "Embedding service error (HTTP {}): {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response.json().await.map_err(NlFilterError::Http)?;

        embed_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| NlFilterError::Embedding("No embedding returned".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.endpoint.model
    }
}

/// Deterministic pseudo-embedding from SHA-256
///
/// Carries no semantics; identical text gives identical vectors so search
/// still runs when no embedding service is reachable.
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub const MODEL_NAME: &'static str = "sha256-hash";

    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut embedding = Vec::with_capacity(self.dimensions);
        let mut block: u64 = 0;
        while embedding.len() < self.dimensions {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            hasher.update(block.to_le_bytes());
            let digest = hasher.finalize();
            embedding.extend(
                digest
                    .iter()
                    .take(self.dimensions - embedding.len())
                    .map(|b| (*b as f32 - 127.5) / 127.5),
            );
            block += 1;
        }
        embedding
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        Self::MODEL_NAME
    }
}

/// Embedding plus the model that produced it
#[derive(Debug, Clone)]
pub struct LabeledEmbedding {
    pub vector: Vec<f32>,
    pub model: String,
}

/// Tries each embedder in order, ending with [`HashEmbedder`]
pub struct FallbackEmbedder {
    chain: Vec<Arc<dyn Embedder>>,
    hash: HashEmbedder,
    dimensions: usize,
}

impl FallbackEmbedder {
    pub fn new(chain: Vec<Arc<dyn Embedder>>, dimensions: usize) -> Self {
        Self {
            chain,
            hash: HashEmbedder::new(dimensions),
            dimensions,
        }
    }

    /// Hosted endpoint when it has a key, then the local endpoint if set
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut chain: Vec<Arc<dyn Embedder>> = Vec::new();

        if config.hosted.api_key.is_some() {
            chain.push(Arc::new(HttpEmbedder::new(
                config.hosted.clone(),
                config.dimensions,
                timeout,
            )?));
        }
        if let Some(local) = &config.local {
            chain.push(Arc::new(HttpEmbedder::new(
                local.clone(),
                config.dimensions,
                timeout,
            )?));
        }

        Ok(Self::new(chain, config.dimensions))
    }

    /// Embed and report which model answered; never fails
    pub async fn embed_labeled(&self, text: &str) -> LabeledEmbedding {
        for embedder in &self.chain {
            let start = Instant::now();
            match embedder.embed(text).await {
                Ok(vector) => {
                    let original = vector.len();
                    tracing::debug!(
                        "Embedded with {} ({} -> {} dims) in {}ms",
                        embedder.model_name(),
                        original,
                        self.dimensions,
                        start.elapsed().as_millis()
                    );
                    return LabeledEmbedding {
                        vector: normalize_dimensions(vector, self.dimensions),
                        model: embedder.model_name().to_string(),
                    };
                }
                Err(e) => {
                    tracing::warn!("Embedder {} failed: {}", embedder.model_name(), e);
                }
            }
        }

        if self.chain.is_empty() {
            tracing::debug!("No embedding service configured, using hash embedding");
        } else {
            tracing::warn!("Falling back to hash embedding");
        }
        LabeledEmbedding {
            vector: self.hash.embed_sync(text),
            model: HashEmbedder::MODEL_NAME.to_string(),
        }
    }
}

#[async_trait]
impl Embedder for FallbackEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_labeled(text).await.vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        self.chain
            .first()
            .map(|e| e.model_name())
            .unwrap_or(HashEmbedder::MODEL_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl Embedder for Failing {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(NlFilterError::Embedding("down".to_string()))
        }
        fn dimensions(&self) -> usize {
            1536
        }
        fn model_name(&self) -> &str {
            "failing"
        }
    }

    struct Small;

    #[async_trait]
    impl Embedder for Small {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.5; 384])
        }
        fn dimensions(&self) -> usize {
            384
        }
        fn model_name(&self) -> &str {
            "all-MiniLM-L6-v2"
        }
    }

    #[test]
    fn test_normalize_dimensions() {
        assert_eq!(normalize_dimensions(vec![1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
        assert_eq!(normalize_dimensions(vec![1.0], 3), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_hash_embedding_is_deterministic() {
        let embedder = HashEmbedder::new(1536);
        let a = embedder.embed_sync("posts about Rohit Sharma");
        assert_eq!(a.len(), 1536);
        assert_eq!(a, embedder.embed_sync("posts about Rohit Sharma"));
        assert_ne!(a, embedder.embed_sync("posts about Virat Kohli"));
        assert!(a.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[tokio::test]
    async fn test_fallback_order_and_padding() {
        let embedder = FallbackEmbedder::new(vec![Arc::new(Failing), Arc::new(Small)], 1536);
        let result = embedder.embed_labeled("q").await;
        assert_eq!(result.model, "all-MiniLM-L6-v2");
        assert_eq!(result.vector.len(), 1536);
        assert_eq!(result.vector[383], 0.5);
        assert_eq!(result.vector[384], 0.0);
    }

    #[tokio::test]
    async fn test_fallback_to_hash() {
        let embedder = FallbackEmbedder::new(vec![Arc::new(Failing)], 64);
        let result = embedder.embed_labeled("q").await;
        assert_eq!(result.model, HashEmbedder::MODEL_NAME);
        assert_eq!(result.vector, HashEmbedder::new(64).embed_sync("q"));
    }

    #[test]
    fn test_from_config_skips_keyless_hosted() {
        let embedder = FallbackEmbedder::from_config(&EmbeddingConfig::default()).unwrap();
        assert_eq!(embedder.model_name(), HashEmbedder::MODEL_NAME);
    }
}
