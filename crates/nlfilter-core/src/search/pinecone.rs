//! Pinecone REST client

use super::{IndexStats, SearchMatch};
use crate::config::IndexConfig;
use crate::error::{NlFilterError, Result};
use crate::filter::Filter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::OnceCell;

const API_VERSION: &str = "2024-07";

/// Vector index trait
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Nearest neighbours of `vector`, optionally restricted by `filter`
    async fn query(
        &self,
        vector: &[f32],
        filter: Option<&Filter>,
        top_k: usize,
    ) -> Result<Vec<SearchMatch>>;

    /// Index statistics
    async fn stats(&self) -> Result<IndexStats>;

    /// Index name for logs
    fn name(&self) -> &str;
}

/// Pinecone serverless index over HTTP
///
/// The data-plane host is taken from configuration or resolved from the
/// control plane on first use.
pub struct PineconeIndex {
    http_client: reqwest::Client,
    config: IndexConfig,
    host: OnceCell<String>,
}

impl PineconeIndex {
    pub fn new(config: IndexConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(NlFilterError::Http)?;

        let host = match &config.host {
            Some(host) => OnceCell::new_with(Some(with_scheme(host))),
            None => OnceCell::new(),
        };

        Ok(Self {
            http_client,
            config,
            host,
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| NlFilterError::Config("Pinecone API key is not configured".to_string()))
    }

    async fn host(&self) -> Result<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                #[derive(Deserialize)]
                struct DescribeIndex {
                    host: String,
                }

                let url = format!(
                    "{}/indexes/{}",
                    self.config.control_plane_url.trim_end_matches('/'),
                    self.config.index_name
                );
                tracing::debug!("Resolving index host via {}", url);

                let response = self
                    .http_client
                    .get(&url)
                    .header("Api-Key", self.api_key()?)
                    .header("X-Pinecone-API-Version", API_VERSION)
                    .send()
                    .await?;

                let description: DescribeIndex = check(response).await?.json().await?;
                Ok::<_, NlFilterError>(with_scheme(&description.host))
            })
            .await?;
        Ok(host.as_str())
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.host().await?, path);
        let response = self
            .http_client
            .post(&url)
            .header("Api-Key", self.api_key()?)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await?;
        check(response).await
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(
        &self,
        vector: &[f32],
        filter: Option<&Filter>,
        top_k: usize,
    ) -> Result<Vec<SearchMatch>> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct QueryRequest<'a> {
            vector: &'a [f32],
            top_k: usize,
            include_metadata: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            filter: Option<Value>,
        }

        #[derive(Deserialize)]
        struct QueryResponse {
            #[serde(default)]
            matches: Vec<SearchMatch>,
        }

        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            filter: filter.filter(|f| !f.is_empty()).map(Filter::to_value),
        };

        let response: QueryResponse = self.post("/query", &request).await?.json().await?;
        Ok(response.matches)
    }

    async fn stats(&self) -> Result<IndexStats> {
        let response = self
            .post("/describe_index_stats", &serde_json::json!({}))
            .await?;
        Ok(response.json().await?)
    }

    fn name(&self) -> &str {
        &self.config.index_name
    }
}

fn with_scheme(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(NlFilterError::Index(format!(
        "Pinecone error (HTTP {}): {}",
        status, body
    )))
}
