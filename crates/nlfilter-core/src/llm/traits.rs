//! LLM trait definitions

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// One single-prompt completion call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

/// Text-generation trait
///
/// Every hosted provider is driven through this one shape.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the request's prompt
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Provider name for logs
    fn provider_name(&self) -> &str;
}
