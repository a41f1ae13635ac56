//! HTTP client for OpenAI-compatible chat-completion services (OpenRouter, OpenAI)

use super::{GenerationRequest, TextGenerator};
use crate::config::ProviderConfig;
use crate::error::{NlFilterError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// OpenAI-compatible chat-completions client
pub struct OpenAICompatClient {
    http_client: reqwest::Client,
    name: String,
    url: String,
    api_key: Option<String>,
}

impl OpenAICompatClient {
    /// Create client from provider configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(NlFilterError::Http)?;

        Ok(Self {
            http_client,
            name: config.name.clone(),
            url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.url)
    }
}

#[async_trait]
impl TextGenerator for OpenAICompatClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            #[serde(default)]
            content: Option<String>,
        }

        let start = Instant::now();

        let body = ChatRequest {
            model: &request.model,
            messages: vec![ChatMessage::user(request.prompt.as_str())],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut req = self
            .http_client
            .post(self.endpoint())
            .timeout(request.timeout)
            .json(&body);

        if let Some(ref api_key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await.map_err(NlFilterError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NlFilterError::ExternalError(format!(
                "{} error (HTTP {}): {}",
                self.name, status, body
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(NlFilterError::Http)?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| NlFilterError::Llm(format!("No choices from {}", self.name)))?
            .message
            .content
            .unwrap_or_default();

        tracing::debug!(
            "{} / {} responded in {}ms",
            self.name,
            request.model,
            start.elapsed().as_millis()
        );

        Ok(content)
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = ProviderConfig {
            name: "openrouter".to_string(),
            url: "https://openrouter.ai/api/".to_string(),
            api_key: Some("key".to_string()),
            models: vec!["m".to_string()],
        };
        let client = OpenAICompatClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "https://openrouter.ai/api/v1/chat/completions");
        assert_eq!(client.provider_name(), "openrouter");
    }
}
