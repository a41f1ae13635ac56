//! Sequential multi-provider text generation
//!
//! Candidates are tried one at a time in order. The first successful
//! response ends the chain; a failed candidate is abandoned for the rest of
//! the request.

use super::{GenerationRequest, OpenAICompatClient, TextGenerator};
use crate::config::LLMConfig;
use crate::error::Result;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One (provider, model) pair
#[derive(Clone)]
pub struct Candidate {
    pub model: String,
    client: Arc<dyn TextGenerator>,
}

impl Candidate {
    pub fn new(model: impl Into<String>, client: Arc<dyn TextGenerator>) -> Self {
        Self {
            model: model.into(),
            client,
        }
    }

    pub fn provider(&self) -> &str {
        self.client.provider_name()
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("provider", &self.provider())
            .field("model", &self.model)
            .finish()
    }
}

/// Why a candidate was abandoned
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    Timeout { after_ms: u64 },
    Error { message: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Timeout { after_ms } => write!(f, "timed out after {}ms", after_ms),
            FailureReason::Error { message } => f.write_str(message),
        }
    }
}

/// A failed call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptFailure {
    pub provider: String,
    pub model: String,
    pub reason: FailureReason,
    pub elapsed_ms: u64,
}

/// Result of running the chain
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Success {
        text: String,
        provider: String,
        model: String,
        elapsed: Duration,
        /// Candidates that failed before the successful one
        failures: Vec<AttemptFailure>,
    },

    /// Every candidate failed, or there were none
    Failure { attempts: Vec<AttemptFailure> },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success { .. })
    }
}

/// Ordered provider/model candidates with a shared call budget
#[derive(Debug, Clone)]
pub struct ProviderChain {
    candidates: Vec<Candidate>,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl ProviderChain {
    /// Empty chain with explicit call parameters
    pub fn new(max_tokens: u32, temperature: f32, timeout: Duration) -> Self {
        Self {
            candidates: Vec::new(),
            max_tokens,
            temperature,
            timeout,
        }
    }

    /// Append a candidate
    pub fn with_candidate(mut self, model: impl Into<String>, client: Arc<dyn TextGenerator>) -> Self {
        self.candidates.push(Candidate::new(model, client));
        self
    }

    /// Every primary model in order, then one secondary attempt
    ///
    /// Providers without an API key contribute nothing.
    pub fn from_config(config: &LLMConfig) -> Result<Self> {
        let mut chain = Self::new(
            config.max_tokens,
            config.temperature,
            Duration::from_secs(config.timeout_secs),
        );

        if config.primary.is_enabled() {
            let client: Arc<dyn TextGenerator> = Arc::new(OpenAICompatClient::new(&config.primary)?);
            for model in &config.primary.models {
                chain = chain.with_candidate(model.clone(), client.clone());
            }
        } else {
            tracing::debug!("Provider {} has no API key, skipping", config.primary.name);
        }

        if let Some(secondary) = config.secondary.as_ref() {
            match secondary.models.first() {
                Some(model) if secondary.is_enabled() => {
                    let client: Arc<dyn TextGenerator> = Arc::new(OpenAICompatClient::new(secondary)?);
                    chain = chain.with_candidate(model.clone(), client);
                }
                _ => tracing::debug!("Provider {} has no API key, skipping", secondary.name),
            }
        }

        Ok(chain)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Try each candidate once until one succeeds
    pub async fn call_with_fallback(&self, prompt: &str) -> GenerationOutcome {
        let chain_start = Instant::now();
        let mut failures = Vec::new();

        for (i, candidate) in self.candidates.iter().enumerate() {
            let request = GenerationRequest {
                model: candidate.model.clone(),
                prompt: prompt.to_string(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                timeout: self.timeout,
            };

            tracing::debug!(
                "[{}/{}] Trying {} / {}",
                i + 1,
                self.candidates.len(),
                candidate.provider(),
                candidate.model
            );

            let start = Instant::now();
            let result = tokio::time::timeout(self.timeout, candidate.client.generate(&request)).await;
            let elapsed = start.elapsed();

            let reason = match result {
                Ok(Ok(text)) => {
                    tracing::info!(
                        "Generated filter text with {} / {} in {}ms ({} chars)",
                        candidate.provider(),
                        candidate.model,
                        elapsed.as_millis(),
                        text.len()
                    );
                    tracing::debug!("Response preview: {}", preview(&text, 100));
                    return GenerationOutcome::Success {
                        text,
                        provider: candidate.provider().to_string(),
                        model: candidate.model.clone(),
                        elapsed: chain_start.elapsed(),
                        failures,
                    };
                }
                Ok(Err(e)) => FailureReason::Error {
                    message: e.to_string(),
                },
                Err(_) => FailureReason::Timeout {
                    after_ms: self.timeout.as_millis() as u64,
                },
            };

            tracing::warn!(
                "{} / {} failed: {} ({}ms)",
                candidate.provider(),
                candidate.model,
                preview(&reason.to_string(), 120),
                elapsed.as_millis()
            );

            failures.push(AttemptFailure {
                provider: candidate.provider().to_string(),
                model: candidate.model.clone(),
                reason,
                elapsed_ms: elapsed.as_millis() as u64,
            });
        }

        GenerationOutcome::Failure { attempts: failures }
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
