//! Natural language to filter pipeline
//!
//! prompt -> provider chain -> normalize -> validate, with the rule-based
//! extractor behind every failure. A filter is always produced.

use crate::config::Config;
use crate::error::Result;
use crate::extract::{RuleBasedExtractor, Vocabulary};
use crate::filter::{validate, Filter};
use crate::llm::{normalize, AttemptFailure, GenerationOutcome, PromptBuilder, ProviderChain};
use chrono::{DateTime, Utc};
use futures::future::{abortable, AbortHandle, Abortable, BoxFuture, FutureExt};
use serde::Serialize;
use std::fmt;
use std::time::Instant;

/// Why the rule-based extractor produced the filter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No provider has credentials
    NoProviders,

    /// Generation was disabled by the caller
    Offline,

    /// The query was blank
    EmptyQuery,

    /// Every candidate failed
    GenerationFailed { attempts: Vec<AttemptFailure> },

    /// The model answered but no JSON object could be recovered
    Unparseable { provider: String, model: String },

    /// The recovered object held no recognized field
    NoRecognizedFields { provider: String, model: String },
}

/// Where a filter came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterSource {
    Model { provider: String, model: String },
    RuleBased { reason: FallbackReason },
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NoProviders => f.write_str("no providers configured"),
            FallbackReason::Offline => f.write_str("offline"),
            FallbackReason::EmptyQuery => f.write_str("empty query"),
            FallbackReason::GenerationFailed { attempts } => {
                write!(f, "all {} provider attempts failed", attempts.len())
            }
            FallbackReason::Unparseable { provider, model } => {
                write!(f, "unparseable response from {} / {}", provider, model)
            }
            FallbackReason::NoRecognizedFields { provider, model } => {
                write!(f, "no recognized fields from {} / {}", provider, model)
            }
        }
    }
}

impl fmt::Display for FilterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSource::Model { provider, model } => write!(f, "{} / {}", provider, model),
            FilterSource::RuleBased { reason } => write!(f, "rule-based ({})", reason),
        }
    }
}

/// A generated filter and its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOutcome {
    pub filter: Filter,
    pub source: FilterSource,
    pub elapsed_ms: u64,
}

impl FilterOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, FilterSource::RuleBased { .. })
    }
}

/// Converts natural-language queries into metadata filters
pub struct FilterPipeline {
    chain: ProviderChain,
    prompts: PromptBuilder,
    extractor: RuleBasedExtractor,
    offline: bool,
}

impl FilterPipeline {
    /// Create from explicit parts
    pub fn new(chain: ProviderChain, extractor: RuleBasedExtractor) -> Self {
        Self {
            chain,
            prompts: PromptBuilder::new(),
            extractor,
            offline: false,
        }
    }

    /// Create from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let chain = ProviderChain::from_config(&config.llm)?;
        let extractor = RuleBasedExtractor::new(&config.vocabulary)?;
        tracing::debug!("Filter pipeline with {} provider candidates", chain.candidates().len());
        Ok(Self::new(chain, extractor))
    }

    /// Pipeline that never calls a provider
    pub fn offline(vocabulary: &Vocabulary) -> Result<Self> {
        let mut pipeline = Self::new(
            ProviderChain::new(0, 0.0, std::time::Duration::ZERO),
            RuleBasedExtractor::new(vocabulary)?,
        );
        pipeline.offline = true;
        Ok(pipeline)
    }

    /// Replace the prompt example set
    pub fn with_prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    /// The prompt sent to providers for `query` today
    pub fn prompt_for(&self, query: &str) -> String {
        self.prompts.build(query, Utc::now().date_naive())
    }

    /// Generate a filter relative to the current time
    pub async fn generate_filter(&self, query: &str) -> FilterOutcome {
        self.generate_filter_at(query, Utc::now()).await
    }

    /// Generate a filter relative to `now`
    pub async fn generate_filter_at(&self, query: &str, now: DateTime<Utc>) -> FilterOutcome {
        let start = Instant::now();
        let query = query.trim();

        let source = if query.is_empty() {
            FilterSource::RuleBased {
                reason: FallbackReason::EmptyQuery,
            }
        } else if self.offline {
            FilterSource::RuleBased {
                reason: FallbackReason::Offline,
            }
        } else if self.chain.is_empty() {
            FilterSource::RuleBased {
                reason: FallbackReason::NoProviders,
            }
        } else {
            let prompt = self.prompts.build(query, now.date_naive());
            match self.chain.call_with_fallback(&prompt).await {
                GenerationOutcome::Success {
                    text,
                    provider,
                    model,
                    ..
                } => {
                    let raw = normalize(&text);
                    if raw.is_empty() {
                        FilterSource::RuleBased {
                            reason: FallbackReason::Unparseable { provider, model },
                        }
                    } else {
                        let filter = validate(&raw);
                        if filter.is_empty() {
                            FilterSource::RuleBased {
                                reason: FallbackReason::NoRecognizedFields { provider, model },
                            }
                        } else {
                            let source = FilterSource::Model { provider, model };
                            tracing::info!("Filter from {}: {}", source, filter);
                            return FilterOutcome {
                                filter,
                                source,
                                elapsed_ms: start.elapsed().as_millis() as u64,
                            };
                        }
                    }
                }
                GenerationOutcome::Failure { attempts } => FilterSource::RuleBased {
                    reason: FallbackReason::GenerationFailed { attempts },
                },
            }
        };

        let filter = self.extractor.extract_at(query, now);
        tracing::info!("Filter from {}: {}", source, filter);

        FilterOutcome {
            filter,
            source,
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Generation future plus a handle that cancels it
    ///
    /// Aborting drops any in-flight provider request; an aborted future
    /// resolves to `Err(Aborted)`.
    pub fn generate_filter_abortable<'a>(
        &'a self,
        query: &'a str,
    ) -> (Abortable<BoxFuture<'a, FilterOutcome>>, AbortHandle) {
        abortable(self.generate_filter(query).boxed())
    }
}
