//! nlfilter Core Library
//!
//! Turns natural-language queries into vector-search metadata filters.
//!
//! # Features
//! - Mongo-style filter model over `author`, `tags` and `publishedTimestamp`
//! - Sequential multi-provider LLM generation with per-call timeouts
//! - Recovery of JSON filters from free-form model output
//! - Deterministic rule-based fallback with calendar date ranges
//! - Pinecone search with embedding fallbacks and tag post-filtering

pub mod config;
pub mod error;
pub mod extract;
pub mod filter;
pub mod llm;
pub mod pipeline;
pub mod search;

pub use config::{Config, EmbeddingConfig, EmbeddingEndpoint, IndexConfig, LLMConfig, ProviderConfig};
pub use error::{Error, NlFilterError, Result};
pub use extract::{RuleBasedExtractor, TagAlias, Vocabulary};
pub use filter::{validate, DateRange, Field, FieldValue, Filter, Operand, Operator, Scalar};
pub use llm::{
    build_prompt, normalize, AttemptFailure, FailureReason, GenerationOutcome, GenerationRequest,
    OpenAICompatClient, PromptBuilder, ProviderChain, TextGenerator,
};
pub use pipeline::{FallbackReason, FilterOutcome, FilterPipeline, FilterSource};
pub use search::{
    Embedder, FallbackEmbedder, HashEmbedder, IndexStats, PineconeIndex, SearchClient,
    SearchMatch, SearchResponse, SearchTimings, VectorIndex,
};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "nlfilter";
