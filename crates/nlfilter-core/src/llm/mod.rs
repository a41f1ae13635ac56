//! LLM integration
//!
//! Provides:
//! - Prompt construction for filter generation
//! - An OpenAI-compatible chat-completions client
//! - The sequential provider chain with per-call timeouts
//! - Normalization of free-form model output into a JSON object

mod client;
mod normalize;
mod prompt;
mod provider_chain;
mod traits;

pub use client::{ChatMessage, OpenAICompatClient};
pub use normalize::normalize;
pub use prompt::{build_prompt, PromptBuilder, PromptExample};
pub use provider_chain::{
    AttemptFailure, Candidate, FailureReason, GenerationOutcome, ProviderChain,
};
pub use traits::*;
