//! Error types for nlfilter

use thiserror::Error;

/// Result type alias using NlFilterError
pub type Result<T> = std::result::Result<T, NlFilterError>;

/// Error type alias for convenience
pub type Error = NlFilterError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const SERVICE_UNAVAILABLE: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for nlfilter
#[derive(Debug, Error)]
pub enum NlFilterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External service error: {0}")]
    ExternalError(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl NlFilterError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) | Self::Config(_) | Self::Yaml(_) => exit_codes::INVALID_INPUT,
            Self::Index(_) | Self::Http(_) | Self::ExternalError(_) | Self::Timeout(_) => {
                exit_codes::SERVICE_UNAVAILABLE
            }
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}
