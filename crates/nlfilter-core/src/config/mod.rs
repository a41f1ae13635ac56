//! Configuration management
//!
//! Configuration is an explicit value handed to the pipeline and the search
//! client at construction. Nothing in the core reads process environment on
//! its own; [`Config::with_env_overrides`] is the single place credentials
//! are picked up from the environment, and the CLI calls it once at startup.

use crate::error::{NlFilterError, Result};
use crate::extract::Vocabulary;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables consulted by [`Config::with_env_overrides`]
pub mod env {
    pub const OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
    pub const PINECONE_INDEX_NAME: &str = "PINECONE_INDEX_NAME";
    pub const LOCAL_EMBEDDING_URL: &str = "NLFILTER_LOCAL_EMBEDDING_URL";
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Text-generation providers
    #[serde(default)]
    pub llm: LLMConfig,

    /// Embedding endpoints
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector index
    #[serde(default)]
    pub index: IndexConfig,

    /// Keyword tables for the rule-based extractor
    #[serde(default)]
    pub vocabulary: Vocabulary,
}

/// One OpenAI-compatible chat-completions provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Display name used in logs and outcomes
    pub name: String,

    /// Base URL; `/v1/chat/completions` is appended
    pub url: String,

    /// Bearer token. A provider without a key is skipped.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Models tried in order
    #[serde(default)]
    pub models: Vec<String>,
}

impl ProviderConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) && !self.models.is_empty()
    }
}

/// Text-generation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Provider whose models are tried first, in order
    #[serde(default = "default_primary_provider")]
    pub primary: ProviderConfig,

    /// Provider tried once after every primary model failed
    #[serde(default = "default_secondary_provider")]
    pub secondary: Option<ProviderConfig>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-call timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            primary: default_primary_provider(),
            secondary: default_secondary_provider(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_primary_provider() -> ProviderConfig {
    ProviderConfig {
        name: "openrouter".to_string(),
        url: "https://openrouter.ai/api".to_string(),
        api_key: None,
        models: [
            "google/gemma-3n-e4b-it:free",
            "qwen/qwen3-8b:free",
            "mistralai/mistral-small-3.1-24b-instruct:free",
            "sarvamai/sarvam-m:free",
            "qwen/qwen3-4b:free",
            "deepseek/deepseek-v3-base:free",
            "deepseek/deepseek-r1-0528:free",
        ]
        .iter()
        .map(|m| m.to_string())
        .collect(),
    }
}

fn default_secondary_provider() -> Option<ProviderConfig> {
    Some(ProviderConfig {
        name: "openai".to_string(),
        url: "https://api.openai.com".to_string(),
        api_key: None,
        models: vec!["gpt-3.5-turbo".to_string()],
    })
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.1
}

fn default_llm_timeout() -> u64 {
    10
}

/// One OpenAI-compatible embeddings endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingEndpoint {
    /// Base URL; `/v1/embeddings` is appended
    pub url: String,

    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,
}

/// Embedding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Hosted embedding API, used when it has a key
    #[serde(default = "default_hosted_embedding")]
    pub hosted: EmbeddingEndpoint,

    /// Local OpenAI-compatible embedding server
    #[serde(default)]
    pub local: Option<EmbeddingEndpoint>,

    /// Dimension every embedding is normalized to
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            hosted: default_hosted_embedding(),
            local: None,
            dimensions: default_dimensions(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

fn default_hosted_embedding() -> EmbeddingEndpoint {
    EmbeddingEndpoint {
        url: "https://api.openai.com".to_string(),
        model: "text-embedding-ada-002".to_string(),
        api_key: None,
    }
}

fn default_local_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_dimensions() -> usize {
    1536
}

fn default_embedding_timeout() -> u64 {
    30
}

/// Pinecone index configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Control-plane URL used to resolve the index host
    #[serde(default = "default_control_plane_url")]
    pub control_plane_url: String,

    /// Data-plane host; resolved from the control plane when absent
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,

    #[serde(default = "default_index_timeout")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: default_index_name(),
            control_plane_url: default_control_plane_url(),
            host: None,
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            timeout_secs: default_index_timeout(),
        }
    }
}

impl IndexConfig {
    /// Clamp a requested result count to `[1, max_top_k]`
    pub fn clamp_top_k(&self, requested: usize) -> usize {
        requested.clamp(1, self.max_top_k.max(1))
    }
}

fn default_index_name() -> String {
    "bridged-demo-articles".to_string()
}

fn default_control_plane_url() -> String {
    "https://api.pinecone.io".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_max_top_k() -> usize {
    50
}

fn default_index_timeout() -> u64 {
    30
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load config from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            config.check()?;
            Ok(config)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Fill credentials and endpoints from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup; empty values are ignored
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(env::OPENROUTER_API_KEY) {
            self.llm.primary.api_key = Some(key);
        }
        if let Some(key) = get(env::OPENAI_API_KEY) {
            if let Some(secondary) = self.llm.secondary.as_mut() {
                secondary.api_key = Some(key.clone());
            }
            self.embedding.hosted.api_key = Some(key);
        }
        if let Some(key) = get(env::PINECONE_API_KEY) {
            self.index.api_key = Some(key);
        }
        if let Some(name) = get(env::PINECONE_INDEX_NAME) {
            self.index.index_name = name;
        }
        if let Some(url) = get(env::LOCAL_EMBEDDING_URL) {
            match self.embedding.local.as_mut() {
                Some(local) => local.url = url,
                None => {
                    self.embedding.local = Some(EmbeddingEndpoint {
                        url,
                        model: default_local_embedding_model(),
                        api_key: None,
                    })
                }
            }
        }
        self
    }

    /// Copy with every secret replaced, for display
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        let mask = |key: &mut Option<String>| {
            if key.is_some() {
                *key = Some("********".to_string());
            }
        };
        mask(&mut config.llm.primary.api_key);
        if let Some(secondary) = config.llm.secondary.as_mut() {
            mask(&mut secondary.api_key);
        }
        mask(&mut config.embedding.hosted.api_key);
        if let Some(local) = config.embedding.local.as_mut() {
            mask(&mut local.api_key);
        }
        mask(&mut config.index.api_key);
        config
    }

    fn check(&self) -> Result<()> {
        if self.embedding.dimensions == 0 {
            return Err(NlFilterError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }
        if self.index.max_top_k == 0 {
            return Err(NlFilterError::Config(
                "index.max_top_k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.llm.primary.models.len(), 7);
        assert_eq!(config.llm.max_tokens, 500);
        assert_eq!(config.llm.timeout_secs, 10);
        assert_eq!(config.embedding.dimensions, 1536);
        assert_eq!(config.index.index_name, "bridged-demo-articles");
        assert!(!config.llm.primary.is_enabled());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (env::OPENROUTER_API_KEY, "or-key"),
            (env::OPENAI_API_KEY, "oa-key"),
            (env::PINECONE_INDEX_NAME, "articles"),
            (env::PINECONE_API_KEY, "  "),
            (env::LOCAL_EMBEDDING_URL, "http://localhost:8080"),
        ]);
        let config = Config::default().with_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert!(config.llm.primary.is_enabled());
        assert_eq!(
            config.llm.secondary.as_ref().and_then(|s| s.api_key.as_deref()),
            Some("oa-key")
        );
        assert_eq!(config.embedding.hosted.api_key.as_deref(), Some("oa-key"));
        assert_eq!(config.index.index_name, "articles");
        assert_eq!(config.index.api_key, None);
        assert_eq!(
            config.embedding.local.map(|l| l.url),
            Some("http://localhost:8080".to_string())
        );
    }

    #[test]
    fn test_load_partial_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "llm:\n  timeout_secs: 3\n  secondary: null\nindex:\n  max_top_k: 20\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.llm.timeout_secs, 3);
        assert!(config.llm.secondary.is_none());
        assert_eq!(config.llm.primary.models.len(), 7);
        assert_eq!(config.index.max_top_k, 20);
        assert_eq!(config.index.clamp_top_k(100), 20);
        assert_eq!(config.index.clamp_top_k(0), 1);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.yml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "embedding:\n  dimensions: 0\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(NlFilterError::Config(_))
        ));
    }

    #[test]
    fn test_save_roundtrip_and_redaction() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yml");
        let mut config = Config::default();
        config.index.api_key = Some("secret".to_string());
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
        assert_eq!(config.redacted().index.api_key.as_deref(), Some("********"));
        assert_eq!(config.redacted().llm.primary.api_key, None);
    }
}
