//! Configuration for the requirement map service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::layout::LayoutPolicy;

/// Upper bound for any provider's `max_retries`
pub const MAX_RETRIES: u32 = 10;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReqmapConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding provider configuration
    pub embeddings: EmbeddingConfig,
    /// Cluster naming provider configuration
    pub naming: NamingConfig,
    /// Ollama configuration (shared by the Ollama embedder and namer)
    pub ollama: OllamaConfig,
    /// Projection and clustering policy
    pub layout: LayoutPolicy,
}

impl ReqmapConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file. Missing sections take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(raw: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Environment overrides: `PORT`, `OPENAI_API_KEY`, `MARQO_URL`, `OLLAMA_URL`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()) {
            self.naming.openai.api_key = Some(key);
        }
        if let Some(url) = lookup("MARQO_URL") {
            self.embeddings.marqo.base_url = url;
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.ollama.base_url = url;
        }
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.layout
            .clustering
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;

        if self.naming.max_concurrent == 0 {
            return Err(Error::Config("naming.max_concurrent must be at least 1".to_string()));
        }
        if self.embeddings.marqo.fetch_concurrency == 0 {
            return Err(Error::Config(
                "embeddings.marqo.fetch_concurrency must be at least 1".to_string(),
            ));
        }

        let retries = [
            ("embeddings.marqo.max_retries", self.embeddings.marqo.max_retries),
            ("naming.openai.max_retries", self.naming.openai.max_retries),
            ("ollama.max_retries", self.ollama.max_retries),
        ];
        for (key, value) in retries {
            if value > MAX_RETRIES {
                return Err(Error::Config(format!(
                    "{} must be at most {} (got {})",
                    key, MAX_RETRIES, value
                )));
            }
        }

        if self.naming.backend == NamingBackend::OpenAi && self.naming.openai.api_key.is_none() {
            tracing::warn!(
                "No OpenAI API key configured; every cluster will use its placeholder name"
            );
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Directory with the static front end (`None` disables static serving)
    pub static_dir: Option<PathBuf>,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
            static_dir: Some(PathBuf::from("public")),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Marqo index (embeds documents on upload)
    #[default]
    Marqo,
    /// Local Ollama server
    Ollama,
}

/// Embedding provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub marqo: MarqoConfig,
}

/// Marqo configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarqoConfig {
    /// Marqo base URL
    pub base_url: String,
    /// Index that receives the requirement documents
    pub index_name: String,
    /// Model used when the index has to be created
    pub model: String,
    /// Document field holding the text (also the tensor field)
    pub text_field: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Documents fetched back from Marqo at once
    pub fetch_concurrency: usize,
}

impl Default for MarqoConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8882".to_string(),
            index_name: "earlybird_requirements".to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            text_field: "text".to_string(),
            timeout_secs: 60,
            max_retries: 2,
            fetch_concurrency: 8,
        }
    }
}

/// Naming backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum NamingBackend {
    /// OpenAI chat completions
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

/// Cluster naming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub backend: NamingBackend,
    pub openai: OpenAiConfig,
    /// Naming calls in flight at once
    pub max_concurrent: usize,
    /// Per-cluster timeout in seconds (0 disables)
    pub timeout_secs: u64,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            backend: NamingBackend::default(),
            openai: OpenAiConfig::default(),
            max_concurrent: 8,
            timeout_secs: 30,
        }
    }
}

/// OpenAI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL
    pub base_url: String,
    /// API key (usually from `OPENAI_API_KEY`)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Chat model
    pub model: String,
    /// Maximum tokens in the generated name
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 20,
            temperature: 0.3,
            timeout_secs: 30,
            max_retries: 1,
        }
    }
}

/// Ollama configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "phi3".to_string(),
            temperature: 0.3,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}
