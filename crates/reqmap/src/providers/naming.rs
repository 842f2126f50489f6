//! Naming provider trait for labelling clusters

use async_trait::async_trait;
use crate::error::Result;

/// Trait for generating a short, human-readable name for a group of texts
///
/// Implementations:
/// - `OpenAiNamer`: OpenAI chat completions (gpt-3.5-turbo)
/// - `OllamaNamer`: Local Ollama server (phi3, llama3, etc.)
#[async_trait]
pub trait NamingProvider: Send + Sync {
    /// Name the cluster formed by `texts`
    async fn name_cluster(&self, texts: &[String]) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
