//! Provider abstractions for embeddings and cluster naming
//!
//! Trait-based so the pipeline can switch between Marqo, Ollama and OpenAI
//! backends, and so tests can inject in-process fakes.

pub mod embedding;
pub mod marqo;
pub mod naming;
pub mod ollama;
pub mod openai;
pub mod prompt;
pub mod retry;

pub use embedding::EmbeddingProvider;
pub use naming::NamingProvider;

use std::sync::Arc;

use crate::config::{EmbeddingBackend, NamingBackend, ReqmapConfig};
use crate::error::Result;
use marqo::MarqoEmbedder;
use ollama::{OllamaClient, OllamaEmbedder, OllamaNamer};
use openai::OpenAiNamer;

/// Embedding and naming providers selected by configuration
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub namer: Arc<dyn NamingProvider>,
}

impl Providers {
    /// Build the configured providers. Ollama-backed providers share one client.
    pub fn from_config(config: &ReqmapConfig) -> Result<Self> {
        let ollama_needed = config.embeddings.backend == EmbeddingBackend::Ollama
            || config.naming.backend == NamingBackend::Ollama;
        let ollama = if ollama_needed {
            Some(Arc::new(OllamaClient::new(&config.ollama)?))
        } else {
            None
        };

        let embedder: Arc<dyn EmbeddingProvider> = match (&config.embeddings.backend, &ollama) {
            (EmbeddingBackend::Ollama, Some(client)) => {
                tracing::info!("Using Ollama embeddings ({})", config.ollama.embed_model);
                Arc::new(OllamaEmbedder::new(Arc::clone(client)))
            }
            _ => {
                tracing::info!(
                    "Using Marqo embeddings at {} (index '{}')",
                    config.embeddings.marqo.base_url,
                    config.embeddings.marqo.index_name
                );
                Arc::new(MarqoEmbedder::new(&config.embeddings.marqo)?)
            }
        };

        let namer: Arc<dyn NamingProvider> = match (&config.naming.backend, &ollama) {
            (NamingBackend::Ollama, Some(client)) => {
                tracing::info!("Using Ollama cluster naming ({})", config.ollama.generate_model);
                Arc::new(OllamaNamer::new(Arc::clone(client)))
            }
            _ => {
                tracing::info!("Using OpenAI cluster naming ({})", config.naming.openai.model);
                Arc::new(OpenAiNamer::new(&config.naming.openai)?)
            }
        };

        Ok(Self { embedder, namer })
    }
}
