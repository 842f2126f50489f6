//! In-process providers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use reqmap::error::{Error, Result};
use reqmap::providers::{EmbeddingProvider, NamingProvider};

/// Twelve requirements in three themes of four
pub fn themed_requirements() -> Vec<String> {
    let themes = [
        ["Users log in with email", "Users reset passwords", "Sessions expire", "Admins lock accounts"],
        ["Export reports to CSV", "Export reports to PDF", "Schedule exports", "Email exported files"],
        ["Pay by card", "Refund payments", "Store invoices", "Apply discount codes"],
    ];
    themes.iter().flatten().map(|s| s.to_string()).collect()
}

/// One vector per text: a strong axis per theme plus a tiny per-item offset
pub fn themed_vectors(themes: usize, per_theme: usize) -> Vec<Vec<f32>> {
    let dims = themes + per_theme;
    (0..themes * per_theme)
        .map(|i| {
            let mut v = vec![0.0f32; dims];
            v[i / per_theme] = 10.0;
            v[themes + i % per_theme] = 0.01;
            v
        })
        .collect()
}

/// Returns a fixed set of vectors regardless of input
pub struct FixedEmbedder {
    pub vectors: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(self.vectors.clone())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Always fails, like an unreachable embedding service
pub struct DownEmbedder;

#[async_trait]
impl EmbeddingProvider for DownEmbedder {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::embedding("connection refused"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "down"
    }
}

/// Names a cluster after its first member; counts calls
#[derive(Default)]
pub struct EchoNamer {
    pub calls: AtomicUsize,
}

#[async_trait]
impl NamingProvider for EchoNamer {
    async fn name_cluster(&self, texts: &[String]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("About {}", texts[0]))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Fails for clusters whose first member contains `needle`
pub struct FlakyNamer {
    pub needle: &'static str,
}

#[async_trait]
impl NamingProvider for FlakyNamer {
    async fn name_cluster(&self, texts: &[String]) -> Result<String> {
        if texts.iter().any(|t| t.contains(self.needle)) {
            return Err(Error::naming("rate limited"));
        }
        Ok("Named".to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Never answers within a test's patience
pub struct StalledNamer;

#[async_trait]
impl NamingProvider for StalledNamer {
    async fn name_cluster(&self, _texts: &[String]) -> Result<String> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok("too late".to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "stalled"
    }
}
