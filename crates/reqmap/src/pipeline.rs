//! End-to-end clustered layout: embed, project, cluster, name, assemble.

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::NamingConfig;
use crate::error::{Error, Result};
use crate::layout::{ClusterSummary, Layout, LayoutPolicy, Partition};
use crate::providers::{EmbeddingProvider, NamingProvider};
use crate::types::LayoutResponse;

/// Request-independent pipeline; providers are injected once and shared.
#[derive(Clone)]
pub struct LayoutPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    namer: Arc<dyn NamingProvider>,
    policy: LayoutPolicy,
    max_concurrent_names: usize,
    name_timeout: Option<Duration>,
}

impl LayoutPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        namer: Arc<dyn NamingProvider>,
        policy: LayoutPolicy,
    ) -> Self {
        Self::with_naming(embedder, namer, policy, &NamingConfig::default())
    }

    /// Like [`LayoutPipeline::new`], with fan-out width and per-cluster timeout
    /// taken from `naming`.
    pub fn with_naming(
        embedder: Arc<dyn EmbeddingProvider>,
        namer: Arc<dyn NamingProvider>,
        policy: LayoutPolicy,
        naming: &NamingConfig,
    ) -> Self {
        let name_timeout = match naming.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Self {
            embedder,
            namer,
            policy,
            max_concurrent_names: naming.max_concurrent.max(1),
            name_timeout,
        }
    }

    pub fn policy(&self) -> &LayoutPolicy {
        &self.policy
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub fn namer(&self) -> &Arc<dyn NamingProvider> {
        &self.namer
    }

    /// Lay out `texts` as a named, clustered 2D point cloud.
    ///
    /// Output points keep the input order. Embedding failures abort the
    /// request; naming failures fall back to `"Cluster <id>"` per cluster.
    pub async fn compute_clustered_layout(&self, texts: &[String]) -> Result<LayoutResponse> {
        if texts.iter().all(|text| text.trim().is_empty()) {
            return Err(Error::validation("No requirements provided"));
        }

        let start = Instant::now();
        tracing::info!("Computing layout for {} requirements", texts.len());

        let vectors = self.embedder.embed_batch(texts).await?;
        if vectors.is_empty() {
            return Err(Error::embedding(format!(
                "No embeddings returned from {}",
                self.embedder.name()
            )));
        }
        if vectors.len() != texts.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} requirements",
                self.embedder.name(),
                vectors.len(),
                texts.len()
            )));
        }
        let embed_ms = start.elapsed().as_millis();
        tracing::info!(
            "Embedded {} requirements ({} dims) in {}ms",
            vectors.len(),
            vectors[0].len(),
            embed_ms
        );

        let layout_start = Instant::now();
        let layout = Layout::compute(&vectors, &self.policy)?;
        tracing::info!(
            "Projected and clustered into {} clusters ({:?}) in {}ms",
            layout.outcome.partition.len(),
            layout.outcome.strategy,
            layout_start.elapsed().as_millis()
        );

        let naming_start = Instant::now();
        let mut clusters = layout.summaries();
        let names = self.name_clusters(texts, &layout.outcome.partition).await;
        for summary in &mut clusters {
            if let Some(name) = names.get(&summary.id) {
                summary.name = name.clone();
            }
        }
        tracing::info!(
            "Named {} clusters in {}ms",
            clusters.len(),
            naming_start.elapsed().as_millis()
        );

        let response =
            LayoutResponse::assemble(texts, &layout.points, &layout.outcome.partition, clusters);
        tracing::info!("Layout complete in {}ms", start.elapsed().as_millis());

        Ok(response)
    }

    /// Name every cluster concurrently and merge the results once all finish.
    async fn name_clusters(&self, texts: &[String], partition: &Partition) -> HashMap<usize, String> {
        let requests: Vec<(usize, Vec<String>)> = partition
            .iter()
            .map(|(id, members)| (id, members.iter().map(|&i| texts[i].clone()).collect()))
            .collect();

        stream::iter(requests)
            .map(|(id, members)| async move { (id, self.name_one(id, &members).await) })
            .buffer_unordered(self.max_concurrent_names)
            .collect::<HashMap<_, _>>()
            .await
    }

    async fn name_one(&self, id: usize, members: &[String]) -> String {
        let call = self.namer.name_cluster(members);
        let result = match self.name_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(Error::naming(format!("timed out after {:?}", limit))),
            },
            None => call.await,
        };

        match result {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("Naming cluster {} failed, using placeholder: {}", id, e);
                ClusterSummary::placeholder_name(id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio_test::{assert_err, assert_ok, block_on};

    struct Unreachable;

    #[async_trait]
    impl EmbeddingProvider for Unreachable {
        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(Error::embedding("should not be called"))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "unreachable"
        }
    }

    #[async_trait]
    impl NamingProvider for Unreachable {
        async fn name_cluster(&self, _texts: &[String]) -> Result<String> {
            Err(Error::naming("should not be called"))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "unreachable"
        }
    }

    fn pipeline() -> LayoutPipeline {
        LayoutPipeline::new(
            Arc::new(Unreachable),
            Arc::new(Unreachable),
            LayoutPolicy::default(),
        )
    }

    #[test]
    fn test_blank_input_rejected_before_embedding() {
        let err = assert_err!(block_on(pipeline().compute_clustered_layout(&[String::new()])));
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_failed_names_use_placeholders() {
        let partition = Partition::from_labels(&[Some(0), Some(1), Some(1)]);
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let names = block_on(pipeline().name_clusters(&texts, &partition));
        assert_eq!(names.len(), 2);
        assert_eq!(names[&0], "Cluster 0");
        assert_eq!(names[&1], "Cluster 1");
    }

    #[test]
    fn test_zero_timeout_disables_limit() {
        let naming = NamingConfig {
            timeout_secs: 0,
            max_concurrent: 0,
            ..Default::default()
        };
        let pipeline = LayoutPipeline::with_naming(
            Arc::new(Unreachable),
            Arc::new(Unreachable),
            LayoutPolicy::default(),
            &naming,
        );
        assert!(pipeline.name_timeout.is_none());
        assert_eq!(pipeline.max_concurrent_names, 1);
        assert_ok!(pipeline.policy().clustering.validate());
    }
}
