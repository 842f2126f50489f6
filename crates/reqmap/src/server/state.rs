//! Application state for the layout server

use std::sync::Arc;

use crate::config::ReqmapConfig;
use crate::pipeline::LayoutPipeline;
use crate::providers::Providers;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ReqmapConfig,
    pipeline: LayoutPipeline,
}

impl AppState {
    /// Wire configured providers into a pipeline
    pub fn new(config: ReqmapConfig, providers: Providers) -> Self {
        let pipeline = LayoutPipeline::with_naming(
            providers.embedder,
            providers.namer,
            config.layout.clone(),
            &config.naming,
        );
        Self::with_pipeline(config, pipeline)
    }

    /// Use an already-built pipeline
    pub fn with_pipeline(config: ReqmapConfig, pipeline: LayoutPipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pipeline }),
        }
    }

    pub fn config(&self) -> &ReqmapConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &LayoutPipeline {
        &self.inner.pipeline
    }

    /// Both providers answer their health checks
    pub async fn is_ready(&self) -> bool {
        let pipeline = self.pipeline();
        let (embedder, namer) = tokio::join!(
            pipeline.embedder().health_check(),
            pipeline.namer().health_check()
        );
        matches!(embedder, Ok(true)) && matches!(namer, Ok(true))
    }
}
