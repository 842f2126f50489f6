//! Projection and adaptive clustering core.
//!
//! Everything here is synchronous and free of shared state: each call works on
//! its own vectors and points, so concurrent requests never interact.
//!
//! ```text
//! vectors ──▶ project_to_2d ──▶ points ──▶ ClusterOrchestrator::run ──▶ ClusteringOutcome
//!                                              │
//!                                   DensityTiers / AdaptiveK
//!                                   Dbscan, then KMeans on degeneracy
//! ```

mod density;
mod error;
mod params;
mod partition;
mod projection;
mod strategy;
mod traits;
mod types;

pub use density::Dbscan;
pub use error::{LayoutError, LayoutResult};
pub use params::{AdaptiveK, DensityParams, DensityTier, DensityTiers};
pub use partition::{KMeans, KMeansOptions};
pub use projection::{project_to_2d, small_input_fallback, Projection, ProjectionOptions};
pub use strategy::{ClusterOrchestrator, ClusterPolicy, ClusteringOutcome, StrategyKind};
pub use traits::Clusterer;
pub use types::{summarize, ClusterSummary, Partition, Point2D, UNCLUSTERED};

use serde::{Deserialize, Serialize};

/// All tunables of the projection and clustering stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPolicy {
    pub projection: ProjectionOptions,
    pub clustering: ClusterPolicy,
}

/// Points and final partition for one batch of vectors.
#[derive(Debug, Clone)]
pub struct Layout {
    pub points: Vec<Point2D>,
    pub outcome: ClusteringOutcome,
}

impl Layout {
    /// Project `vectors` and cluster the result. Requires at least one vector.
    pub fn compute(vectors: &[Vec<f32>], policy: &LayoutPolicy) -> LayoutResult<Self> {
        let points = project_to_2d(vectors, &policy.projection)?;
        let outcome = ClusterOrchestrator::new(policy.clustering.clone()).run(&points)?;
        Ok(Self { points, outcome })
    }

    pub fn summaries(&self) -> Vec<ClusterSummary> {
        self.outcome.summaries(&self.points)
    }
}
