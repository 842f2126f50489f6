//! Density-first clustering with a k-means fallback.
//!
//! DBSCAN runs first unless the cloud is large enough to skip it outright.
//! A density result with at most one cluster on a cloud larger than
//! `min_points_for_fallback` is treated as degenerate and replaced by k-means
//! with an adaptive `k`. The fallback result is final whatever its size.

use serde::{Deserialize, Serialize};

use super::density::Dbscan;
use super::error::{LayoutError, LayoutResult};
use super::params::{AdaptiveK, DensityTiers};
use super::partition::{KMeans, KMeansOptions};
use super::traits::Clusterer;
use super::types::{summarize, ClusterSummary, Partition, Point2D};

/// Which strategy produced the final partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Density,
    Fallback,
}

/// Thresholds and parameters for strategy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterPolicy {
    /// A single density cluster is only degenerate above this many points
    pub min_points_for_fallback: usize,
    /// Above this many points density clustering is skipped
    pub skip_density_above: usize,
    pub density_tiers: DensityTiers,
    pub adaptive_k: AdaptiveK,
    pub kmeans: KMeansOptions,
}

impl Default for ClusterPolicy {
    fn default() -> Self {
        Self {
            min_points_for_fallback: 5,
            skip_density_above: 30,
            density_tiers: DensityTiers::default(),
            adaptive_k: AdaptiveK::default(),
            kmeans: KMeansOptions::default(),
        }
    }
}

impl ClusterPolicy {
    pub fn validate(&self) -> LayoutResult<()> {
        self.density_tiers.validate()?;
        if self.adaptive_k.min_k == 0 {
            return Err(LayoutError::InvalidParameter {
                name: "min_k",
                message: "must be at least 1",
            });
        }
        if !self.adaptive_k.max_ratio.is_finite() || self.adaptive_k.max_ratio <= 0.0 {
            return Err(LayoutError::InvalidParameter {
                name: "max_ratio",
                message: "must be positive and finite",
            });
        }
        Ok(())
    }

    /// Whether a density partition of `n` points should be replaced.
    pub fn is_degenerate(&self, partition: &Partition, n: usize) -> bool {
        partition.len() <= 1 && n > self.min_points_for_fallback
    }
}

/// Final partition and how it was reached.
#[derive(Debug, Clone)]
pub struct ClusteringOutcome {
    /// Compacted partition (ids `0..len`)
    pub partition: Partition,
    pub strategy: StrategyKind,
    pub density_skipped: bool,
}

impl ClusteringOutcome {
    /// Cluster geometry with placeholder names.
    pub fn summaries(&self, points: &[Point2D]) -> Vec<ClusterSummary> {
        summarize(points, &self.partition)
    }
}

/// Runs the density/fallback state machine for one point cloud.
#[derive(Debug, Clone, Default)]
pub struct ClusterOrchestrator {
    policy: ClusterPolicy,
}

impl ClusterOrchestrator {
    pub fn new(policy: ClusterPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ClusterPolicy {
        &self.policy
    }

    /// Cluster `points`. Requires at least one point.
    pub fn run(&self, points: &[Point2D]) -> LayoutResult<ClusteringOutcome> {
        let n = points.len();
        if n == 0 {
            return Err(LayoutError::EmptyInput);
        }

        if n > self.policy.skip_density_above {
            tracing::info!(
                "{} points exceeds density threshold {}, using k-means directly",
                n,
                self.policy.skip_density_above
            );
            let partition = self.fallback(points)?;
            return Ok(self.finish(partition, StrategyKind::Fallback, true, n));
        }

        let params = self.policy.density_tiers.select(n);
        tracing::debug!(
            "DBSCAN parameters for {} points: epsilon={}, min_pts={}",
            n,
            params.epsilon,
            params.min_pts
        );

        let density = Dbscan::from_params(params).cluster(points)?;

        if self.policy.is_degenerate(&density, n) {
            tracing::info!(
                "DBSCAN found {} cluster(s) for {} points, falling back to k-means",
                density.len(),
                n
            );
            let partition = self.fallback(points)?;
            return Ok(self.finish(partition, StrategyKind::Fallback, false, n));
        }

        Ok(self.finish(density, StrategyKind::Density, false, n))
    }

    fn fallback(&self, points: &[Point2D]) -> LayoutResult<Partition> {
        let k = self.policy.adaptive_k.compute(points, points.len());
        let kmeans = KMeans::from_options(k, &self.policy.kmeans);
        tracing::debug!("Running {} with k={}", kmeans.name(), kmeans.k());
        kmeans.cluster(points)
    }

    fn finish(
        &self,
        partition: Partition,
        strategy: StrategyKind,
        density_skipped: bool,
        n: usize,
    ) -> ClusteringOutcome {
        let partition = partition.compact();
        tracing::info!(
            "Found {} clusters ({:?}), {} of {} points unclustered",
            partition.len(),
            strategy,
            n - partition.clustered_count(),
            n
        );
        ClusteringOutcome {
            partition,
            strategy,
            density_skipped,
        }
    }
}
