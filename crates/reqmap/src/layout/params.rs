//! Clustering parameters chosen from the size and spread of the point cloud.

use serde::{Deserialize, Serialize};

use super::error::{LayoutError, LayoutResult};
use super::types::Point2D;

/// DBSCAN parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityParams {
    pub epsilon: f64,
    pub min_pts: usize,
}

/// One step of the density parameter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityTier {
    /// Largest point count this tier applies to (`None` = unbounded)
    #[serde(default)]
    pub max_points: Option<usize>,
    pub epsilon: f64,
    pub min_pts: usize,
}

impl DensityTier {
    fn params(&self) -> DensityParams {
        DensityParams {
            epsilon: self.epsilon,
            min_pts: self.min_pts,
        }
    }
}

/// Ordered tier table; the first tier covering `n` wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DensityTiers(pub Vec<DensityTier>);

impl Default for DensityTiers {
    fn default() -> Self {
        Self(vec![
            DensityTier {
                max_points: Some(5),
                epsilon: 0.25,
                min_pts: 2,
            },
            DensityTier {
                max_points: Some(15),
                epsilon: 0.2,
                min_pts: 3,
            },
            DensityTier {
                max_points: None,
                epsilon: 0.15,
                min_pts: 5,
            },
        ])
    }
}

impl DensityTiers {
    /// Parameters for a cloud of `n` points.
    ///
    /// Falls back to the last tier when no tier bound covers `n`.
    pub fn select(&self, n: usize) -> DensityParams {
        self.0
            .iter()
            .find(|tier| tier.max_points.map_or(true, |max| n <= max))
            .or_else(|| self.0.last())
            .map(DensityTier::params)
            .unwrap_or(DensityParams {
                epsilon: 0.15,
                min_pts: 5,
            })
    }

    /// Reject tables that cannot drive DBSCAN.
    pub fn validate(&self) -> LayoutResult<()> {
        if self.0.is_empty() {
            return Err(LayoutError::InvalidParameter {
                name: "density_tiers",
                message: "at least one tier is required",
            });
        }
        for tier in &self.0 {
            if !tier.epsilon.is_finite() || tier.epsilon <= 0.0 {
                return Err(LayoutError::InvalidParameter {
                    name: "epsilon",
                    message: "must be positive and finite",
                });
            }
            if tier.min_pts == 0 {
                return Err(LayoutError::InvalidParameter {
                    name: "min_pts",
                    message: "must be at least 1",
                });
            }
        }
        let bounds: Vec<usize> = self.0.iter().filter_map(|t| t.max_points).collect();
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(LayoutError::InvalidParameter {
                name: "density_tiers",
                message: "tier bounds must be strictly increasing",
            });
        }
        Ok(())
    }
}

/// Target cluster count for the k-means fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveK {
    pub min_k: usize,
    /// Upper bound as a fraction of the point count
    pub max_ratio: f64,
    pub scale: f64,
    /// Floor for the bounding-box area of collinear or coincident clouds
    pub area_floor: f64,
}

impl Default for AdaptiveK {
    fn default() -> Self {
        Self {
            min_k: 2,
            max_ratio: 0.5,
            scale: 2.0,
            area_floor: 1e-6,
        }
    }
}

impl AdaptiveK {
    /// `k` proportional to `sqrt(n * density)`, clamped to `[min_k, max_k]`.
    ///
    /// `max_k` is the tighter of `n * max_ratio` and `n / 2`, and never below 1,
    /// so `k <= n` holds for every `n >= 1`.
    pub fn compute(&self, points: &[Point2D], n: usize) -> usize {
        let upper = ((n as f64 * self.max_ratio).floor() as usize)
            .min(n / 2)
            .max(1);
        let lower = self.min_k.max(1).min(upper);

        if points.is_empty() {
            return lower;
        }

        let area = bounding_box_area(points).max(self.area_floor);
        let density = n as f64 / area;
        let raw = ((n as f64 * density).sqrt() * self.scale).round();

        let raw = if raw.is_finite() && raw >= 1.0 {
            raw.min(usize::MAX as f64) as usize
        } else {
            lower
        };

        raw.clamp(lower, upper)
    }
}

fn bounding_box_area(points: &[Point2D]) -> f64 {
    let (min_x, max_x, min_y, max_y) = points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(min_x, max_x, min_y, max_y), p| {
            (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y))
        },
    );
    (max_x - min_x) * (max_y - min_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundary_between_five_and_six() {
        let tiers = DensityTiers::default();
        let small = tiers.select(5);
        let medium = tiers.select(6);

        assert_eq!(small, DensityParams { epsilon: 0.25, min_pts: 2 });
        assert_eq!(medium, DensityParams { epsilon: 0.2, min_pts: 3 });
        assert_ne!(small, medium);
    }

    #[test]
    fn test_large_tier_tightens() {
        let tiers = DensityTiers::default();
        assert_eq!(tiers.select(15), DensityParams { epsilon: 0.2, min_pts: 3 });
        assert_eq!(tiers.select(16), DensityParams { epsilon: 0.15, min_pts: 5 });
        assert_eq!(tiers.select(10_000), DensityParams { epsilon: 0.15, min_pts: 5 });
    }

    #[test]
    fn test_bounded_last_tier_still_covers_large_n() {
        let tiers = DensityTiers(vec![DensityTier {
            max_points: Some(3),
            epsilon: 0.5,
            min_pts: 2,
        }]);
        assert_eq!(tiers.select(50).epsilon, 0.5);
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        assert!(DensityTiers(vec![]).validate().is_err());
        assert!(DensityTiers::default().validate().is_ok());

        let unordered = DensityTiers(vec![
            DensityTier { max_points: Some(10), epsilon: 0.2, min_pts: 3 },
            DensityTier { max_points: Some(5), epsilon: 0.2, min_pts: 3 },
        ]);
        assert!(unordered.validate().is_err());
    }

    #[test]
    fn test_adaptive_k_dense_blob_hits_upper_bound() {
        let points: Vec<Point2D> = (0..40)
            .map(|i| Point2D::new((i % 7) as f64 * 0.001, (i / 7) as f64 * 0.001))
            .collect();
        let k = AdaptiveK::default().compute(&points, points.len());
        assert_eq!(k, 20);
    }

    #[test]
    fn test_adaptive_k_sparse_cloud_hits_lower_bound() {
        let points: Vec<Point2D> = (0..10)
            .map(|i| Point2D::new(i as f64 * 100.0, (i * i) as f64 * 100.0))
            .collect();
        let k = AdaptiveK::default().compute(&points, points.len());
        assert_eq!(k, 2);
    }

    #[test]
    fn test_adaptive_k_never_exceeds_half() {
        let policy = AdaptiveK { max_ratio: 0.9, ..Default::default() };
        let points = vec![Point2D::default(); 9];
        assert_eq!(policy.compute(&points, 9), 4);
    }

    #[test]
    fn test_adaptive_k_tiny_inputs() {
        let policy = AdaptiveK::default();
        assert_eq!(policy.compute(&[Point2D::default()], 1), 1);
        assert_eq!(policy.compute(&[Point2D::default(); 3], 3), 1);
        assert_eq!(policy.compute(&[Point2D::default(); 4], 4), 2);
    }
}
