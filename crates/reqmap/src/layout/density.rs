//! DBSCAN over 2D points.
//!
//! A point with at least `min_pts` points (itself included) strictly closer
//! than `epsilon` is a core point. Clusters are the sets of points density-reachable from a
//! core point; everything else is noise and stays out of the partition.
//! Coincident points are ordinary neighbors at distance zero.

use super::error::{LayoutError, LayoutResult};
use super::params::DensityParams;
use super::traits::Clusterer;
use super::types::{Partition, Point2D};

// - UNCLASSIFIED: never assigned yet
// - NOISE: visited, not density-reachable so far (may become a border point)
const UNCLASSIFIED: i64 = -2;
const NOISE: i64 = -1;

/// DBSCAN clustering algorithm.
#[derive(Debug, Clone)]
pub struct Dbscan {
    epsilon: f64,
    min_pts: usize,
}

impl Dbscan {
    pub fn new(epsilon: f64, min_pts: usize) -> Self {
        Self { epsilon, min_pts }
    }

    pub fn from_params(params: DensityParams) -> Self {
        Self::new(params.epsilon, params.min_pts)
    }

    /// All other points strictly closer than epsilon to `idx`.
    fn region_query(&self, points: &[Point2D], idx: usize) -> Vec<usize> {
        let eps_sq = self.epsilon * self.epsilon;
        let p = &points[idx];
        points
            .iter()
            .enumerate()
            .filter(|(other_idx, other)| *other_idx != idx && p.distance_sq(other) < eps_sq)
            .map(|(other_idx, _)| other_idx)
            .collect()
    }

    fn is_core(&self, neighbor_count: usize) -> bool {
        neighbor_count + 1 >= self.min_pts
    }

    fn expand_cluster(
        &self,
        points: &[Point2D],
        seed: usize,
        neighbors: Vec<usize>,
        labels: &mut [i64],
        visited: &mut [bool],
        cluster_id: i64,
    ) {
        labels[seed] = cluster_id;

        // Work queue instead of recursion.
        let mut queue = neighbors;

        while let Some(idx) = queue.pop() {
            // Label before the visited check so earlier noise can be promoted.
            if labels[idx] == UNCLASSIFIED || labels[idx] == NOISE {
                labels[idx] = cluster_id;
            }

            if visited[idx] {
                continue;
            }
            visited[idx] = true;

            let next = self.region_query(points, idx);
            if self.is_core(next.len()) {
                queue.extend(next.into_iter().filter(|&n| !visited[n]));
            }
        }
    }
}

impl Clusterer for Dbscan {
    fn cluster(&self, points: &[Point2D]) -> LayoutResult<Partition> {
        let n = points.len();
        if n == 0 {
            return Err(LayoutError::EmptyInput);
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(LayoutError::InvalidParameter {
                name: "epsilon",
                message: "must be positive and finite",
            });
        }
        if self.min_pts == 0 {
            return Err(LayoutError::InvalidParameter {
                name: "min_pts",
                message: "must be at least 1",
            });
        }
        if let Some(idx) = points.iter().position(|p| !p.is_finite()) {
            return Err(LayoutError::NonFinite(idx));
        }

        let mut labels = vec![UNCLASSIFIED; n];
        let mut visited = vec![false; n];
        let mut cluster_id: i64 = 0;

        for idx in 0..n {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;

            let neighbors = self.region_query(points, idx);
            if !self.is_core(neighbors.len()) {
                if labels[idx] == UNCLASSIFIED {
                    labels[idx] = NOISE;
                }
                continue;
            }

            self.expand_cluster(points, idx, neighbors, &mut labels, &mut visited, cluster_id);
            cluster_id += 1;
        }

        let labels: Vec<Option<usize>> = labels
            .into_iter()
            .map(|l| if l >= 0 { Some(l as usize) } else { None })
            .collect();

        Ok(Partition::from_labels(&labels))
    }

    fn name(&self) -> &'static str {
        "dbscan"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(cx: f64, cy: f64, count: usize) -> Vec<Point2D> {
        (0..count)
            .map(|i| Point2D::new(cx + (i % 2) as f64 * 0.01, cy + (i / 2) as f64 * 0.01))
            .collect()
    }

    #[test]
    fn test_two_blobs_and_noise() {
        let mut points = blob(0.0, 0.0, 4);
        points.extend(blob(5.0, 5.0, 4));
        points.push(Point2D::new(-9.0, 9.0));

        let partition = Dbscan::new(0.2, 3).cluster(&points).unwrap();

        assert_eq!(partition.len(), 2);
        assert_eq!(partition.members(0).map(<[usize]>::len), Some(4));
        assert_eq!(partition.members(1).map(<[usize]>::len), Some(4));
        assert_eq!(partition.cluster_of(8), None);
        partition.validate(points.len()).unwrap();
    }

    #[test]
    fn test_all_noise_yields_empty_partition() {
        let points = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(0.0, 10.0),
        ];
        let partition = Dbscan::new(0.5, 2).cluster(&points).unwrap();
        assert!(partition.is_empty());
    }

    #[test]
    fn test_coincident_points_form_one_cluster() {
        let points = vec![Point2D::new(1.0, 1.0); 6];
        let partition = Dbscan::new(0.1, 3).cluster(&points).unwrap();
        assert_eq!(partition.len(), 1);
        assert_eq!(partition.clustered_count(), 6);
    }

    #[test]
    fn test_border_point_promoted_from_noise() {
        // Index 0 is visited first and is not core, but lies within reach of
        // the core point at index 1.
        let points = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(0.15, 0.0),
            Point2D::new(0.25, 0.0),
            Point2D::new(0.3, 0.0),
        ];
        let partition = Dbscan::new(0.16, 3).cluster(&points).unwrap();
        assert_eq!(partition.cluster_of(0), Some(0));
        assert_eq!(partition.clustered_count(), 4);
    }

    #[test]
    fn test_points_exactly_epsilon_apart_are_not_neighbors() {
        let points = vec![Point2D::new(0.0, 0.0), Point2D::new(0.5, 0.0)];
        assert!(Dbscan::new(0.5, 2).cluster(&points).unwrap().is_empty());

        let partition = Dbscan::new(0.5000001, 2).cluster(&points).unwrap();
        assert_eq!(partition.clustered_count(), 2);
    }

    #[test]
    fn test_invalid_parameters() {
        let points = vec![Point2D::default()];
        assert!(Dbscan::new(0.0, 3).cluster(&points).is_err());
        assert!(Dbscan::new(0.2, 0).cluster(&points).is_err());
        assert_eq!(Dbscan::new(0.2, 3).cluster(&[]), Err(LayoutError::EmptyInput));
    }
}
