//! K-means (Lloyd's algorithm) over 2D points with k-means++ seeding.
//!
//! Used as the fallback when density clustering degenerates, so it must
//! always return a usable partition: every point is assigned, and clusters
//! that end up empty are dropped rather than reported.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::error::{LayoutError, LayoutResult};
use super::traits::Clusterer;
use super::types::{Partition, Point2D};

/// Iteration and seeding settings for k-means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansOptions {
    pub max_iterations: usize,
    /// Fixed RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for KMeansOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            seed: None,
        }
    }
}

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    max_iterations: usize,
    seed: Option<u64>,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: KMeansOptions::default().max_iterations,
            seed: None,
        }
    }

    pub fn from_options(k: usize, options: &KMeansOptions) -> Self {
        Self {
            k,
            max_iterations: options.max_iterations,
            seed: options.seed,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// k-means++: each new centroid is drawn with probability proportional to
/// its squared distance from the nearest centroid chosen so far.
fn seed_centroids(points: &[Point2D], k: usize, rng: &mut StdRng) -> Vec<Point2D> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..n)]);

    let mut nearest_sq: Vec<f64> = points.iter().map(|p| p.distance_sq(&centroids[0])).collect();

    while centroids.len() < k {
        let total: f64 = nearest_sq.iter().sum();

        let next = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut chosen = None;
            for (i, &d) in nearest_sq.iter().enumerate() {
                if d <= 0.0 {
                    continue;
                }
                cumulative += d;
                chosen = Some(i);
                if cumulative > target {
                    break;
                }
            }
            chosen.unwrap_or_else(|| rng.gen_range(0..n))
        } else {
            // Every point coincides with a centroid already.
            rng.gen_range(0..n)
        };

        let centroid = points[next];
        for (d, p) in nearest_sq.iter_mut().zip(points) {
            *d = d.min(p.distance_sq(&centroid));
        }
        centroids.push(centroid);
    }

    centroids
}

fn nearest_centroid(point: &Point2D, centroids: &[Point2D]) -> usize {
    centroids
        .iter()
        .enumerate()
        .map(|(c, centroid)| (c, point.distance_sq(centroid)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c)
        .unwrap_or(0)
}

impl Clusterer for KMeans {
    fn cluster(&self, points: &[Point2D]) -> LayoutResult<Partition> {
        let n = points.len();
        if n == 0 {
            return Err(LayoutError::EmptyInput);
        }
        if self.k == 0 {
            return Err(LayoutError::InvalidParameter {
                name: "k",
                message: "must be at least 1",
            });
        }
        if let Some(idx) = points.iter().position(|p| !p.is_finite()) {
            return Err(LayoutError::NonFinite(idx));
        }

        let k = self.k.min(n);
        let mut rng = self.rng();
        let mut centroids = seed_centroids(points, k, &mut rng);
        let mut assignments = vec![usize::MAX; n];
        let mut iterations = 0;

        for _ in 0..self.max_iterations.max(1) {
            iterations += 1;

            let mut changed = false;
            for (i, point) in points.iter().enumerate() {
                let best = nearest_centroid(point, &centroids);
                if assignments[i] != best {
                    assignments[i] = best;
                    changed = true;
                }
            }

            let mut sums = vec![(0.0, 0.0); k];
            let mut counts = vec![0usize; k];
            for (point, &c) in points.iter().zip(&assignments) {
                sums[c].0 += point.x;
                sums[c].1 += point.y;
                counts[c] += 1;
            }

            let mut taken: Vec<usize> = Vec::new();
            for c in 0..k {
                if counts[c] > 0 {
                    let count = counts[c] as f64;
                    centroids[c] = Point2D::new(sums[c].0 / count, sums[c].1 / count);
                    continue;
                }

                // Reseed an empty cluster at the point worst served by its
                // centroid, taken from a cluster that can spare it.
                let donor = points
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| counts[assignments[*i]] > 1 && !taken.contains(i))
                    .map(|(i, p)| (i, p.distance_sq(&centroids[assignments[i]])))
                    .filter(|(_, d)| *d > 0.0)
                    .max_by(|a, b| a.1.total_cmp(&b.1));

                if let Some((i, _)) = donor {
                    centroids[c] = points[i];
                    taken.push(i);
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        let labels: Vec<Option<usize>> = assignments.into_iter().map(Some).collect();
        let partition = Partition::from_labels(&labels);

        tracing::debug!(
            "k-means finished after {} iterations: {} of {} clusters non-empty",
            iterations,
            partition.len(),
            k
        );

        Ok(partition)
    }

    fn name(&self) -> &'static str {
        "kmeans"
    }
}
