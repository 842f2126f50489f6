//! Value types shared by the projection and clustering stages.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::error::{LayoutError, LayoutResult};

/// Wire value of `cluster` for points that belong to no cluster.
pub const UNCLUSTERED: i64 = -1;

/// A projected point, index-aligned with the input texts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[inline]
    pub(crate) fn distance_sq(&self, other: &Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Cluster id -> member indices into the point sequence.
///
/// Indices absent from every cluster are noise. Empty clusters are never
/// stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    clusters: BTreeMap<usize, Vec<usize>>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a partition from one label per point (`None` = noise).
    pub fn from_labels(labels: &[Option<usize>]) -> Self {
        let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (idx, label) in labels.iter().enumerate() {
            if let Some(id) = label {
                clusters.entry(*id).or_default().push(idx);
            }
        }
        Self { clusters }
    }

    /// Insert a cluster. Empty member lists are dropped.
    pub fn insert(&mut self, id: usize, members: Vec<usize>) {
        if members.is_empty() {
            self.clusters.remove(&id);
        } else {
            self.clusters.insert(id, members);
        }
    }

    /// Number of (non-empty) clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Iterate clusters in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.clusters.iter().map(|(id, m)| (*id, m.as_slice()))
    }

    pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.clusters.keys().copied()
    }

    pub fn members(&self, id: usize) -> Option<&[usize]> {
        self.clusters.get(&id).map(Vec::as_slice)
    }

    /// Total number of clustered points.
    pub fn clustered_count(&self) -> usize {
        self.clusters.values().map(Vec::len).sum()
    }

    /// Cluster containing `index`, if any.
    pub fn cluster_of(&self, index: usize) -> Option<usize> {
        self.clusters
            .iter()
            .find(|(_, members)| members.contains(&index))
            .map(|(id, _)| *id)
    }

    /// One wire label per point, `UNCLUSTERED` for noise.
    pub fn labels(&self, n: usize) -> Vec<i64> {
        let mut labels = vec![UNCLUSTERED; n];
        for (id, members) in &self.clusters {
            for &idx in members {
                if idx < n {
                    labels[idx] = *id as i64;
                }
            }
        }
        labels
    }

    /// Renumber cluster ids to `0..len`, keeping ascending id order.
    pub fn compact(self) -> Self {
        let clusters = self
            .clusters
            .into_values()
            .enumerate()
            .collect::<BTreeMap<_, _>>();
        Self { clusters }
    }

    /// Check disjointness, index bounds and non-emptiness against `n` points.
    pub fn validate(&self, n: usize) -> LayoutResult<()> {
        let mut seen = HashSet::with_capacity(n);
        for (id, members) in &self.clusters {
            if members.is_empty() {
                return Err(LayoutError::InvalidPartition(format!(
                    "cluster {} is empty",
                    id
                )));
            }
            for &idx in members {
                if idx >= n {
                    return Err(LayoutError::InvalidPartition(format!(
                        "cluster {} references index {} outside 0..{}",
                        id, idx, n
                    )));
                }
                if !seen.insert(idx) {
                    return Err(LayoutError::InvalidPartition(format!(
                        "index {} assigned to more than one cluster",
                        idx
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Geometry and display name of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub id: usize,
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub name: String,
}

impl ClusterSummary {
    /// Name used until (or instead of) a generated one.
    pub fn placeholder_name(id: usize) -> String {
        format!("Cluster {}", id)
    }
}

/// Centroid and radius for every cluster in `partition`, with placeholder names.
pub fn summarize(points: &[Point2D], partition: &Partition) -> Vec<ClusterSummary> {
    partition
        .iter()
        .map(|(id, members)| {
            let count = members.len() as f64;
            let (sx, sy) = members
                .iter()
                .fold((0.0, 0.0), |(sx, sy), &i| (sx + points[i].x, sy + points[i].y));
            let centroid = Point2D::new(sx / count, sy / count);
            let radius = members
                .iter()
                .map(|&i| points[i].distance(&centroid))
                .fold(0.0_f64, f64::max);

            ClusterSummary {
                id,
                cx: centroid.x,
                cy: centroid.y,
                radius,
                name: ClusterSummary::placeholder_name(id),
            }
        })
        .collect()
}
