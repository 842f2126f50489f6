//! Layout response types
//!
//! The JSON shape is consumed by the existing front end:
//! `{ points: [{text, x, y, cluster}], clusters: [{id, cx, cy, radius, name}] }`.

use serde::{Deserialize, Serialize};

use crate::layout::{ClusterSummary, Partition, Point2D};

/// One input text with its projected position and cluster (`-1` = unclustered)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledPoint {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub cluster: i64,
}

/// Point cloud and cluster summaries for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutResponse {
    pub points: Vec<LabeledPoint>,
    pub clusters: Vec<ClusterSummary>,
}

impl LayoutResponse {
    /// Assemble the response; `texts`, `points` and the partition indices
    /// must be aligned.
    pub fn assemble(
        texts: &[String],
        points: &[Point2D],
        partition: &Partition,
        clusters: Vec<ClusterSummary>,
    ) -> Self {
        let labels = partition.labels(points.len());
        let points = texts
            .iter()
            .zip(points)
            .zip(labels)
            .map(|((text, point), cluster)| LabeledPoint {
                text: text.clone(),
                x: point.x,
                y: point.y,
                cluster,
            })
            .collect();

        Self { points, clusters }
    }
}
