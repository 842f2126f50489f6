use super::error::LayoutResult;
use super::types::{Partition, Point2D};

/// Common interface for the clustering strategies over projected points.
pub trait Clusterer {
    /// Partition `points`; indices left out of every cluster are noise.
    fn cluster(&self, points: &[Point2D]) -> LayoutResult<Partition>;

    /// Strategy name for logging.
    fn name(&self) -> &'static str;
}
