//! reqmap: semantic maps of requirement texts
//!
//! Requirement strings are embedded by an external provider, projected to two
//! dimensions with PCA, grouped by adaptive DBSCAN (falling back to k-means
//! when density clustering degenerates) and named by a text-generation
//! provider. The result is a point cloud plus per-cluster summaries for the
//! front end.

pub mod config;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod providers;
pub mod server;
pub mod types;

pub use config::ReqmapConfig;
pub use error::{Error, Result};
pub use layout::{ClusterSummary, Layout, LayoutPolicy, Partition, Point2D};
pub use pipeline::LayoutPipeline;
pub use types::{LabeledPoint, LayoutRequest, LayoutResponse};
