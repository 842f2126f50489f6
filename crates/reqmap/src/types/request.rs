//! Layout request types

use serde::{Deserialize, Serialize};

/// Body of `POST /embed`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutRequest {
    /// Requirement texts, in display order
    #[serde(default)]
    pub requirements: Vec<String>,
}
