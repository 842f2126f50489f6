use thiserror::Error;

/// Contract violations in projection and clustering.
///
/// These indicate a caller bug or malformed collaborator output, never a
/// property of well-formed data.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    /// No points or vectors were supplied.
    #[error("empty input")]
    EmptyInput,

    /// Vectors in a batch have inconsistent dimensionality.
    #[error("dimension mismatch at vector {index}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Offending vector index.
        index: usize,
        /// Dimensionality of the first vector.
        expected: usize,
        /// Dimensionality of the offending vector.
        found: usize,
    },

    /// A vector or point contains NaN or infinity.
    #[error("non-finite value at index {0}")]
    NonFinite(usize),

    /// Invalid clustering parameter.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// A partition broke its invariants.
    #[error("invalid partition: {0}")]
    InvalidPartition(String),
}

/// Result type used by the layout core.
pub type LayoutResult<T> = std::result::Result<T, LayoutError>;
