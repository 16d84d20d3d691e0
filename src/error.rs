//! Error types for forest construction and search.

use std::fmt;

use thiserror::Error;

/// Which input set a vector came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorSource {
    Training,
    Query,
}

impl fmt::Display for VectorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorSource::Training => write!(f, "training"),
            VectorSource::Query => write!(f, "query"),
        }
    }
}

/// Errors that can occur while building or querying a forest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForestError {
    /// A vector's word count differs from the first training vector's.
    #[error("dimension mismatch: {set} vector {index} has {got} words, expected {expected}")]
    DimensionMismatch {
        set: VectorSource,
        index: usize,
        expected: usize,
        got: usize,
    },

    /// A search or build parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A flat word buffer does not divide into whole vectors.
    #[error("buffer of {len} words is not a multiple of feature dimension {feat_dim}")]
    RaggedBuffer { len: usize, feat_dim: usize },
}

pub type Result<T> = std::result::Result<T, ForestError>;
