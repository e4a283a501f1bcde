//! Error types for grid construction and aggregation.

use thiserror::Error;

/// Errors that can occur while building or populating a grid.
#[derive(Error, Debug)]
pub enum RegridError {
    /// Invalid horizontal lattice definition.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// Invalid vertical coordinate definition.
    #[error("invalid vertical grid: {0}")]
    InvalidVertical(String),

    /// Subset range outside the source grid.
    #[error("invalid subset: {0}")]
    InvalidSubset(String),

    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// Mismatched or missing input arrays.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A vertical operation was requested on a 2D grid.
    #[error("grid has no vertical layers")]
    NotVertical,

    /// The lattice or its buffers could not be allocated.
    #[error("failed to allocate {count} {what}")]
    Allocation { what: &'static str, count: usize },

    /// Projector construction failed.
    #[error("projection error: {0}")]
    Projection(#[from] projection::ProjectionError),
}

impl RegridError {
    /// Create an InvalidGrid error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    /// Create an InvalidVertical error.
    pub fn invalid_vertical(msg: impl Into<String>) -> Self {
        Self::InvalidVertical(msg.into())
    }

    /// Create an InvalidSubset error.
    pub fn invalid_subset(msg: impl Into<String>) -> Self {
        Self::InvalidSubset(msg.into())
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Result type for regridding operations.
pub type Result<T> = std::result::Result<T, RegridError>;

/// Allocate `len` copies of `value`, reporting failure instead of aborting.
pub(crate) fn try_filled<T: Clone>(len: usize, value: T, what: &'static str) -> Result<Vec<T>> {
    let mut buffer = Vec::new();

    if buffer.try_reserve_exact(len).is_err() {
        tracing::error!(what, count = len, "allocation failed");
        return Err(RegridError::Allocation { what, count: len });
    }

    buffer.resize(len, value);
    Ok(buffer)
}
