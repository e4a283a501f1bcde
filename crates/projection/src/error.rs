//! Error types for projector construction.

use thiserror::Error;

/// Errors that can occur while building a projector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// The reference ellipsoid is not usable.
    #[error("invalid ellipsoid: {0}")]
    InvalidEllipsoid(String),

    /// A projection parameter is out of range.
    #[error("invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    /// The textual projection specification could not be parsed.
    #[error("cannot parse projection '{0}'")]
    Parse(String),
}

impl ProjectionError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
