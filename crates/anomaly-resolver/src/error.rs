//! Error types for anomaly field resolution.

use sst_common::{BoundingBox, FieldShapeError};
use thiserror::Error;

/// Errors that can occur while resolving an anomaly field.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The provider could not be reached or returned an unusable payload.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// The bounding box contains no grid cells.
    #[error("no grid cells inside {bbox}")]
    EmptyRegion { bbox: BoundingBox },

    /// Coordinate axes could not be normalized.
    #[error("malformed coordinates: {0}")]
    MalformedCoordinates(String),
}

impl ResolverError {
    /// Create a DataUnavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::DataUnavailable(msg.into())
    }

    /// Create a MalformedCoordinates error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedCoordinates(msg.into())
    }

    /// True for failures the caller may paper over with an illustrative field.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable(_))
    }
}

impl From<reqwest::Error> for ResolverError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::DataUnavailable(format!("request timed out: {}", err))
        } else {
            Self::DataUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ResolverError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataUnavailable(format!("invalid grid payload: {}", err))
    }
}

impl From<csv::Error> for ResolverError {
    fn from(err: csv::Error) -> Self {
        Self::DataUnavailable(format!("invalid table payload: {}", err))
    }
}

impl From<FieldShapeError> for ResolverError {
    fn from(err: FieldShapeError) -> Self {
        Self::MalformedCoordinates(err.to_string())
    }
}

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolverError>;
