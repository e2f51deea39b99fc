//! Error types for reprojection.

use projection::ProjectionError;
use raster_common::{PixelType, RasterError};
use thiserror::Error;

/// Errors that can occur while planning or running a reprojection.
#[derive(Error, Debug)]
pub enum ReprojectError {
    /// Invalid configuration or request (bad sizes, unknown names).
    #[error("configuration error: {0}")]
    Config(String),

    /// A projection could not be built.
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Source and destination chunks hold different sample types.
    #[error("pixel type mismatch: source {source_type}, destination {destination_type}")]
    PixelTypeMismatch {
        source_type: PixelType,
        destination_type: PixelType,
    },

    /// A partition request that cannot be satisfied.
    #[error("partition error: {0}")]
    Partition(String),

    /// A collective operation failed or the group was aborted.
    #[error("coordination error: {0}")]
    Coordination(#[from] CoordinationError),

    /// Raster geometry error.
    #[error("raster error: {0}")]
    Raster(#[from] RasterError),
}

impl ReprojectError {
    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a Partition error.
    pub fn partition(msg: impl Into<String>) -> Self {
        Self::Partition(msg.into())
    }
}

/// Failures of the process-group collectives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinationError {
    /// Some rank aborted the group.
    #[error("process group aborted: {0}")]
    Aborted(String),

    /// A rank outside `0..size` was named.
    #[error("invalid rank {rank} for a group of {size}")]
    InvalidRank { rank: usize, size: usize },

    /// Payload could not be encoded or decoded.
    #[error("payload error: {0}")]
    Payload(String),
}

impl From<serde_json::Error> for CoordinationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err.to_string())
    }
}

/// Result type for reprojection operations.
pub type Result<T> = std::result::Result<T, ReprojectError>;
