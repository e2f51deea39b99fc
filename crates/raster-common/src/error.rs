//! Error types for raster geometry.

use thiserror::Error;

/// Result type alias using RasterError.
pub type RasterResult<T> = Result<T, RasterError>;

/// Errors raised while building or converting raster geometry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RasterError {
    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    #[error("Unsupported pixel type: {0}")]
    UnsupportedPixelType(String),

    #[error("Invalid geotransform: {0}")]
    InvalidGeoTransform(String),

    #[error("Invalid area: {0}")]
    InvalidArea(String),
}
