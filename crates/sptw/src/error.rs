//! Error types for GeoTIFF creation, writing and reading.

use std::path::PathBuf;

use raster_common::RasterError;
use reproject::ReprojectError;
use thiserror::Error;

/// Errors that can occur while creating, writing or reading a raster.
#[derive(Error, Debug)]
pub enum SptwError {
    /// The output file could not be created.
    #[error("failed to create {}: {reason}", path.display())]
    CreateError { path: PathBuf, reason: String },

    /// A positioned write failed.
    #[error("write of {len} bytes at offset {offset} failed: {source}")]
    WriteError {
        offset: u64,
        len: usize,
        #[source]
        source: std::io::Error,
    },

    /// Out-of-range rows or columns, or a buffer too short for the request.
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// The file is not laid out for positioned access.
    #[error("unsupported raster layout: {0}")]
    Layout(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("raster error: {0}")]
    Raster(#[from] RasterError),

    #[error("chunk error: {0}")]
    Chunk(#[from] ReprojectError),
}

impl SptwError {
    /// Create a BadArgument error.
    pub fn bad_argument(msg: impl Into<String>) -> Self {
        Self::BadArgument(msg.into())
    }

    /// Create a Layout error.
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }
}

/// Result type for raster I/O.
pub type Result<T> = std::result::Result<T, SptwError>;
