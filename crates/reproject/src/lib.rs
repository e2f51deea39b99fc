//! Parallel raster reprojection core
//!
//! This crate holds everything a reprojecting process needs except file
//! I/O: output geometry planning, partitioning of the output raster, the
//! pixel-to-pixel coordinate mapping and the per-chunk resampling loop.
//!
//! # Architecture
//!
//! ```text
//! Input raster (geotransform, projection)
//!      │
//!      ▼
//! projected_minbox()  ─► output_geometry()
//!      │
//!      ▼
//! partition()  ─► assign_partitions(rank, size)
//!      │
//!      └─► for each destination partition
//!               │
//!               ├─► raster_minbox(): source pixels it needs
//!               │
//!               ├─► read source RasterChunk
//!               │
//!               ├─► reproject_chunk()
//!               │         │
//!               │         └─► RasterCoordTransformer + Resampler per pixel
//!               │
//!               └─► write destination RasterChunk
//! ```
//!
//! Collective steps between processes go through a [`Coordinator`].
//!
//! # Example
//!
//! ```ignore
//! use reproject::{reproject_chunk, RasterChunk, Resampler};
//!
//! let mut destination = RasterChunk::empty(&area, &output_gt, pixel_type, 1, output_projection);
//! let stats = reproject_chunk(&source, &mut destination, 0.0, Resampler::Nearest)?;
//! ```

pub mod chunk;
pub mod config;
pub mod coordination;
pub mod error;
pub mod minbox;
pub mod partition;
pub mod raster_coord;
pub mod reproject;
pub mod resampler;

// Re-export commonly used types at crate root
pub use chunk::{PixelBuffer, RasterChunk};
pub use config::{PartitionStrategy, ReprojectConfig};
pub use coordination::{broadcast_value, gather_values, Coordinator, CoordinationResult, LocalCoordinator};
pub use error::{CoordinationError, ReprojectError, Result};
pub use minbox::{
    default_pixel_size, output_geometry, projected_minbox, raster_minbox, OutputGeometry, RasterGrid,
};
pub use partition::{
    assign_partitions, partition, partition_by_count, partition_by_quadtree, partition_by_size,
    partition_by_tile, QuadTree, SubSpaceInfo,
};
pub use raster_coord::RasterCoordTransformer;
pub use reproject::{reproject_chunk, ReprojectStats};
pub use resampler::{Resampler, Sample};
