//! Simple parallel tiff writer
//!
//! Output rasters are GeoTIFFs holding a single uncompressed strip with
//! interleaved bands. One process creates the file; every process then
//! opens its own [`PTiff`] and writes its partitions at computed byte
//! offsets, with no locking and no communication.
//!
//! # Architecture
//!
//! ```text
//! rank 0: create_raster(path, description, projection)
//!      │
//!      ▼  (barrier)
//! every rank: open_raster(path) ─► PTiff
//!      │
//!      ├─► write_raster_chunk(chunk)
//!      │         │
//!      │         └─► area_byte_ranges(area) ─► seek + write per range
//!      │
//!      └─► close_raster() (sync_data)
//! ```
//!
//! [`RasterDataset`] is the read side: it opens any GeoTIFF the `tiff`
//! crate decodes and hands out [`reproject::RasterChunk`]s.

pub mod create;
pub mod dataset;
pub mod error;
pub mod geotiff;
pub mod ptiff;

pub use create::{create_raster, needs_bigtiff, RasterDescription};
pub use dataset::RasterDataset;
pub use error::{Result, SptwError};
pub use ptiff::{close_raster, open_raster, PTiff, StripLayout};
