//! Common types shared by the projection, reprojection and raster I/O crates.
//!
//! Everything here is plain geometry: coordinates tagged with their unit,
//! inclusive pixel/projected rectangles, pixel sample types and the affine
//! geotransform that ties pixel space to projected space.

pub mod area;
pub mod coordinate;
pub mod error;
pub mod geotransform;
pub mod pixel;

pub use area::Area;
pub use coordinate::{Coordinate, Unit};
pub use error::{RasterError, RasterResult};
pub use geotransform::GeoTransform;
pub use pixel::PixelType;
