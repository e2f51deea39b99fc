//! Destination pixel to source pixel mapping.

use std::sync::Arc;

use projection::{ProjResult, Projection};
use raster_common::{Area, Coordinate};

use crate::chunk::RasterChunk;

/// Largest disagreement, in destination units, between a projected point
/// and its inverse-then-forward image before the point is treated as
/// outside the destination projection's domain.
pub const ROUND_TRIP_TOLERANCE: f64 = 0.01;

/// Maps pixels of a destination raster to the footprint they cover in a
/// source raster.
///
/// Both rasters are described by their projection, the projected
/// coordinate of their upper-left corner and a square pixel size. Source
/// pixel positions are fractional and relative to `source_ul`.
#[derive(Debug, Clone)]
pub struct RasterCoordTransformer {
    destination: Arc<Projection>,
    destination_ul: Coordinate,
    destination_pixel_size: f64,
    source: Arc<Projection>,
    source_ul: Coordinate,
    source_pixel_size: f64,
}

impl RasterCoordTransformer {
    pub fn new(
        destination: Arc<Projection>,
        destination_ul: Coordinate,
        destination_pixel_size: f64,
        source: Arc<Projection>,
        source_ul: Coordinate,
        source_pixel_size: f64,
    ) -> Self {
        Self {
            destination,
            destination_ul,
            destination_pixel_size,
            source,
            source_ul,
            source_pixel_size,
        }
    }

    /// Transformer from the pixels of `destination` into the pixels of
    /// `source`, both relative to the chunks' own upper-left corners.
    pub fn for_chunks(destination: &RasterChunk, source: &RasterChunk) -> Self {
        Self::new(
            Arc::clone(&destination.projection),
            destination.ul_projected_corner,
            destination.pixel_size,
            Arc::clone(&source.projection),
            source.ul_projected_corner,
            source.pixel_size,
        )
    }

    /// Source footprint of the destination pixel at (`pixel.x`, `pixel.y`).
    ///
    /// `ul` is the image of the pixel's upper-left corner and `lr` the image
    /// of the point half a pixel right and down from it. Returns
    /// [`Area::invalid`] when the pixel falls outside the destination
    /// projection's domain or any projection step fails hard.
    pub fn transform(&self, pixel: Coordinate) -> Area {
        let ps = self.destination_pixel_size;
        let x = self.destination_ul.x + pixel.x * ps;
        let y = self.destination_ul.y - pixel.y * ps;

        if !self.round_trips(x, y) {
            return Area::invalid();
        }

        let ul = self.to_source_pixel(x, y);
        let lr = self.to_source_pixel(x + ps / 2.0, y - ps / 2.0);
        match (ul, lr) {
            (Some(ul), Some(lr)) => Area::new(ul, lr),
            _ => Area::invalid(),
        }
    }

    fn round_trips(&self, x: f64, y: f64) -> bool {
        let Some((lon, lat)) = usable(self.destination.inverse(x, y)) else {
            return false;
        };
        let Some((x2, y2)) = usable(self.destination.forward(lon, lat)) else {
            return false;
        };
        (x - x2).abs() <= ROUND_TRIP_TOLERANCE && (y - y2).abs() <= ROUND_TRIP_TOLERANCE
    }

    fn to_source_pixel(&self, x: f64, y: f64) -> Option<Coordinate> {
        let (lon, lat) = usable(self.destination.inverse(x, y))?;
        let (sx, sy) = usable(self.source.forward(lon, lat))?;
        let column = (sx - self.source_ul.x) / self.source_pixel_size;
        let row = (self.source_ul.y - sy) / self.source_pixel_size;
        (column.is_finite() && row.is_finite()).then(|| Coordinate::pixel(column, row))
    }
}

/// The computed point of a success or a soft error.
fn usable(result: ProjResult<(f64, f64)>) -> Option<(f64, f64)> {
    match result {
        Ok(point) => Some(point),
        Err(err) => err.usable_point(),
    }
}
