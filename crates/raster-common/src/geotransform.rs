//! Affine mapping between pixel space and projected space.

use serde::{Deserialize, Serialize};

use crate::{Area, Coordinate, RasterError, Unit};

/// North-up geotransform in the usual six-coefficient layout:
/// `x = c[0] + col * c[1] + row * c[2]`, `y = c[3] + col * c[4] + row * c[5]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// Square pixels of `pixel_size` with the raster's upper-left corner at
    /// (`ul_x`, `ul_y`).
    pub fn north_up(ul_x: f64, ul_y: f64, pixel_size: f64) -> Self {
        Self([ul_x, pixel_size, 0.0, ul_y, 0.0, -pixel_size])
    }

    pub fn ul_x(&self) -> f64 {
        self.0[0]
    }

    pub fn ul_y(&self) -> f64 {
        self.0[3]
    }

    /// Pixel width. Only square, unrotated pixels are supported downstream.
    pub fn pixel_size(&self) -> f64 {
        self.0[1]
    }

    /// Fails unless the transform is unrotated with square pixels.
    pub fn validate_north_up(&self) -> Result<(), RasterError> {
        let [_, sx, rx, _, ry, sy] = self.0;
        if rx != 0.0 || ry != 0.0 {
            return Err(RasterError::InvalidGeoTransform(
                "rotated rasters are not supported".to_string(),
            ));
        }
        if sx <= 0.0 || (sx + sy).abs() > sx * 1e-9 {
            return Err(RasterError::InvalidGeoTransform(format!(
                "pixels must be square and north-up (got {} x {})",
                sx, sy
            )));
        }
        Ok(())
    }

    /// Projected coordinate of the upper-left corner of a pixel.
    pub fn pixel_to_projected(&self, column: f64, row: f64, unit: Unit) -> Coordinate {
        Coordinate::new(
            self.0[0] + column * self.0[1] + row * self.0[2],
            self.0[3] + column * self.0[4] + row * self.0[5],
            unit,
        )
    }

    /// Fractional pixel position of a projected coordinate.
    pub fn projected_to_pixel(&self, coord: &Coordinate) -> Coordinate {
        let column = (coord.x - self.0[0]) / self.0[1];
        let row = (coord.y - self.0[3]) / self.0[5];
        Coordinate::pixel(column, row)
    }

    /// Projected extent of a pixel area, from the UL corner of its first
    /// pixel to the LR corner of its last pixel.
    pub fn area_to_projected(&self, area: &Area, unit: Unit) -> Area {
        let ul = self.pixel_to_projected(area.ul.x, area.ul.y, unit);
        let lr = self.pixel_to_projected(area.lr.x + 1.0, area.lr.y + 1.0, unit);
        Area::new(ul, lr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_north_up_mapping() {
        let gt = GeoTransform::north_up(-1000.0, 500.0, 10.0);
        let c = gt.pixel_to_projected(3.0, 2.0, Unit::Meter);
        assert_eq!(c.x, -970.0);
        assert_eq!(c.y, 480.0);

        let back = gt.projected_to_pixel(&c);
        assert_eq!(back.x, 3.0);
        assert_eq!(back.y, 2.0);
    }

    #[test]
    fn test_validate_rejects_rotation() {
        let gt = GeoTransform([0.0, 1.0, 0.5, 0.0, 0.0, -1.0]);
        assert!(gt.validate_north_up().is_err());
        assert!(GeoTransform::north_up(0.0, 0.0, 2.0).validate_north_up().is_ok());
    }

    #[test]
    fn test_area_to_projected_covers_whole_pixels() {
        let gt = GeoTransform::north_up(0.0, 100.0, 10.0);
        let extent = gt.area_to_projected(&Area::pixels(0, 0, 1, 1), Unit::Meter);
        assert_eq!(extent.lr.x, 20.0);
        assert_eq!(extent.lr.y, 80.0);
    }
}
