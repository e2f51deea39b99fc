//! Extent computation: how big the output raster must be, and which part
//! of the input a block of output pixels needs.

use std::sync::Arc;

use projection::util::untfz;
use projection::{ProjResult, Projection, Transformer};
use raster_common::{Area, Coordinate, Unit};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ReprojectError, Result};
use crate::raster_coord::RasterCoordTransformer;

/// Width, in pixels, of the band walked along each border.
const BORDER_BAND: u64 = 2;

/// Metres per degree of arc on the WGS84 equator.
const METERS_PER_DEGREE: f64 = 6_378_137.0 * std::f64::consts::PI / 180.0;

/// Upper bound on geographic interpolation samples per border edge.
const MAX_EDGE_SAMPLES: u64 = 4096;

/// Georeferenced pixel grid of a whole raster.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    pub projection: Arc<Projection>,
    /// Projected coordinate of the upper-left corner of pixel (0, 0).
    pub ul: Coordinate,
    pub pixel_size: f64,
    pub row_count: u64,
    pub column_count: u64,
}

impl RasterGrid {
    /// The whole grid as a pixel area.
    pub fn area(&self) -> Area {
        Area::pixels(
            0,
            0,
            self.column_count.saturating_sub(1),
            self.row_count.saturating_sub(1),
        )
    }
}

/// Size and placement of an output raster, as agreed by every rank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputGeometry {
    pub ul_x: f64,
    pub ul_y: f64,
    pub pixel_size: f64,
    pub row_count: u64,
    pub column_count: u64,
}

impl OutputGeometry {
    pub fn ul(&self, unit: Unit) -> Coordinate {
        Coordinate::new(self.ul_x, self.ul_y, unit)
    }

    pub fn pixel_count(&self) -> u64 {
        self.row_count * self.column_count
    }
}

/// Bounding box, in `destination` coordinates, of the reprojected border
/// of a source raster.
///
/// Each border is walked twice: once pixel by pixel through the
/// transformer, a band [`BORDER_BAND`] pixels deep, and once by linear
/// interpolation of longitude/latitude between the raster's corners. Points
/// in a projection's break region still count; points that fail outright
/// are skipped. Interior extrema are not searched for.
///
/// Returns [`Area::invalid`] when no border point could be projected.
pub fn projected_minbox(
    source_ul: Coordinate,
    source: &Arc<Projection>,
    source_pixel_size: f64,
    row_count: u64,
    column_count: u64,
    destination: &Arc<Projection>,
) -> Area {
    if row_count == 0 || column_count == 0 {
        return Area::invalid();
    }

    let transformer = Transformer::new(Arc::clone(source), Arc::clone(destination));
    let mut bounds = Bounds::default();

    let edge = |column: u64, row: u64| {
        Coordinate::new(
            source_ul.x + column as f64 * source_pixel_size,
            source_ul.y - row as f64 * source_pixel_size,
            source.unit(),
        )
    };

    // Pixel edges run 0..=count, so the far side of the last pixel is
    // included.
    let band_rows = BORDER_BAND.min(row_count);
    let band_columns = BORDER_BAND.min(column_count);
    let bands = [
        (0..=column_count, 0..=band_rows),
        (0..=column_count, row_count - band_rows..=row_count),
        (0..=band_columns, 0..=row_count),
        (column_count - band_columns..=column_count, 0..=row_count),
    ];
    for (columns, rows) in bands {
        for column in columns {
            for row in rows.clone() {
                let mut coord = edge(column, row);
                if settle(transformer.transform(&mut coord)) {
                    bounds.add(coord);
                }
            }
        }
    }

    // Geographic walk between the corners.
    let corners = [
        edge(0, 0),
        edge(column_count, 0),
        edge(column_count, row_count),
        edge(0, row_count),
    ]
    .map(|mut corner| settle(transformer.transform_inverse(&mut corner)).then_some(corner));

    let samples = (column_count.max(row_count) + 1).min(MAX_EDGE_SAMPLES);
    for i in 0..4 {
        let (Some(from), Some(to)) = (corners[i], corners[(i + 1) % 4]) else {
            continue;
        };
        for step in 0..=samples {
            let t = step as f64 / samples as f64;
            let mut coord = Coordinate::new(
                from.x + (to.x - from.x) * t,
                from.y + (to.y - from.y) * t,
                Unit::Degree,
            );
            if settle(transformer.transform_forward(&mut coord)) {
                bounds.add(coord);
            }
        }
    }

    match bounds.area(destination.unit()) {
        Some(area) => {
            debug!(minbox = %area, "Projected minbox computed");
            area
        }
        None => Area::invalid(),
    }
}

/// Source pixel area needed to fill `destination_area` of the destination
/// grid.
///
/// Every destination pixel is mapped; footprints whose upper-left corner
/// falls outside the source raster are dropped. The result is floored and
/// ceiled to whole pixels and clamped to the source raster, or
/// [`Area::invalid`] when no pixel maps inside.
pub fn raster_minbox(source: &RasterGrid, destination: &RasterGrid, destination_area: &Area) -> Area {
    if destination_area.is_invalid() || source.row_count == 0 || source.column_count == 0 {
        return Area::invalid();
    }

    let rct = RasterCoordTransformer::new(
        Arc::clone(&destination.projection),
        destination.ul,
        destination.pixel_size,
        Arc::clone(&source.projection),
        source.ul,
        source.pixel_size,
    );
    let (columns, rows) = (source.column_count as f64, source.row_count as f64);

    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;
    for row in destination_area.first_row()..=destination_area.last_row() {
        for column in destination_area.first_column()..=destination_area.last_column() {
            let footprint = rct.transform(Coordinate::pixel(column as f64, row as f64));
            if footprint.is_invalid() || !inside(&footprint.ul, columns, rows) {
                continue;
            }
            for corner in [footprint.ul, footprint.lr] {
                min_x = min_x.min(corner.x);
                min_y = min_y.min(corner.y);
                max_x = max_x.max(corner.x);
                max_y = max_y.max(corner.y);
            }
        }
    }

    if min_x == f64::MAX {
        return Area::invalid();
    }

    let ul_x = snap_floor(min_x).clamp(0.0, columns - 1.0);
    let ul_y = snap_floor(min_y).clamp(0.0, rows - 1.0);
    let lr_x = snap_ceil(max_x).clamp(ul_x, columns - 1.0);
    let lr_y = snap_ceil(max_y).clamp(ul_y, rows - 1.0);
    Area::pixels(ul_x as u64, ul_y as u64, lr_x as u64, lr_y as u64)
}

/// Size an output raster from its projected minbox.
pub fn output_geometry(minbox: &Area, pixel_size: f64) -> Result<OutputGeometry> {
    if minbox.is_invalid() {
        return Err(ReprojectError::config(
            "input raster does not map into the output projection",
        ));
    }
    if !(pixel_size.is_finite() && pixel_size > 0.0) {
        return Err(ReprojectError::config(format!(
            "invalid output pixel size {pixel_size}"
        )));
    }

    let count = |span: f64| snap_ceil(span / pixel_size).max(1.0) as u64;
    Ok(OutputGeometry {
        ul_x: minbox.ul.x,
        ul_y: minbox.ul.y,
        pixel_size,
        row_count: count(minbox.ul.y - minbox.lr.y),
        column_count: count(minbox.lr.x - minbox.ul.x),
    })
}

/// Output pixel size when none is requested: the input pixel size, carried
/// across an angular/linear unit change at equatorial scale.
pub fn default_pixel_size(source_pixel_size: f64, source_unit: Unit, destination_unit: Unit) -> f64 {
    match (source_unit.is_angular(), destination_unit.is_angular()) {
        (true, false) => {
            let degrees = source_pixel_size * angular_to_degrees(source_unit);
            degrees * METERS_PER_DEGREE / linear_to_meters(destination_unit)
        }
        (false, true) => {
            let meters = source_pixel_size * linear_to_meters(source_unit);
            meters / METERS_PER_DEGREE / angular_to_degrees(destination_unit)
        }
        _ => source_pixel_size,
    }
}

/// Factor from an angular unit to degrees. Units `untfz` cannot convert
/// (pixel space) pass through unscaled.
fn angular_to_degrees(unit: Unit) -> f64 {
    untfz(unit, Unit::Degree).unwrap_or(1.0)
}

fn linear_to_meters(unit: Unit) -> f64 {
    untfz(unit, Unit::Meter).unwrap_or(1.0)
}

/// Pixel positions closer than this to a whole pixel are treated as on it.
pub(crate) const PIXEL_EPSILON: f64 = 1e-6;

pub(crate) fn snap_floor(v: f64) -> f64 {
    (v + PIXEL_EPSILON).floor()
}

pub(crate) fn snap_ceil(v: f64) -> f64 {
    (v - PIXEL_EPSILON).ceil()
}

pub(crate) fn inside(pixel: &Coordinate, columns: f64, rows: f64) -> bool {
    pixel.x >= -PIXEL_EPSILON && pixel.y >= -PIXEL_EPSILON && pixel.x < columns && pixel.y < rows
}

/// True when the transform produced a usable point.
fn settle(result: ProjResult<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => err.is_soft(),
    }
}

#[derive(Default)]
struct Bounds {
    extent: Option<(f64, f64, f64, f64)>,
}

impl Bounds {
    fn add(&mut self, c: Coordinate) {
        if !(c.x.is_finite() && c.y.is_finite()) {
            return;
        }
        self.extent = Some(match self.extent {
            None => (c.x, c.y, c.x, c.y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(c.x), min_y.min(c.y), max_x.max(c.x), max_y.max(c.y))
            }
        });
    }

    fn area(&self, unit: Unit) -> Option<Area> {
        self.extent
            .map(|(min_x, min_y, max_x, max_y)| Area::projected(min_x, max_y, max_x, min_y, unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::{ProjCode, ProjectionSpec};
    use test_utils::{assert_approx_eq, assert_coords_approx_eq};

    fn projection(code: ProjCode) -> Arc<Projection> {
        Arc::new(Projection::new(ProjectionSpec::new(code)).unwrap())
    }

    #[test]
    fn test_identity_minbox_is_raster_extent() {
        let geo = projection(ProjCode::Geographic);
        let ul = Coordinate::new(-10.0, 20.0, Unit::Degree);
        let area = projected_minbox(ul, &geo, 0.5, 40, 60, &geo);

        assert_coords_approx_eq!((area.ul.x, area.ul.y), (-10.0, 20.0), 1e-9);
        assert_coords_approx_eq!((area.lr.x, area.lr.y), (20.0, 0.0), 1e-9);

        let geometry = output_geometry(&area, 0.5).unwrap();
        assert_eq!(geometry.column_count, 60);
        assert_eq!(geometry.row_count, 40);
    }

    #[test]
    fn test_minbox_into_mercator_contains_corners() {
        let geo = projection(ProjCode::Geographic);
        let merc = projection(ProjCode::Mercator);
        let ul = Coordinate::new(-30.0, 40.0, Unit::Degree);
        let area = projected_minbox(ul, &geo, 1.0, 60, 60, &merc);

        for (lon, lat) in [(-30.0, 40.0), (30.0, 40.0), (-30.0, -20.0), (30.0, -20.0), (0.0, 10.0)] {
            let (x, y) = merc.forward(lon, lat).unwrap();
            assert!(x >= area.ul.x - 1e-6 && x <= area.lr.x + 1e-6, "{lon},{lat}: {area}");
            assert!(y <= area.ul.y + 1e-6 && y >= area.lr.y - 1e-6, "{lon},{lat}: {area}");
        }
    }

    #[test]
    fn test_unmappable_raster_is_invalid() {
        let ortho = projection(ProjCode::Orthographic);
        let geo = projection(ProjCode::Geographic);
        // Entirely beyond the orthographic disk.
        let ul = Coordinate::new(7_000_000.0, 7_000_000.0, Unit::Meter);
        assert!(projected_minbox(ul, &ortho, 1000.0, 10, 10, &geo).is_invalid());
        assert!(output_geometry(&Area::invalid(), 1.0).is_err());
    }

    #[test]
    fn test_raster_minbox_identity() {
        let geo = projection(ProjCode::Geographic);
        let grid = RasterGrid {
            projection: geo,
            ul: Coordinate::new(0.0, 10.0, Unit::Degree),
            pixel_size: 1.0,
            row_count: 10,
            column_count: 10,
        };
        let area = raster_minbox(&grid, &grid, &Area::pixels(2, 3, 4, 5));
        // The half-pixel corner ceils one pixel past the destination area.
        assert_eq!(area, Area::pixels(2, 3, 5, 6));

        let corner = raster_minbox(&grid, &grid, &Area::pixels(9, 9, 9, 9));
        assert_eq!(corner, Area::pixels(9, 9, 9, 9));
    }

    #[test]
    fn test_raster_minbox_outside_source_is_invalid() {
        let geo = projection(ProjCode::Geographic);
        let source = RasterGrid {
            projection: geo.clone(),
            ul: Coordinate::new(0.0, 10.0, Unit::Degree),
            pixel_size: 1.0,
            row_count: 10,
            column_count: 10,
        };
        let destination = RasterGrid {
            ul: Coordinate::new(50.0, 10.0, Unit::Degree),
            ..source.clone()
        };
        assert!(raster_minbox(&source, &destination, &destination.area()).is_invalid());
    }

    #[test]
    fn test_default_pixel_size_crosses_units() {
        let meters = default_pixel_size(1.0, Unit::Degree, Unit::Meter);
        assert_approx_eq!(meters, 111_319.49, 0.01);
        let degrees = default_pixel_size(meters, Unit::Meter, Unit::Degree);
        assert_approx_eq!(degrees, 1.0, 1e-12);
        assert_eq!(default_pixel_size(30.0, Unit::Meter, Unit::Meter), 30.0);
    }

    #[test]
    fn test_default_pixel_size_in_feet_and_arc_seconds() {
        let us_feet = default_pixel_size(1.0, Unit::Degree, Unit::Feet);
        assert_approx_eq!(us_feet, 111_319.49 / 0.3048006096012192, 0.05);
        let international = default_pixel_size(1.0, Unit::Degree, Unit::InternationalFeet);
        assert!(international > us_feet);

        let from_seconds = default_pixel_size(3600.0, Unit::ArcSecond, Unit::Meter);
        assert_approx_eq!(from_seconds, default_pixel_size(1.0, Unit::Degree, Unit::Meter), 1e-6);
        let radians = default_pixel_size(100_000.0, Unit::Meter, Unit::Radian);
        assert_approx_eq!(radians.to_degrees(), default_pixel_size(100_000.0, Unit::Meter, Unit::Degree), 1e-9);
    }
}
