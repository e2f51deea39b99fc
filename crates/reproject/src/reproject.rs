//! The per-chunk reprojection loop.

use metrics::counter;
use rayon::prelude::*;
use raster_common::{Area, Coordinate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunk::{PixelBuffer, RasterChunk};
use crate::error::{ReprojectError, Result};
use crate::minbox::{inside, snap_floor};
use crate::raster_coord::RasterCoordTransformer;
use crate::resampler::{Resampler, Sample};

/// What happened to the pixels of one destination chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReprojectStats {
    /// Destination pixels visited.
    pub pixels: u64,
    /// Destination pixels set to the fill value.
    pub filled: u64,
}

impl ReprojectStats {
    pub fn merge(&mut self, other: ReprojectStats) {
        self.pixels += other.pixels;
        self.filled += other.filled;
    }
}

/// Fill every pixel of `destination` from `source`.
///
/// Each destination pixel is mapped into `source`; pixels with no valid
/// mapping or whose footprint starts outside `source` get `fill_value`,
/// the rest get `resampler` applied to the footprint clamped to `source`.
/// The destination buffer is allocated if it is empty. Rows run in
/// parallel.
pub fn reproject_chunk(
    source: &RasterChunk,
    destination: &mut RasterChunk,
    fill_value: f64,
    resampler: Resampler,
) -> Result<ReprojectStats> {
    if source.pixel_type != destination.pixel_type {
        return Err(ReprojectError::PixelTypeMismatch {
            source_type: source.pixel_type,
            destination_type: destination.pixel_type,
        });
    }
    if source.band_count != destination.band_count {
        return Err(ReprojectError::config(format!(
            "source has {} bands, destination {}",
            source.band_count, destination.band_count
        )));
    }
    if !source.is_allocated() {
        return Err(ReprojectError::config("source chunk holds no pixels"));
    }
    if !destination.is_allocated() {
        destination.pixels = PixelBuffer::zeroed(destination.pixel_type, destination.sample_count());
    }

    let rct = RasterCoordTransformer::for_chunks(destination, source);
    let layout = Layout {
        source_columns: source.column_count,
        source_rows: source.row_count,
        destination_columns: destination.column_count,
        bands: destination.band_count,
    };

    macro_rules! run {
        ($($variant:ident),*) => {
            match (&source.pixels, &mut destination.pixels) {
                $(
                    (PixelBuffer::$variant(src), PixelBuffer::$variant(dst)) => {
                        fill_pixels(&rct, &layout, src, dst, fill_value, resampler)
                    }
                )*
                _ => {
                    return Err(ReprojectError::config("chunk buffers do not match their pixel types"));
                }
            }
        };
    }
    let stats = run!(U8, U16, I16, U32, I32, F32, F64);

    counter!("reproject_pixels_total").increment(stats.pixels);
    counter!("reproject_filled_pixels_total").increment(stats.filled);
    debug!(
        rows = destination.row_count,
        columns = destination.column_count,
        filled = stats.filled,
        "Chunk reprojected"
    );
    Ok(stats)
}

struct Layout {
    source_columns: usize,
    source_rows: usize,
    destination_columns: usize,
    bands: usize,
}

fn fill_pixels<T: Sample>(
    rct: &RasterCoordTransformer,
    layout: &Layout,
    source: &[T],
    destination: &mut [T],
    fill_value: f64,
    resampler: Resampler,
) -> ReprojectStats {
    let row_len = layout.destination_columns * layout.bands;
    if row_len == 0 {
        return ReprojectStats::default();
    }
    let fill = T::from_f64(fill_value);
    let (columns, rows) = (layout.source_columns as f64, layout.source_rows as f64);

    destination
        .par_chunks_mut(row_len)
        .enumerate()
        .map(|(row, out)| {
            let mut stats = ReprojectStats::default();
            for column in 0..layout.destination_columns {
                stats.pixels += 1;
                let pixel = &mut out[column * layout.bands..(column + 1) * layout.bands];

                let footprint = rct.transform(Coordinate::pixel(column as f64, row as f64));
                if footprint.is_invalid() || !inside(&footprint.ul, columns, rows) {
                    pixel.fill(fill);
                    stats.filled += 1;
                    continue;
                }

                let area = clamp_footprint(&footprint, columns, rows);
                for (band, value) in pixel.iter_mut().enumerate() {
                    *value = resampler.resample(&area, layout.source_columns, band, layout.bands, source);
                }
            }
            stats
        })
        .reduce(ReprojectStats::default, |mut a, b| {
            a.merge(b);
            a
        })
}

/// Whole-pixel source area spanned by both corners of a footprint,
/// clamped to a `columns` x `rows` raster.
fn clamp_footprint(footprint: &Area, columns: f64, rows: f64) -> Area {
    let bound = |a: f64, b: f64, limit: f64| {
        let low = snap_floor(a.min(b)).clamp(0.0, limit - 1.0);
        let high = snap_floor(a.max(b)).clamp(low, limit - 1.0);
        (low as u64, high as u64)
    };
    let (first_column, last_column) = bound(footprint.ul.x, footprint.lr.x, columns);
    let (first_row, last_row) = bound(footprint.ul.y, footprint.lr.y, rows);
    Area::pixels(first_column, first_row, last_column, last_row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::{ProjCode, Projection};
    use raster_common::{GeoTransform, PixelType};
    use std::sync::Arc;

    fn geographic() -> Arc<Projection> {
        Arc::new(Projection::from_code(ProjCode::Geographic).unwrap())
    }

    fn chunk(area: Area, gt: &GeoTransform, pixels: PixelBuffer) -> RasterChunk {
        RasterChunk::with_pixels(&area, gt, 1, geographic(), pixels).unwrap()
    }

    #[test]
    fn test_identity_copies_pixels() {
        let gt = GeoTransform::north_up(-10.0, 10.0, 1.0);
        let area = Area::pixels(0, 0, 3, 2);
        let values: Vec<u16> = (0..12).collect();
        let source = chunk(area, &gt, PixelBuffer::U16(values.clone()));
        let mut destination = RasterChunk::allocated(&area, &gt, PixelType::U16, 1, geographic());

        let stats = reproject_chunk(&source, &mut destination, 99.0, Resampler::Nearest).unwrap();
        assert_eq!(stats, ReprojectStats { pixels: 12, filled: 0 });
        assert_eq!(destination.pixels, PixelBuffer::U16(values));
    }

    #[test]
    fn test_outside_source_is_filled() {
        let gt = GeoTransform::north_up(0.0, 10.0, 1.0);
        let source = chunk(Area::pixels(0, 0, 1, 1), &gt, PixelBuffer::F32(vec![1.0; 4]));
        // Destination extends two columns past the source.
        let mut destination =
            RasterChunk::allocated(&Area::pixels(0, 0, 3, 1), &gt, PixelType::F32, 1, geographic());

        let stats = reproject_chunk(&source, &mut destination, -9999.0, Resampler::Mean).unwrap();
        assert_eq!(stats.filled, 4);
        assert_eq!(
            destination.pixels,
            PixelBuffer::F32(vec![1.0, 1.0, -9999.0, -9999.0, 1.0, 1.0, -9999.0, -9999.0])
        );
    }

    #[test]
    fn test_downsampling_with_max() {
        // Source at 0.5 degree, destination at 1 degree: the footprint of
        // each destination pixel spans two source columns and rows.
        let src_gt = GeoTransform::north_up(0.0, 2.0, 0.5);
        let dst_gt = GeoTransform::north_up(0.0, 2.0, 1.0);
        let values: Vec<u8> = (0..16).collect();
        let source = chunk(Area::pixels(0, 0, 3, 3), &src_gt, PixelBuffer::U8(values));
        let mut destination =
            RasterChunk::allocated(&Area::pixels(0, 0, 1, 1), &dst_gt, PixelType::U8, 1, geographic());

        reproject_chunk(&source, &mut destination, 0.0, Resampler::Max).unwrap();
        assert_eq!(destination.pixels, PixelBuffer::U8(vec![5, 7, 13, 15]));

        reproject_chunk(&source, &mut destination, 0.0, Resampler::Min).unwrap();
        assert_eq!(destination.pixels, PixelBuffer::U8(vec![0, 2, 8, 10]));
    }

    #[test]
    fn test_pixel_type_mismatch() {
        let gt = GeoTransform::north_up(0.0, 0.0, 1.0);
        let area = Area::pixels(0, 0, 1, 1);
        let source = chunk(area, &gt, PixelBuffer::U8(vec![0; 4]));
        let mut destination = RasterChunk::allocated(&area, &gt, PixelType::I16, 1, geographic());
        assert!(matches!(
            reproject_chunk(&source, &mut destination, 0.0, Resampler::Nearest),
            Err(ReprojectError::PixelTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_destination_is_allocated() {
        let gt = GeoTransform::north_up(0.0, 0.0, 1.0);
        let area = Area::pixels(0, 0, 2, 2);
        let source = chunk(area, &gt, PixelBuffer::I32(vec![7; 9]));
        let mut destination = RasterChunk::empty(&area, &gt, PixelType::I32, 1, geographic());
        reproject_chunk(&source, &mut destination, 0.0, Resampler::Nearest).unwrap();
        assert_eq!(destination.pixels, PixelBuffer::I32(vec![7; 9]));
    }

    #[test]
    fn test_clamp_footprint() {
        let footprint = Area::new(Coordinate::pixel(2.5, 3.2), Coordinate::pixel(3.1, 4.9));
        assert_eq!(clamp_footprint(&footprint, 10.0, 10.0), Area::pixels(2, 3, 3, 4));
        assert_eq!(clamp_footprint(&footprint, 3.0, 4.0), Area::pixels(2, 3, 2, 3));
    }
}
