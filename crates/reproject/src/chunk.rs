//! In-memory pixel blocks.

use std::sync::Arc;

use projection::Projection;
use raster_common::{Area, Coordinate, GeoTransform, PixelType};

use crate::error::{ReprojectError, Result};

/// Typed, band-interleaved pixel storage.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PixelBuffer {
    /// No storage allocated yet.
    #[default]
    Empty,
    U8(Vec<u8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Run `$body` with `$v` bound to the typed vector of a non-empty buffer,
/// or evaluate `$empty` for [`PixelBuffer::Empty`].
macro_rules! with_buffer {
    ($buffer:expr, $v:ident => $body:expr, Empty => $empty:expr) => {
        match $buffer {
            PixelBuffer::Empty => $empty,
            PixelBuffer::U8($v) => $body,
            PixelBuffer::U16($v) => $body,
            PixelBuffer::I16($v) => $body,
            PixelBuffer::U32($v) => $body,
            PixelBuffer::I32($v) => $body,
            PixelBuffer::F32($v) => $body,
            PixelBuffer::F64($v) => $body,
        }
    };
}

impl PixelBuffer {
    /// Zero-initialized buffer of `len` samples.
    pub fn zeroed(pixel_type: PixelType, len: usize) -> Self {
        Self::filled(pixel_type, len, 0.0)
    }

    /// Buffer of `len` samples all set to `value`, converted to the sample
    /// type with rounding and saturation.
    pub fn filled(pixel_type: PixelType, len: usize, value: f64) -> Self {
        match pixel_type {
            PixelType::U8 => Self::U8(vec![value.round() as u8; len]),
            PixelType::U16 => Self::U16(vec![value.round() as u16; len]),
            PixelType::I16 => Self::I16(vec![value.round() as i16; len]),
            PixelType::U32 => Self::U32(vec![value.round() as u32; len]),
            PixelType::I32 => Self::I32(vec![value.round() as i32; len]),
            PixelType::F32 => Self::F32(vec![value as f32; len]),
            PixelType::F64 => Self::F64(vec![value; len]),
        }
    }

    /// Decode native-endian bytes into a typed buffer. The input does not
    /// need to be aligned.
    pub fn from_bytes(pixel_type: PixelType, bytes: &[u8]) -> Result<Self> {
        if bytes.len() % pixel_type.byte_size() != 0 {
            return Err(ReprojectError::config(format!(
                "{} bytes is not a whole number of {} samples",
                bytes.len(),
                pixel_type
            )));
        }
        Ok(match pixel_type {
            PixelType::U8 => Self::U8(bytes.to_vec()),
            PixelType::U16 => Self::U16(bytemuck::pod_collect_to_vec(bytes)),
            PixelType::I16 => Self::I16(bytemuck::pod_collect_to_vec(bytes)),
            PixelType::U32 => Self::U32(bytemuck::pod_collect_to_vec(bytes)),
            PixelType::I32 => Self::I32(bytemuck::pod_collect_to_vec(bytes)),
            PixelType::F32 => Self::F32(bytemuck::pod_collect_to_vec(bytes)),
            PixelType::F64 => Self::F64(bytemuck::pod_collect_to_vec(bytes)),
        })
    }

    pub fn pixel_type(&self) -> Option<PixelType> {
        match self {
            Self::Empty => None,
            Self::U8(_) => Some(PixelType::U8),
            Self::U16(_) => Some(PixelType::U16),
            Self::I16(_) => Some(PixelType::I16),
            Self::U32(_) => Some(PixelType::U32),
            Self::I32(_) => Some(PixelType::I32),
            Self::F32(_) => Some(PixelType::F32),
            Self::F64(_) => Some(PixelType::F64),
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        with_buffer!(self, v => v.len(), Empty => 0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Native-endian byte view of the samples.
    pub fn as_bytes(&self) -> &[u8] {
        with_buffer!(self, v => bytemuck::cast_slice(v.as_slice()), Empty => &[])
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        with_buffer!(self, v => bytemuck::cast_slice_mut(v.as_mut_slice()), Empty => &mut [])
    }

    /// Sample at `index` widened to `f64`.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        with_buffer!(self, v => v.get(index).map(|s| *s as f64), Empty => None)
    }
}

/// A rectangular block of a raster held in memory, with the georeferencing
/// needed to map its pixels.
///
/// `raster_location` is the pixel position of the chunk's upper-left pixel
/// inside the whole raster; `ul_projected_corner` and `geotransform` are
/// anchored at that same pixel.
#[derive(Debug, Clone)]
pub struct RasterChunk {
    pub pixels: PixelBuffer,
    pub row_count: usize,
    pub column_count: usize,
    pub band_count: usize,
    pub pixel_type: PixelType,
    pub pixel_size: f64,
    pub raster_location: Coordinate,
    pub ul_projected_corner: Coordinate,
    pub geotransform: GeoTransform,
    pub projection: Arc<Projection>,
}

impl RasterChunk {
    /// Chunk covering the pixel `area` of a raster georeferenced by
    /// `raster_geotransform`, with no pixel storage.
    pub fn empty(
        area: &Area,
        raster_geotransform: &GeoTransform,
        pixel_type: PixelType,
        band_count: usize,
        projection: Arc<Projection>,
    ) -> Self {
        let ul_projected_corner =
            raster_geotransform.pixel_to_projected(area.ul.x, area.ul.y, projection.unit());
        let pixel_size = raster_geotransform.pixel_size();
        Self {
            pixels: PixelBuffer::Empty,
            row_count: area.row_count() as usize,
            column_count: area.column_count() as usize,
            band_count,
            pixel_type,
            pixel_size,
            raster_location: Coordinate::pixel(area.ul.x, area.ul.y),
            ul_projected_corner,
            geotransform: GeoTransform::north_up(
                ul_projected_corner.x,
                ul_projected_corner.y,
                pixel_size,
            ),
            projection,
        }
    }

    /// Like [`RasterChunk::empty`] with a zeroed buffer.
    pub fn allocated(
        area: &Area,
        raster_geotransform: &GeoTransform,
        pixel_type: PixelType,
        band_count: usize,
        projection: Arc<Projection>,
    ) -> Self {
        let mut chunk = Self::empty(area, raster_geotransform, pixel_type, band_count, projection);
        chunk.pixels = PixelBuffer::zeroed(pixel_type, chunk.sample_count());
        chunk
    }

    /// Like [`RasterChunk::empty`] holding already-read `pixels`.
    pub fn with_pixels(
        area: &Area,
        raster_geotransform: &GeoTransform,
        band_count: usize,
        projection: Arc<Projection>,
        pixels: PixelBuffer,
    ) -> Result<Self> {
        let pixel_type = pixels
            .pixel_type()
            .ok_or_else(|| ReprojectError::config("populated chunk needs a pixel buffer"))?;
        let mut chunk = Self::empty(area, raster_geotransform, pixel_type, band_count, projection);
        if pixels.len() != chunk.sample_count() {
            return Err(ReprojectError::config(format!(
                "chunk of {}x{}x{} needs {} samples, got {}",
                chunk.column_count,
                chunk.row_count,
                band_count,
                chunk.sample_count(),
                pixels.len()
            )));
        }
        chunk.pixels = pixels;
        Ok(chunk)
    }

    /// Samples the buffer must hold: rows x columns x bands.
    pub fn sample_count(&self) -> usize {
        self.row_count * self.column_count * self.band_count
    }

    /// The chunk's pixel area inside the whole raster.
    pub fn area(&self) -> Area {
        Area::pixels(
            self.raster_location.x as u64,
            self.raster_location.y as u64,
            self.raster_location.x as u64 + self.column_count.saturating_sub(1) as u64,
            self.raster_location.y as u64 + self.row_count.saturating_sub(1) as u64,
        )
    }

    pub fn is_allocated(&self) -> bool {
        self.pixels.len() == self.sample_count() && self.pixels.pixel_type() == Some(self.pixel_type)
    }

    /// Bytes per row of interleaved samples.
    pub fn row_bytes(&self) -> usize {
        self.column_count * self.band_count * self.pixel_type.byte_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::ProjCode;

    fn geographic() -> Arc<Projection> {
        Arc::new(Projection::from_code(ProjCode::Geographic).unwrap())
    }

    #[test]
    fn test_chunk_georeferencing() {
        let gt = GeoTransform::north_up(-180.0, 90.0, 0.5);
        let area = Area::pixels(10, 20, 19, 29);
        let chunk = RasterChunk::empty(&area, &gt, PixelType::F32, 1, geographic());

        assert_eq!(chunk.row_count, 10);
        assert_eq!(chunk.column_count, 10);
        assert_eq!(chunk.ul_projected_corner.x, -175.0);
        assert_eq!(chunk.ul_projected_corner.y, 80.0);
        assert_eq!(chunk.geotransform.ul_x(), -175.0);
        assert_eq!(chunk.area(), area);
        assert!(!chunk.is_allocated());
    }

    #[test]
    fn test_allocated_is_zeroed() {
        let gt = GeoTransform::north_up(0.0, 0.0, 1.0);
        let area = Area::pixels(0, 0, 3, 1);
        let chunk = RasterChunk::allocated(&area, &gt, PixelType::U16, 3, geographic());
        assert!(chunk.is_allocated());
        assert_eq!(chunk.pixels.len(), 24);
        assert_eq!(chunk.pixels.as_bytes().len(), 48);
        assert_eq!(chunk.row_bytes(), 24);
        assert!(chunk.pixels.as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_with_pixels_checks_length() {
        let gt = GeoTransform::north_up(0.0, 0.0, 1.0);
        let area = Area::pixels(0, 0, 1, 1);
        assert!(RasterChunk::with_pixels(&area, &gt, 1, geographic(), PixelBuffer::U8(vec![1; 4])).is_ok());
        assert!(RasterChunk::with_pixels(&area, &gt, 1, geographic(), PixelBuffer::U8(vec![1; 3])).is_err());
        assert!(RasterChunk::with_pixels(&area, &gt, 1, geographic(), PixelBuffer::Empty).is_err());
    }

    #[test]
    fn test_byte_views() {
        let mut buffer = PixelBuffer::from_bytes(PixelType::I16, &[1, 0, 0xff, 0xff]).unwrap();
        assert_eq!(buffer, PixelBuffer::I16(vec![i16::from_ne_bytes([1, 0]), -1]));
        buffer.as_bytes_mut()[0] = 2;
        assert_eq!(buffer.get_f64(0), Some(i16::from_ne_bytes([2, 0]) as f64));
        assert!(PixelBuffer::from_bytes(PixelType::F64, &[0; 7]).is_err());
        assert!(PixelBuffer::Empty.as_bytes().is_empty());
    }

    #[test]
    fn test_filled_saturates() {
        assert_eq!(PixelBuffer::filled(PixelType::U8, 2, 300.0), PixelBuffer::U8(vec![255, 255]));
        assert_eq!(PixelBuffer::filled(PixelType::I16, 1, -1.6), PixelBuffer::I16(vec![-2]));
        assert_eq!(PixelBuffer::filled(PixelType::F32, 1, 1.5).pixel_type(), Some(PixelType::F32));
    }
}
