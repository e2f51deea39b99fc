//! GeoTIFF reading for source rasters.
//!
//! Rasters in the positioned layout are read a region at a time straight
//! from the file. Anything else the `tiff` decoder understands
//! (compressed, multi-strip) is decoded whole on first access.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use projection::Projection;
use raster_common::{Area, GeoTransform, PixelType};
use reproject::{PixelBuffer, RasterChunk};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tracing::{debug, warn};

use crate::error::{Result, SptwError};
use crate::geotiff::{native_byte_order, read_geotransform, read_projection_text};
use crate::ptiff::StripLayout;

enum Storage {
    /// Pixels read from the file on demand.
    Strips,
    /// Pixels decoded on first access.
    Decoded(Option<PixelBuffer>),
}

/// A GeoTIFF opened for reading.
pub struct RasterDataset {
    path: PathBuf,
    reader: BufReader<File>,
    layout: StripLayout,
    geotransform: GeoTransform,
    projection_text: Option<String>,
    storage: Storage,
}

impl std::fmt::Debug for RasterDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterDataset")
            .field("path", &self.path)
            .field("layout", &self.layout)
            .field("geotransform", &self.geotransform)
            .field("projection_text", &self.projection_text)
            .finish()
    }
}

impl RasterDataset {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = BufReader::new(File::open(&path)?);
        let native = native_byte_order(&mut reader)?;
        reader.seek(SeekFrom::Start(0))?;

        let mut decoder = Decoder::new(BufReader::new(File::open(&path)?))?;
        let (layout, direct) = StripLayout::from_decoder(&mut decoder)?;
        let geotransform = match read_geotransform(&mut decoder)? {
            Some(gt) => gt,
            None => {
                warn!(path = %path.display(), "Raster has no georeferencing, using pixel coordinates");
                GeoTransform::north_up(0.0, 0.0, 1.0)
            }
        };
        let projection_text = read_projection_text(&mut decoder);

        let storage = if direct && native {
            Storage::Strips
        } else {
            Storage::Decoded(None)
        };
        debug!(
            path = %path.display(),
            columns = layout.column_count,
            rows = layout.row_count,
            bands = layout.band_count,
            pixel_type = %layout.pixel_type,
            direct = matches!(storage, Storage::Strips),
            "Raster opened for reading"
        );

        Ok(Self {
            path,
            reader,
            layout,
            geotransform,
            projection_text,
            storage,
        })
    }

    pub fn column_count(&self) -> u64 {
        self.layout.column_count
    }

    pub fn row_count(&self) -> u64 {
        self.layout.row_count
    }

    pub fn band_count(&self) -> usize {
        self.layout.band_count
    }

    pub fn pixel_type(&self) -> PixelType {
        self.layout.pixel_type
    }

    pub fn geotransform(&self) -> &GeoTransform {
        &self.geotransform
    }

    /// WKT or PROJ text stored in GeoAsciiParams, if any.
    pub fn projection_text(&self) -> Option<&str> {
        self.projection_text.as_deref()
    }

    /// The whole raster as a pixel area.
    pub fn area(&self) -> Area {
        self.layout.area()
    }

    /// Interleaved pixels of `area`, row by row.
    pub fn read_region(&mut self, area: &Area) -> Result<PixelBuffer> {
        if area.is_invalid()
            || area.last_column() >= self.layout.column_count
            || area.last_row() >= self.layout.row_count
        {
            return Err(SptwError::bad_argument(format!(
                "area {area} outside the {}x{} raster",
                self.layout.column_count, self.layout.row_count
            )));
        }

        match &mut self.storage {
            Storage::Strips => {
                let ranges = self.layout.area_byte_ranges(area)?;
                let total: u64 = ranges.iter().map(|r| r.end - r.start).sum();
                let mut bytes = vec![0u8; total as usize];
                let mut filled = 0usize;
                for range in ranges {
                    let len = (range.end - range.start) as usize;
                    self.reader.seek(SeekFrom::Start(range.start))?;
                    self.reader.read_exact(&mut bytes[filled..filled + len])?;
                    filled += len;
                }
                Ok(PixelBuffer::from_bytes(self.layout.pixel_type, &bytes)?)
            }
            Storage::Decoded(cache) => {
                if cache.is_none() {
                    let all = decode_all(&self.path)?;
                    let expected = self.layout.row_bytes() * self.layout.row_count;
                    if (all.as_bytes().len() as u64) < expected
                        || all.pixel_type() != Some(self.layout.pixel_type)
                    {
                        return Err(SptwError::layout("decoded image does not match its tags"));
                    }
                    *cache = Some(all);
                }
                let Some(all) = cache.as_ref() else {
                    return Err(SptwError::layout("raster could not be decoded"));
                };
                let pixel_bytes = self.layout.pixel_bytes() as usize;
                let row_bytes = self.layout.row_bytes() as usize;
                let source = all.as_bytes();
                let mut bytes = Vec::with_capacity(area.pixel_count() as usize * pixel_bytes);
                for row in area.first_row()..=area.last_row() {
                    let start = row as usize * row_bytes + area.first_column() as usize * pixel_bytes;
                    let len = area.column_count() as usize * pixel_bytes;
                    bytes.extend_from_slice(&source[start..start + len]);
                }
                Ok(PixelBuffer::from_bytes(self.layout.pixel_type, &bytes)?)
            }
        }
    }

    /// A chunk over `area` holding its pixels, georeferenced in
    /// `projection`.
    pub fn read_chunk(&mut self, area: &Area, projection: Arc<Projection>) -> Result<RasterChunk> {
        let pixels = self.read_region(area)?;
        Ok(RasterChunk::with_pixels(
            area,
            &self.geotransform,
            self.layout.band_count,
            projection,
            pixels,
        )?)
    }
}

/// Decode every pixel of the first image in `path`.
fn decode_all(path: &Path) -> Result<PixelBuffer> {
    let file = File::open(path)?;
    let mut limits = Limits::default();
    limits.decoding_buffer_size = usize::MAX;
    limits.intermediate_buffer_size = usize::MAX;
    limits.ifd_value_size = usize::MAX;
    let mut decoder = Decoder::new(BufReader::new(file))?.with_limits(limits);

    let pixels = match decoder.read_image()? {
        DecodingResult::U8(data) => PixelBuffer::U8(data),
        DecodingResult::U16(data) => PixelBuffer::U16(data),
        DecodingResult::I16(data) => PixelBuffer::I16(data),
        DecodingResult::U32(data) => PixelBuffer::U32(data),
        DecodingResult::I32(data) => PixelBuffer::I32(data),
        DecodingResult::F32(data) => PixelBuffer::F32(data),
        DecodingResult::F64(data) => PixelBuffer::F64(data),
        _ => return Err(SptwError::layout("unsupported sample type")),
    };
    debug!(path = %path.display(), samples = pixels.len(), "Raster decoded");
    Ok(pixels)
}
