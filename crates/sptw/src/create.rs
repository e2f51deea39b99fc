//! Creation of an empty GeoTIFF laid out for positioned writes.
//!
//! The file holds one uncompressed strip with interleaved bands, so the
//! byte offset of any pixel is plain arithmetic from the strip offset.
//! The strip is streamed as zeros; processes then fill it in place
//! through [`crate::PTiff`].

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use projection::Projection;
use raster_common::{GeoTransform, PixelType};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;
use tracing::info;

use crate::error::{Result, SptwError};
use crate::geotiff::write_geotiff_tags;

/// Zero block streamed into the strip.
const ZERO_BLOCK: usize = 1 << 20;

/// Room kept below the 4 GiB limit for the IFD and tag values.
const CLASSIC_HEADROOM: u64 = 1 << 20;

/// Shape and georeferencing of a raster to create.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterDescription {
    pub column_count: u64,
    pub row_count: u64,
    pub band_count: usize,
    pub pixel_type: PixelType,
    pub geotransform: GeoTransform,
}

impl RasterDescription {
    pub fn new(
        column_count: u64,
        row_count: u64,
        band_count: usize,
        pixel_type: PixelType,
        geotransform: GeoTransform,
    ) -> Self {
        Self {
            column_count,
            row_count,
            band_count,
            pixel_type,
            geotransform,
        }
    }

    /// Bytes in one row of interleaved samples.
    pub fn row_bytes(&self) -> u64 {
        self.column_count * self.band_count as u64 * self.pixel_type.byte_size() as u64
    }

    /// Bytes in the single strip.
    pub fn strip_bytes(&self) -> u64 {
        self.row_bytes() * self.row_count
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.column_count == 0 || self.row_count == 0 {
            return Err(format!(
                "raster must have pixels, got {}x{}",
                self.column_count, self.row_count
            ));
        }
        if self.column_count > u32::MAX as u64 || self.row_count > u32::MAX as u64 {
            return Err("raster dimensions exceed 32 bits".to_string());
        }
        if self.band_count == 0 || self.band_count > u16::MAX as usize {
            return Err(format!("invalid band count {}", self.band_count));
        }
        self.geotransform.validate_north_up().map_err(|e| e.to_string())
    }
}

/// Whether a strip of `strip_bytes` needs 64-bit offsets.
pub fn needs_bigtiff(strip_bytes: u64) -> bool {
    strip_bytes > u32::MAX as u64 - CLASSIC_HEADROOM
}

/// Create the raster at `path`, replacing any existing file.
///
/// Only one process may call this for a given output; the others wait
/// and then [`crate::open_raster`] the result.
pub fn create_raster(path: impl AsRef<Path>, description: &RasterDescription, projection: &Projection) -> Result<()> {
    let path = path.as_ref();
    let create_error = |reason: String| SptwError::CreateError {
        path: path.to_path_buf(),
        reason,
    };
    description.validate().map_err(create_error)?;

    let file = File::create(path).map_err(|e| create_error(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    let bigtiff = needs_bigtiff(description.strip_bytes());

    let strip_offset = if bigtiff {
        let mut encoder = TiffEncoder::new_big(&mut writer)?;
        let mut dir = encoder.new_directory()?;
        write_image_tags(&mut dir, description, projection)?;
        let offset = write_zero_strip(&mut dir, description.strip_bytes())?;
        dir.write_tag(Tag::StripOffsets, offset)?;
        dir.write_tag(Tag::StripByteCounts, description.strip_bytes())?;
        dir.finish()?;
        offset
    } else {
        let strip_bytes = u32::try_from(description.strip_bytes())
            .map_err(|e| create_error(e.to_string()))?;
        let mut encoder = TiffEncoder::new(&mut writer)?;
        let mut dir = encoder.new_directory()?;
        write_image_tags(&mut dir, description, projection)?;
        let offset = write_zero_strip(&mut dir, description.strip_bytes())?;
        let offset32 = u32::try_from(offset).map_err(|e| create_error(e.to_string()))?;
        dir.write_tag(Tag::StripOffsets, offset32)?;
        dir.write_tag(Tag::StripByteCounts, strip_bytes)?;
        dir.finish()?;
        offset
    };

    writer.flush()?;
    writer.get_ref().sync_all()?;
    info!(
        path = %path.display(),
        columns = description.column_count,
        rows = description.row_count,
        bands = description.band_count,
        pixel_type = %description.pixel_type,
        bigtiff,
        strip_offset,
        "Output raster created"
    );
    Ok(())
}

fn write_image_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<W, K>,
    description: &RasterDescription,
    projection: &Projection,
) -> Result<()> {
    let bands = description.band_count;
    let pixel_type = description.pixel_type;

    dir.write_tag(Tag::ImageWidth, description.column_count as u32)?;
    dir.write_tag(Tag::ImageLength, description.row_count as u32)?;

    let bits_per_sample = vec![pixel_type.bits_per_sample(); bands];
    dir.write_tag(Tag::BitsPerSample, bits_per_sample.as_slice())?;
    let sample_format = vec![pixel_type.sample_format(); bands];
    dir.write_tag(Tag::SampleFormat, sample_format.as_slice())?;

    // No compression, BlackIsZero, chunky
    dir.write_tag(Tag::Compression, 1u16)?;
    dir.write_tag(Tag::PhotometricInterpretation, 1u16)?;
    dir.write_tag(Tag::SamplesPerPixel, bands as u16)?;
    dir.write_tag(Tag::PlanarConfiguration, 1u16)?;
    dir.write_tag(Tag::RowsPerStrip, description.row_count as u32)?;

    if bands > 1 {
        let extra_samples = vec![0u16; bands - 1];
        dir.write_tag(Tag::ExtraSamples, extra_samples.as_slice())?;
    }

    write_geotiff_tags(dir, &description.geotransform, projection)
}

/// Stream `len` zero bytes; returns the offset of the first one.
fn write_zero_strip<W: Write + Seek, K: TiffKind>(dir: &mut DirectoryEncoder<W, K>, len: u64) -> Result<u64> {
    let block = vec![0u8; ZERO_BLOCK.min(len as usize)];
    let mut remaining = len;
    let mut first = None;
    while remaining > 0 {
        let n = remaining.min(block.len() as u64) as usize;
        let offset = dir.write_data(&block[..n])?;
        first.get_or_insert(offset);
        remaining -= n as u64;
    }
    first.ok_or_else(|| SptwError::bad_argument("empty strip"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bigtiff_threshold() {
        assert!(!needs_bigtiff(1 << 30));
        assert!(!needs_bigtiff(u32::MAX as u64 - CLASSIC_HEADROOM));
        assert!(needs_bigtiff(u32::MAX as u64));
        assert!(needs_bigtiff(10 << 30));
    }

    #[test]
    fn test_description_sizes() {
        let description = RasterDescription::new(
            100,
            20,
            3,
            PixelType::I16,
            GeoTransform::north_up(0.0, 0.0, 1.0),
        );
        assert_eq!(description.row_bytes(), 600);
        assert_eq!(description.strip_bytes(), 12_000);
        assert!(description.validate().is_ok());
    }

    #[test]
    fn test_description_rejects_bad_shapes() {
        let gt = GeoTransform::north_up(0.0, 0.0, 1.0);
        assert!(RasterDescription::new(0, 10, 1, PixelType::U8, gt).validate().is_err());
        assert!(RasterDescription::new(10, 10, 0, PixelType::U8, gt).validate().is_err());

        let rotated = GeoTransform([0.0, 1.0, 0.5, 0.0, 0.0, -1.0]);
        assert!(RasterDescription::new(10, 10, 1, PixelType::U8, rotated).validate().is_err());
    }
}
