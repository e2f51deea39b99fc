//! Positioned writes into a raster created by [`crate::create_raster`].
//!
//! Every process opens its own [`PTiff`] on the shared file and writes
//! disjoint byte ranges at computed offsets. There is no locking: callers
//! guarantee disjointness by writing disjoint pixel areas.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Seek, SeekFrom};
use std::os::unix::fs::FileExt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use metrics::counter;
use raster_common::{Area, PixelType};
use reproject::RasterChunk;
use tiff::decoder::Decoder;
use tiff::tags::Tag;
use tracing::debug;

use crate::error::{Result, SptwError};
use crate::geotiff::{native_byte_order, tag_u64_or, tag_u64s, uniform};

/// Strip layout of a raster that can be addressed by byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripLayout {
    pub column_count: u64,
    pub row_count: u64,
    pub band_count: usize,
    pub pixel_type: PixelType,
    pub first_strip_offset: u64,
}

impl StripLayout {
    /// Read the layout from the TIFF tags and check that the strips are
    /// uncompressed, interleaved, contiguous and in native byte order.
    pub fn read(file: &File) -> Result<Self> {
        let mut reader = BufReader::new(file.try_clone()?);
        if !native_byte_order(&mut reader)? {
            return Err(SptwError::layout("byte order differs from this machine"));
        }
        reader.seek(SeekFrom::Start(0))?;
        let mut decoder = Decoder::new(reader)?;
        match Self::from_decoder(&mut decoder)? {
            (layout, true) => Ok(layout),
            (_, false) => Err(SptwError::layout(
                "strips are compressed, planar or not contiguous",
            )),
        }
    }

    /// Layout from the tags, and whether its pixels can be addressed by
    /// offset. Only `first_strip_offset` is meaningless when they cannot.
    pub(crate) fn from_decoder<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> Result<(Self, bool)> {
        let (columns, rows) = decoder.dimensions()?;
        let band_count = tag_u64_or(decoder, Tag::SamplesPerPixel, 1)? as usize;
        let bits = tag_u64s(decoder, Tag::BitsPerSample)?.unwrap_or_else(|| vec![1]);
        let formats = tag_u64s(decoder, Tag::SampleFormat)?.unwrap_or_else(|| vec![1]);
        let pixel_type = PixelType::from_tiff(
            uniform(&formats, "SampleFormat")? as u16,
            uniform(&bits, "BitsPerSample")? as u16,
        )?;
        let planar = tag_u64_or(decoder, Tag::PlanarConfiguration, 1)?;
        if planar != 1 && band_count > 1 {
            return Err(SptwError::layout("planar (band-separate) rasters are not supported"));
        }

        let layout = Self {
            column_count: columns as u64,
            row_count: rows as u64,
            band_count,
            pixel_type,
            first_strip_offset: 0,
        };

        if tag_u64_or(decoder, Tag::Compression, 1)? != 1 {
            return Ok((layout, false));
        }
        let (Some(offsets), Some(counts)) = (
            tag_u64s(decoder, Tag::StripOffsets)?,
            tag_u64s(decoder, Tag::StripByteCounts)?,
        ) else {
            return Ok((layout, false));
        };
        let Some(&first) = offsets.first() else {
            return Ok((layout, false));
        };
        let contiguous = offsets.len() == counts.len()
            && offsets
                .windows(2)
                .zip(&counts)
                .all(|(pair, count)| pair[0] + count == pair[1]);
        let total: u64 = counts.iter().sum();
        if !contiguous || total < layout.row_bytes() * layout.row_count {
            return Ok((layout, false));
        }

        Ok((
            Self {
                first_strip_offset: first,
                ..layout
            },
            true,
        ))
    }

    /// Bytes per pixel: all bands of one sample.
    pub fn pixel_bytes(&self) -> u64 {
        self.band_count as u64 * self.pixel_type.byte_size() as u64
    }

    pub fn row_bytes(&self) -> u64 {
        self.column_count * self.pixel_bytes()
    }

    pub fn area(&self) -> Area {
        Area::pixels(0, 0, self.column_count - 1, self.row_count - 1)
    }

    /// File byte range holding columns `first_column..=last_column` of
    /// `row`.
    pub fn row_byte_range(&self, row: u64, first_column: u64, last_column: u64) -> Result<Range<u64>> {
        if row >= self.row_count {
            return Err(SptwError::bad_argument(format!(
                "row {row} outside 0..{}",
                self.row_count
            )));
        }
        if first_column > last_column || last_column >= self.column_count {
            return Err(SptwError::bad_argument(format!(
                "columns {first_column}..={last_column} outside 0..{}",
                self.column_count
            )));
        }
        let start = self.first_strip_offset + row * self.row_bytes() + first_column * self.pixel_bytes();
        Ok(start..start + (last_column - first_column + 1) * self.pixel_bytes())
    }

    /// File byte ranges covered by a pixel `area`, one per row, or a single
    /// range when the area spans whole rows.
    pub fn area_byte_ranges(&self, area: &Area) -> Result<Vec<Range<u64>>> {
        if area.is_invalid() {
            return Err(SptwError::bad_argument("invalid area"));
        }
        let (first_row, last_row) = (area.first_row(), area.last_row());
        let (first_column, last_column) = (area.first_column(), area.last_column());
        if first_column == 0 && last_column + 1 == self.column_count {
            let start = self.row_byte_range(first_row, first_column, last_column)?.start;
            let end = self.row_byte_range(last_row, first_column, last_column)?.end;
            return Ok(vec![start..end]);
        }
        (first_row..=last_row)
            .map(|row| self.row_byte_range(row, first_column, last_column))
            .collect()
    }
}

/// A write handle on a raster laid out as one contiguous strip.
#[derive(Debug)]
pub struct PTiff {
    file: File,
    path: PathBuf,
    layout: StripLayout,
}

/// Open `path` for positioned writes.
pub fn open_raster(path: impl AsRef<Path>) -> Result<PTiff> {
    PTiff::open(path)
}

/// Flush `raster` to disk and release it.
pub fn close_raster(raster: PTiff) -> Result<()> {
    raster.close()
}

impl PTiff {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let layout = StripLayout::read(&file)?;
        debug!(
            path = %path.display(),
            columns = layout.column_count,
            rows = layout.row_count,
            bands = layout.band_count,
            strip_offset = layout.first_strip_offset,
            "Raster opened for writing"
        );
        Ok(Self { file, path, layout })
    }

    pub fn layout(&self) -> &StripLayout {
        &self.layout
    }

    pub fn path(&self) -> &Path {
        &self.path
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

    /// Write whole rows `first_row..=last_row` from `buffer`.
    pub fn write_rows(&self, buffer: &[u8], first_row: u64, last_row: u64) -> Result<()> {
        if first_row > last_row {
            return Err(SptwError::bad_argument(format!(
                "first row {first_row} after last row {last_row}"
            )));
        }
        let area = Area::pixels(0, first_row, self.layout.column_count - 1, last_row);
        let ranges = self.layout.area_byte_ranges(&area)?;
        self.write_ranges(buffer, &ranges)
    }

    /// Write columns `first_column..=last_column` of one `row`.
    pub fn write_subrow(&self, buffer: &[u8], row: u64, first_column: u64, last_column: u64) -> Result<()> {
        let range = self.layout.row_byte_range(row, first_column, last_column)?;
        self.write_ranges(buffer, &[range])
    }

    /// Write a chunk's pixels at its location in the raster.
    pub fn write_raster_chunk(&self, chunk: &RasterChunk) -> Result<()> {
        if chunk.pixel_type != self.layout.pixel_type || chunk.band_count != self.layout.band_count {
            return Err(SptwError::bad_argument(format!(
                "chunk holds {} bands of {}, raster {} bands of {}",
                chunk.band_count, chunk.pixel_type, self.layout.band_count, self.layout.pixel_type
            )));
        }
        if !chunk.is_allocated() {
            return Err(SptwError::bad_argument("chunk holds no pixels"));
        }
        let ranges = self.layout.area_byte_ranges(&chunk.area())?;
        self.write_ranges(chunk.pixels.as_bytes(), &ranges)
    }

    /// Flush to disk and release the handle.
    pub fn close(self) -> Result<()> {
        self.file.sync_data()?;
        debug!(path = %self.path.display(), "Raster closed");
        Ok(())
    }

    /// Fill `ranges` in order from consecutive bytes of `buffer`. Writes
    /// are positioned, so the file cursor is never moved.
    fn write_ranges(&self, buffer: &[u8], ranges: &[Range<u64>]) -> Result<()> {
        let needed: u64 = ranges.iter().map(|r| r.end - r.start).sum();
        if (buffer.len() as u64) < needed {
            return Err(SptwError::bad_argument(format!(
                "buffer holds {} bytes, write needs {needed}",
                buffer.len()
            )));
        }

        let mut consumed = 0usize;
        for range in ranges {
            let len = (range.end - range.start) as usize;
            let bytes = &buffer[consumed..consumed + len];
            self.file
                .write_all_at(bytes, range.start)
                .map_err(|source| SptwError::WriteError {
                    offset: range.start,
                    len,
                    source,
                })?;
            consumed += len;
        }
        counter!("sptw_bytes_written_total").increment(needed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> StripLayout {
        StripLayout {
            column_count: 10,
            row_count: 6,
            band_count: 2,
            pixel_type: PixelType::U16,
            first_strip_offset: 8,
        }
    }

    #[test]
    fn test_row_byte_range() {
        let layout = layout();
        assert_eq!(layout.pixel_bytes(), 4);
        assert_eq!(layout.row_byte_range(0, 0, 9).unwrap(), 8..48);
        assert_eq!(layout.row_byte_range(2, 3, 4).unwrap(), 8 + 80 + 12..8 + 80 + 20);
        assert!(layout.row_byte_range(6, 0, 0).is_err());
        assert!(layout.row_byte_range(0, 5, 10).is_err());
        assert!(layout.row_byte_range(0, 5, 4).is_err());
    }

    #[test]
    fn test_full_width_area_is_one_range() {
        let layout = layout();
        let ranges = layout.area_byte_ranges(&Area::pixels(0, 1, 9, 3)).unwrap();
        assert_eq!(ranges, vec![48..168]);
    }

    #[test]
    fn test_partial_area_is_one_range_per_row() {
        let layout = layout();
        let ranges = layout.area_byte_ranges(&Area::pixels(2, 0, 5, 2)).unwrap();
        assert_eq!(ranges.len(), 3);
        assert!(ranges.iter().all(|r| r.end - r.start == 16));
        assert!(layout.area_byte_ranges(&Area::invalid()).is_err());
    }
}
