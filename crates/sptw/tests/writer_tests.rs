//! Create, write from several handles at once, and read back.

use std::ops::Range;
use std::sync::Arc;
use std::thread;

use projection::{parse_srs, ProjCode, Projection};
use raster_common::{Area, GeoTransform, PixelType};
use reproject::{partition_by_size, PixelBuffer, RasterChunk};
use sptw::{
    close_raster, create_raster, open_raster, RasterDataset, RasterDescription, SptwError, StripLayout,
};
use test_utils::{create_sequence_grid, srs, temp_raster_path, temp_test_dir};

fn geographic() -> Arc<Projection> {
    Arc::new(Projection::from_code(ProjCode::Geographic).unwrap())
}

fn sinusoidal() -> Arc<Projection> {
    Arc::new(Projection::new(parse_srs(srs::SINUSOIDAL).unwrap()).unwrap())
}

fn u16_bytes(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

#[test]
fn test_created_raster_reads_back_zeroed() {
    let dir = temp_test_dir();
    let path = temp_raster_path(&dir, "zeros.tif");
    let gt = GeoTransform::north_up(-1000.0, 2000.0, 250.0);
    let description = RasterDescription::new(7, 5, 2, PixelType::I16, gt);
    create_raster(&path, &description, &sinusoidal()).unwrap();

    let mut dataset = RasterDataset::open(&path).unwrap();
    assert_eq!(dataset.column_count(), 7);
    assert_eq!(dataset.row_count(), 5);
    assert_eq!(dataset.band_count(), 2);
    assert_eq!(dataset.pixel_type(), PixelType::I16);
    assert_eq!(dataset.geotransform(), &gt);

    let text = dataset.projection_text().unwrap().to_string();
    let spec = parse_srs(&text).unwrap();
    assert_eq!(spec.code, ProjCode::Sinusoidal);

    let pixels = dataset.read_region(&dataset.area()).unwrap();
    assert_eq!(pixels, PixelBuffer::I16(vec![0; 7 * 5 * 2]));
}

#[test]
fn test_parallel_handles_write_disjoint_partitions() {
    let dir = temp_test_dir();
    let path = temp_raster_path(&dir, "parallel.tif");
    let (columns, rows) = (37u64, 29u64);
    let gt = GeoTransform::north_up(-180.0, 90.0, 1.0);
    create_raster(
        &path,
        &RasterDescription::new(columns, rows, 1, PixelType::U16, gt),
        &geographic(),
    )
    .unwrap();

    let expected = create_sequence_grid(columns as usize, rows as usize);
    let partitions = partition_by_size(rows, columns, 60).unwrap();
    let workers = 4;

    thread::scope(|scope| {
        for rank in 0..workers {
            let (path, expected, partitions) = (&path, &expected, &partitions);
            scope.spawn(move || {
                let raster = open_raster(path).unwrap();
                for area in partitions.iter().skip(rank).step_by(workers) {
                    let values: Vec<u16> = (area.first_row()..=area.last_row())
                        .flat_map(|row| {
                            (area.first_column()..=area.last_column())
                                .map(move |column| (row * columns + column) as usize)
                        })
                        .map(|i| expected[i])
                        .collect();
                    let chunk = RasterChunk::with_pixels(
                        area,
                        &gt,
                        1,
                        geographic(),
                        PixelBuffer::U16(values),
                    )
                    .unwrap();
                    raster.write_raster_chunk(&chunk).unwrap();
                }
                close_raster(raster).unwrap();
            });
        }
    });

    let mut dataset = RasterDataset::open(&path).unwrap();
    let pixels = dataset.read_region(&dataset.area()).unwrap();
    assert_eq!(pixels, PixelBuffer::U16(expected.clone()));

    // A window read returns just that window.
    let window = dataset.read_region(&Area::pixels(3, 2, 5, 3)).unwrap();
    let row = |r: usize| expected[r * columns as usize + 3..r * columns as usize + 6].to_vec();
    assert_eq!(window, PixelBuffer::U16([row(2), row(3)].concat()));
}

#[test]
fn test_write_rows_and_subrow() {
    let dir = temp_test_dir();
    let path = temp_raster_path(&dir, "rows.tif");
    let gt = GeoTransform::north_up(0.0, 4.0, 1.0);
    create_raster(&path, &RasterDescription::new(4, 4, 1, PixelType::U16, gt), &geographic()).unwrap();

    let raster = open_raster(&path).unwrap();
    raster.write_rows(&u16_bytes(&[1, 2, 3, 4, 5, 6, 7, 8]), 1, 2).unwrap();
    raster.write_subrow(&u16_bytes(&[9, 9]), 3, 2, 3).unwrap();
    raster.close().unwrap();

    let mut dataset = RasterDataset::open(&path).unwrap();
    let pixels = dataset.read_region(&dataset.area()).unwrap();
    assert_eq!(
        pixels,
        PixelBuffer::U16(vec![0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 9, 9])
    );
}

#[test]
fn test_shared_handle_writes_from_many_threads() {
    let dir = temp_test_dir();
    let path = temp_raster_path(&dir, "shared.tif");
    let (columns, rows) = (9u64, 8u64);
    let gt = GeoTransform::north_up(0.0, 8.0, 1.0);
    create_raster(&path, &RasterDescription::new(columns, rows, 1, PixelType::U16, gt), &geographic())
        .unwrap();

    // Every row goes through the same handle, in no particular order.
    let raster = open_raster(&path).unwrap();
    let expected = create_sequence_grid(columns as usize, rows as usize);
    thread::scope(|scope| {
        for row in (0..rows).rev() {
            let (raster, expected) = (&raster, &expected);
            scope.spawn(move || {
                let start = (row * columns) as usize;
                let values = &expected[start..start + columns as usize];
                raster.write_rows(&u16_bytes(values), row, row).unwrap();
            });
        }
    });
    close_raster(raster).unwrap();

    let mut dataset = RasterDataset::open(&path).unwrap();
    assert_eq!(dataset.read_region(&dataset.area()).unwrap(), PixelBuffer::U16(expected));
}

#[test]
fn test_short_buffers_and_bad_rows_are_rejected() {
    let dir = temp_test_dir();
    let path = temp_raster_path(&dir, "bad.tif");
    let gt = GeoTransform::north_up(0.0, 4.0, 1.0);
    create_raster(&path, &RasterDescription::new(4, 4, 1, PixelType::U8, gt), &geographic()).unwrap();

    let raster = open_raster(&path).unwrap();
    assert!(matches!(
        raster.write_rows(&[0u8; 7], 0, 1),
        Err(SptwError::BadArgument(_))
    ));
    assert!(matches!(
        raster.write_rows(&[0u8; 4], 4, 4),
        Err(SptwError::BadArgument(_))
    ));
    assert!(matches!(
        raster.write_subrow(&[0u8; 4], 0, 2, 5),
        Err(SptwError::BadArgument(_))
    ));

    let wrong_type = RasterChunk::allocated(&Area::pixels(0, 0, 1, 1), &gt, PixelType::U16, 1, geographic());
    assert!(matches!(
        raster.write_raster_chunk(&wrong_type),
        Err(SptwError::BadArgument(_))
    ));
}

#[test]
fn test_partition_byte_ranges_are_disjoint() {
    let layout = StripLayout {
        column_count: 123,
        row_count: 77,
        band_count: 3,
        pixel_type: PixelType::F32,
        first_strip_offset: 16,
    };
    let partitions = partition_by_size(77, 123, 500).unwrap();
    let mut ranges: Vec<Range<u64>> = partitions
        .iter()
        .flat_map(|area| layout.area_byte_ranges(area).unwrap())
        .collect();
    ranges.sort_by_key(|r| r.start);

    for pair in ranges.windows(2) {
        assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
    }
    let total: u64 = ranges.iter().map(|r| r.end - r.start).sum();
    assert_eq!(total, layout.row_bytes() * layout.row_count);
    assert_eq!(ranges.first().unwrap().start, 16);
    assert_eq!(ranges.last().unwrap().end, 16 + total);
}

#[test]
fn test_compressed_input_is_decoded() {
    use tiff::encoder::{colortype, compression::Lzw, TiffEncoder};

    let dir = temp_test_dir();
    let path = temp_raster_path(&dir, "lzw.tif");
    let values = create_sequence_grid(6, 5);
    {
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        let image = encoder
            .new_image_with_compression::<colortype::Gray16, _>(6, 5, Lzw)
            .unwrap();
        image.write_data(&values).unwrap();
    }

    let mut dataset = RasterDataset::open(&path).unwrap();
    assert_eq!(dataset.pixel_type(), PixelType::U16);
    assert!(dataset.projection_text().is_none());
    assert!(open_raster(&path).is_err(), "compressed rasters are not writable in place");

    let pixels = dataset.read_region(&Area::pixels(1, 1, 2, 2)).unwrap();
    assert_eq!(pixels, PixelBuffer::U16(vec![7, 8, 13, 14]));
}
