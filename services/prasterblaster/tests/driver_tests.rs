//! End-to-end runs of the driver on small synthetic rasters.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use prasterblaster::{load_projection, run_rank, RunReport, RunRequest, ThreadGroup};
use projection::{ProjCode, Projection};
use raster_common::{Coordinate, GeoTransform, PixelType};
use reproject::{
    projected_minbox, LocalCoordinator, PartitionStrategy, PixelBuffer, RasterCoordTransformer,
    ReprojectConfig, Resampler,
};
use sptw::{create_raster, open_raster, RasterDataset, RasterDescription};
use test_utils::{
    assert_approx_eq, assert_coords_approx_eq, create_constant_grid, create_gradient_grid,
    create_single_pixel_grid, srs, temp_raster_path, temp_test_dir,
};

fn geographic() -> Arc<Projection> {
    Arc::new(Projection::from_code(ProjCode::Geographic).unwrap())
}

/// Write a single-band U8 raster through the parallel writer.
fn write_input(path: &Path, columns: u64, rows: u64, gt: GeoTransform, values: &[u8]) {
    let description = RasterDescription::new(columns, rows, 1, PixelType::U8, gt);
    create_raster(path, &description, &geographic()).unwrap();
    let raster = open_raster(path).unwrap();
    raster.write_rows(values, 0, rows - 1).unwrap();
    raster.close().unwrap();
}

fn read_u8(path: &Path) -> Vec<u8> {
    let mut dataset = RasterDataset::open(path).unwrap();
    match dataset.read_region(&dataset.area()).unwrap() {
        PixelBuffer::U8(values) => values,
        other => panic!("expected U8 output, got {:?}", other.pixel_type()),
    }
}

fn request(input: PathBuf, output: PathBuf, target: &str, config: ReprojectConfig) -> RunRequest {
    RunRequest {
        input,
        output,
        source_srs: None,
        target_srs: target.to_string(),
        config,
    }
}

/// Run `request` on `processes` ranks and return the root's report.
fn run_group(request: &RunRequest, processes: usize) -> RunReport {
    let mut results = ThreadGroup::run(processes, |c| run_rank(request, c));
    for (rank, result) in results.iter().enumerate().skip(1) {
        let outcome = result.as_ref().expect("rank panicked");
        assert!(outcome.as_ref().unwrap().is_none(), "rank {rank} returned a report");
    }
    results.remove(0).unwrap().unwrap().expect("root returns the report")
}

#[test]
fn test_constant_raster_to_mollweide() {
    let dir = temp_test_dir();
    let input = temp_raster_path(&dir, "constant.tif");
    let output = temp_raster_path(&dir, "mollweide.tif");
    let source_gt = GeoTransform::north_up(-5.0, 5.0, 1.0);
    write_input(&input, 10, 10, source_gt, &create_constant_grid(10, 10, 42u8));

    let config = ReprojectConfig {
        fill_value: 255.0,
        resampler: Resampler::Nearest,
        processes: 2,
        ..Default::default()
    };
    let request = request(input, output.clone(), srs::MOLLWEIDE, config);
    let report = run_group(&request, 2);
    let geometry = report.geometry;
    let values = read_u8(&output);
    assert_eq!(values.len() as u64, geometry.pixel_count());

    let target = load_projection(srs::MOLLWEIDE).unwrap();
    let rct = RasterCoordTransformer::new(
        Arc::clone(&target),
        geometry.ul(target.unit()),
        geometry.pixel_size,
        geographic(),
        Coordinate::new(-5.0, 5.0, geographic().unit()),
        1.0,
    );

    // Pixels right on the raster edge may go either way; everything else
    // is either a copy of the source or fill.
    let margin = 1e-6;
    let mut copied = 0;
    for row in 0..geometry.row_count {
        for column in 0..geometry.column_count {
            let value = values[(row * geometry.column_count + column) as usize];
            let footprint = rct.transform(Coordinate::pixel(column as f64, row as f64));
            if footprint.is_invalid() {
                assert_eq!(value, 255, "pixel ({column}, {row}) has no source");
                continue;
            }
            let ul = footprint.ul;
            let clearly_inside = ul.x >= margin && ul.y >= margin && ul.x < 10.0 - margin && ul.y < 10.0 - margin;
            let clearly_outside =
                ul.x < -margin || ul.y < -margin || ul.x > 10.0 + margin || ul.y > 10.0 + margin;
            if clearly_inside {
                assert_eq!(value, 42, "pixel ({column}, {row}) maps to {ul:?}");
                copied += 1;
            } else if clearly_outside {
                assert_eq!(value, 255, "pixel ({column}, {row}) maps to {ul:?}");
            }
        }
    }
    assert!(copied > 0);

    let stats = report.total_stats();
    assert_eq!(stats.pixels, geometry.pixel_count());
    assert_eq!(report.ranks.len(), 2);
}

#[test]
fn test_single_pixel_lands_inside_its_minbox() {
    let dir = temp_test_dir();
    let input = temp_raster_path(&dir, "single.tif");
    let output = temp_raster_path(&dir, "sinusoidal.tif");
    let (columns, rows) = (20u64, 20u64);
    let (hot_column, hot_row) = (7u64, 12u64);
    write_input(
        &input,
        columns,
        rows,
        GeoTransform::north_up(-10.0, 10.0, 1.0),
        &create_single_pixel_grid(20, 20, 0u8, (hot_column as usize, hot_row as usize), 1),
    );

    // Output pixels a quarter of a source pixel wide so the hot pixel is
    // always hit.
    let config = ReprojectConfig {
        fill_value: 0.0,
        resampler: Resampler::Max,
        pixel_size: Some(25_000.0),
        partition_strategy: PartitionStrategy::Tile,
        tile_size: 16,
        processes: 3,
        ..Default::default()
    };
    let request = request(input, output.clone(), srs::SINUSOIDAL, config);
    let geometry = run_group(&request, 3).geometry;
    let values = read_u8(&output);

    let target = load_projection(srs::SINUSOIDAL).unwrap();
    let minbox = projected_minbox(
        Coordinate::new(-10.0 + hot_column as f64, 10.0 - hot_row as f64, geographic().unit()),
        &geographic(),
        1.0,
        1,
        1,
        &target,
    );
    assert!(!minbox.is_invalid());

    let ps = geometry.pixel_size;
    let mut hits = 0;
    for (index, &value) in values.iter().enumerate() {
        if value != 1 {
            continue;
        }
        hits += 1;
        let column = index as u64 % geometry.column_count;
        let row = index as u64 / geometry.column_count;
        let x = geometry.ul_x + column as f64 * ps;
        let y = geometry.ul_y - row as f64 * ps;
        assert!(
            x >= minbox.ul.x - ps && x <= minbox.lr.x + ps && y <= minbox.ul.y + ps && y >= minbox.lr.y - ps,
            "pixel ({column}, {row}) at ({x}, {y}) outside {minbox}"
        );
    }
    assert!(hits > 0, "the hot pixel vanished");
}

#[test]
fn test_output_does_not_depend_on_process_count() {
    let dir = temp_test_dir();
    let input = temp_raster_path(&dir, "gradient.tif");
    let gt = GeoTransform::north_up(-20.0, 15.0, 2.0);
    write_input(&input, 20, 15, gt, &create_gradient_grid(20, 15));

    let run = |processes: usize, name: &str| {
        let output = temp_raster_path(&dir, name);
        let config = ReprojectConfig {
            fill_value: 255.0,
            resampler: Resampler::Mean,
            partition_strategy: PartitionStrategy::Size,
            partition_size: 37,
            processes,
            ..Default::default()
        };
        let request = request(input.clone(), output.clone(), srs::LAEA_NORTH_AMERICA, config);
        let report = if processes == 1 {
            run_rank(&request, &LocalCoordinator::new()).unwrap().unwrap()
        } else {
            run_group(&request, processes)
        };
        (report, read_u8(&output))
    };

    let (single_report, single) = run(1, "one.tif");
    let (group_report, group) = run(3, "three.tif");
    assert_eq!(single_report.geometry, group_report.geometry);
    assert_eq!(single, group);
    assert_eq!(single_report.total_stats(), group_report.total_stats());
    assert_eq!(
        group_report.total_partitions(),
        single_report.total_partitions()
    );
}

#[test]
fn test_explicit_source_projection_overrides_file() {
    let dir = temp_test_dir();
    let input = temp_raster_path(&dir, "override.tif");
    let output = temp_raster_path(&dir, "override_out.tif");
    write_input(&input, 4, 4, GeoTransform::north_up(0.0, 4.0, 1.0), &[7u8; 16]);

    let mut request = request(input, output.clone(), srs::GEOGRAPHIC, ReprojectConfig::default());
    request.source_srs = Some(srs::GEOGRAPHIC.to_string());
    let report = run_rank(&request, &LocalCoordinator::new()).unwrap().unwrap();

    // Geographic to geographic keeps the grid.
    assert_coords_approx_eq!((report.geometry.ul_x, report.geometry.ul_y), (0.0, 4.0), 1e-9);
    assert_approx_eq!(report.geometry.pixel_size, 1.0, 1e-12);
    assert_eq!(report.geometry.column_count, 4);
    assert_eq!(report.geometry.row_count, 4);
    assert_eq!(read_u8(&output), vec![7u8; 16]);
}

#[test]
fn test_bad_target_fails_every_rank() {
    let dir = temp_test_dir();
    let input = temp_raster_path(&dir, "input.tif");
    let output = temp_raster_path(&dir, "never.tif");
    write_input(&input, 4, 4, GeoTransform::north_up(0.0, 4.0, 1.0), &[1u8; 16]);

    let request = request(input, output.clone(), srs::INVALID, ReprojectConfig::default());
    let results = ThreadGroup::run(3, |c| run_rank(&request, c));
    for result in results {
        assert!(result.unwrap().is_err());
    }
    assert!(!output.exists());
}

#[test]
fn test_missing_input_fails() {
    let dir = temp_test_dir();
    let request = request(
        temp_raster_path(&dir, "missing.tif"),
        temp_raster_path(&dir, "out.tif"),
        srs::MOLLWEIDE,
        ReprojectConfig::default(),
    );
    let err = run_rank(&request, &LocalCoordinator::new()).unwrap_err();
    assert!(format!("{err:#}").contains("missing.tif"));
}
