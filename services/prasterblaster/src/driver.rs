//! The per-rank reprojection pipeline.
//!
//! Every rank runs [`run_rank`] with its own [`Coordinator`]. Rank 0 sizes
//! the output and creates the file; the geometry is broadcast so all ranks
//! agree on it, and each rank then reprojects and writes its own share of
//! the partitions through its own file handle.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::counter;
use projection::{parse_srs, Projection};
use raster_common::{Area, Coordinate, GeoTransform, PixelType};
use reproject::{
    assign_partitions, broadcast_value, default_pixel_size, gather_values, output_geometry, partition,
    projected_minbox, raster_minbox, reproject_chunk, Coordinator, OutputGeometry, PixelBuffer,
    RasterChunk, RasterGrid, ReprojectConfig,
};
use sptw::{close_raster, create_raster, open_raster, PTiff, RasterDataset, RasterDescription};
use tracing::{debug, error, info, info_span};

use crate::report::{RankReport, RunReport};

const ROOT: usize = 0;

/// One reprojection job, identical on every rank.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Overrides the projection stored in the input file.
    pub source_srs: Option<String>,
    pub target_srs: String,
    pub config: ReprojectConfig,
}

/// Run this rank's part of `request`.
///
/// Returns the gathered [`RunReport`] on the root rank and `None`
/// elsewhere. Any failure aborts the whole group so no rank is left
/// waiting at a collective.
pub fn run_rank<C: Coordinator + ?Sized>(request: &RunRequest, coordinator: &C) -> Result<Option<RunReport>> {
    let span = info_span!("rank", rank = coordinator.rank());
    let _enter = span.enter();

    match run(request, coordinator) {
        Ok(report) => Ok(report),
        Err(err) => {
            error!(error = %format!("{err:#}"), "Reprojection failed");
            coordinator.abort(&format!("rank {}: {err:#}", coordinator.rank()));
            Err(err)
        }
    }
}

fn run<C: Coordinator + ?Sized>(request: &RunRequest, coordinator: &C) -> Result<Option<RunReport>> {
    let started_at = Utc::now();
    let config = &request.config;
    config.validate().map_err(anyhow::Error::msg).context("invalid configuration")?;

    let mut dataset = RasterDataset::open(&request.input)
        .with_context(|| format!("failed to open input {}", request.input.display()))?;
    let source_gt = *dataset.geotransform();
    source_gt
        .validate_north_up()
        .with_context(|| format!("unsupported geotransform in {}", request.input.display()))?;

    let source_text = match (&request.source_srs, dataset.projection_text()) {
        (Some(text), _) => text.clone(),
        (None, Some(text)) => text.to_string(),
        (None, None) => anyhow::bail!(
            "{} carries no projection; pass --s_srs",
            request.input.display()
        ),
    };
    let source = load_projection(&source_text).context("invalid source projection")?;
    let target = load_projection(&request.target_srs).context("invalid target projection")?;

    let source_grid = RasterGrid {
        projection: Arc::clone(&source),
        ul: Coordinate::new(source_gt.ul_x(), source_gt.ul_y(), source.unit()),
        pixel_size: source_gt.pixel_size(),
        row_count: dataset.row_count(),
        column_count: dataset.column_count(),
    };
    let band_count = dataset.band_count();
    let pixel_type = dataset.pixel_type();

    let geometry = if coordinator.is_root() {
        let geometry = plan_output(&source_grid, &target, config)?;
        broadcast_value(coordinator, ROOT, Some(&geometry))?
    } else {
        broadcast_value::<OutputGeometry, _>(coordinator, ROOT, None)?
    };
    let destination_gt = GeoTransform::north_up(geometry.ul_x, geometry.ul_y, geometry.pixel_size);

    if coordinator.is_root() {
        let description = RasterDescription::new(
            geometry.column_count,
            geometry.row_count,
            band_count,
            pixel_type,
            destination_gt,
        );
        create_raster(&request.output, &description, &target)
            .with_context(|| format!("failed to create output {}", request.output.display()))?;
    }
    coordinator.barrier()?;

    let writer = open_raster(&request.output)
        .with_context(|| format!("failed to open output {}", request.output.display()))?;

    let destination_grid = RasterGrid {
        projection: Arc::clone(&target),
        ul: geometry.ul(target.unit()),
        pixel_size: geometry.pixel_size,
        row_count: geometry.row_count,
        column_count: geometry.column_count,
    };
    let partitions = partition(config, geometry.row_count, geometry.column_count)?;
    let assigned = assign_partitions(&partitions, coordinator.rank(), coordinator.size())?;
    info!(
        partitions = partitions.len(),
        assigned = assigned.len(),
        rows = geometry.row_count,
        columns = geometry.column_count,
        "Reprojecting"
    );

    let mut rank_report = RankReport {
        rank: coordinator.rank(),
        partitions: assigned.len(),
        ..Default::default()
    };
    let job = ChunkJob {
        source_grid: &source_grid,
        destination_grid: &destination_grid,
        destination_gt: &destination_gt,
        pixel_type,
        band_count,
        config,
    };
    for area in &assigned {
        job.run(area, &mut dataset, &writer, &mut rank_report)
            .with_context(|| format!("failed to reproject partition {area}"))?;
        counter!("prasterblaster_partitions_total").increment(1);
    }

    close_raster(writer).context("failed to close output")?;
    coordinator.barrier()?;

    let ranks = gather_values(coordinator, ROOT, &rank_report)?;
    Ok(ranks.map(|ranks| {
        let report = RunReport {
            input: request.input.clone(),
            output: request.output.clone(),
            started_at,
            finished_at: Utc::now(),
            processes: coordinator.size(),
            geometry,
            ranks,
        };
        let stats = report.total_stats();
        info!(
            pixels = stats.pixels,
            filled = stats.filled,
            elapsed_ms = report.elapsed_ms(),
            "Reprojection complete"
        );
        report
    }))
}

/// Size the output raster from the projected extent of the input.
pub fn plan_output(source: &RasterGrid, target: &Arc<Projection>, config: &ReprojectConfig) -> Result<OutputGeometry> {
    let minbox = projected_minbox(
        source.ul,
        &source.projection,
        source.pixel_size,
        source.row_count,
        source.column_count,
        target,
    );
    let pixel_size = config
        .pixel_size
        .unwrap_or_else(|| default_pixel_size(source.pixel_size, source.projection.unit(), target.unit()));
    let geometry = output_geometry(&minbox, pixel_size)?;
    info!(
        minbox = %minbox,
        pixel_size,
        rows = geometry.row_count,
        columns = geometry.column_count,
        "Output planned"
    );
    Ok(geometry)
}

/// Parse a PROJ or WKT definition.
pub fn load_projection(text: &str) -> Result<Arc<Projection>> {
    let spec = parse_srs(text).with_context(|| format!("cannot parse '{text}'"))?;
    let projection = Projection::new(spec)?;
    Ok(Arc::new(projection))
}

/// Everything a rank needs to turn one output area into pixels.
struct ChunkJob<'a> {
    source_grid: &'a RasterGrid,
    destination_grid: &'a RasterGrid,
    destination_gt: &'a GeoTransform,
    pixel_type: PixelType,
    band_count: usize,
    config: &'a ReprojectConfig,
}

impl ChunkJob<'_> {
    fn run(
        &self,
        area: &Area,
        dataset: &mut RasterDataset,
        writer: &PTiff,
        report: &mut RankReport,
    ) -> Result<()> {
        let mut destination = RasterChunk::empty(
            area,
            self.destination_gt,
            self.pixel_type,
            self.band_count,
            Arc::clone(&self.destination_grid.projection),
        );

        let source_area = raster_minbox(self.source_grid, self.destination_grid, area);
        if source_area.is_invalid() {
            debug!(area = %area, "Partition has no source pixels");
            destination.pixels =
                PixelBuffer::filled(self.pixel_type, destination.sample_count(), self.config.fill_value);
            report.empty_partitions += 1;
            report.stats.pixels += area.pixel_count();
            report.stats.filled += area.pixel_count();
        } else {
            let started = Instant::now();
            let source = dataset.read_chunk(&source_area, Arc::clone(&self.source_grid.projection))?;
            report.read_ms += elapsed_ms(started);

            let started = Instant::now();
            let stats = reproject_chunk(&source, &mut destination, self.config.fill_value, self.config.resampler)?;
            report.reproject_ms += elapsed_ms(started);
            report.stats.merge(stats);
        }

        let started = Instant::now();
        writer.write_raster_chunk(&destination)?;
        report.write_ms += elapsed_ms(started);
        Ok(())
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
