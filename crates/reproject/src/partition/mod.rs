//! Division of an output raster's pixel space into work units.
//!
//! Every strategy returns inclusive pixel areas that cover the raster
//! exactly once. Count, size and tile partitions are ordered by
//! (first row, first column) so consecutive partitions touch nearby bytes
//! of the output file.

pub mod quadtree;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use raster_common::Area;
use tracing::debug;

use crate::config::{PartitionStrategy, ReprojectConfig};
use crate::error::{CoordinationError, ReprojectError, Result};

pub use quadtree::{MeshDir, QuadId, QuadTree, Quadrant, SubSpaceInfo};

/// Seed shared by every process so all of them shuffle alike.
const SHUFFLE_SEED: u64 = 42;

/// `count` horizontal bands whose row counts differ by at most one.
pub fn partition_by_count(row_count: u64, column_count: u64, count: usize) -> Result<Vec<Area>> {
    check_dims(row_count, column_count)?;
    if count == 0 {
        return Err(ReprojectError::config("partition count must be > 0"));
    }
    let count = count as u64;
    if count > row_count {
        return Err(ReprojectError::config(format!(
            "cannot cut {row_count} rows into {count} bands"
        )));
    }

    let base = row_count / count;
    let extra = row_count % count;
    let mut first_row = 0;
    let partitions = (0..count)
        .map(|i| {
            let rows = base + u64::from(i < extra);
            let area = Area::pixels(0, first_row, column_count - 1, first_row + rows - 1);
            first_row += rows;
            area
        })
        .collect();
    Ok(partitions)
}

/// Quad subdivision until every partition holds at most `max_pixels`
/// pixels.
pub fn partition_by_size(row_count: u64, column_count: u64, max_pixels: u64) -> Result<Vec<Area>> {
    check_dims(row_count, column_count)?;
    if max_pixels == 0 {
        return Err(ReprojectError::config("partition size must be > 0"));
    }

    let mut partitions = Vec::new();
    quad_split(
        Area::pixels(0, 0, column_count - 1, row_count - 1),
        max_pixels,
        &mut partitions,
    );
    sort_for_locality(&mut partitions);
    Ok(partitions)
}

/// Partitions that never straddle a `tile_rows` x `tile_columns` block:
/// the raster is cut on the tile grid and tiles larger than `max_pixels`
/// are quad-split.
pub fn partition_by_tile(
    row_count: u64,
    column_count: u64,
    tile_rows: u64,
    tile_columns: u64,
    max_pixels: u64,
) -> Result<Vec<Area>> {
    check_dims(row_count, column_count)?;
    if tile_rows == 0 || tile_columns == 0 {
        return Err(ReprojectError::config("tile size must be > 0"));
    }
    if max_pixels == 0 {
        return Err(ReprojectError::config("partition size must be > 0"));
    }

    let mut partitions = Vec::new();
    for first_row in (0..row_count).step_by(tile_rows as usize) {
        let last_row = (first_row + tile_rows).min(row_count) - 1;
        for first_column in (0..column_count).step_by(tile_columns as usize) {
            let last_column = (first_column + tile_columns).min(column_count) - 1;
            quad_split(
                Area::pixels(first_column, first_row, last_column, last_row),
                max_pixels,
                &mut partitions,
            );
        }
    }
    sort_for_locality(&mut partitions);
    Ok(partitions)
}

/// Leaves of a pixel-count [`QuadTree`] grown to at most `max_leaves`
/// leaves, heaviest first.
pub fn partition_by_quadtree(row_count: u64, column_count: u64, max_leaves: usize) -> Result<Vec<Area>> {
    check_dims(row_count, column_count)?;
    let infos = quadtree::decompose(row_count, column_count, max_leaves.max(4))?;
    Ok(infos.iter().map(SubSpaceInfo::work_area).collect())
}

/// Partition a `row_count` x `column_count` raster the way `config` asks.
pub fn partition(config: &ReprojectConfig, row_count: u64, column_count: u64) -> Result<Vec<Area>> {
    let partitions = match config.partition_strategy {
        PartitionStrategy::Count => partition_by_count(row_count, column_count, config.band_count())?,
        PartitionStrategy::Size => partition_by_size(row_count, column_count, config.partition_size)?,
        PartitionStrategy::Tile => partition_by_tile(
            row_count,
            column_count,
            config.tile_size,
            config.tile_size,
            config.partition_size,
        )?,
        PartitionStrategy::Quadtree => {
            partition_by_quadtree(row_count, column_count, config.band_count())?
        }
    };
    debug!(
        strategy = %config.partition_strategy,
        partitions = partitions.len(),
        "Output raster partitioned"
    );
    Ok(partitions)
}

/// The partitions `rank` of `process_count` works on.
///
/// Partitions are shuffled within consecutive groups of `process_count`
/// with a fixed seed, then dealt round-robin. Every process computes the
/// same shuffle, so the assignment is a disjoint cover without any
/// communication.
pub fn assign_partitions(partitions: &[Area], rank: usize, process_count: usize) -> Result<Vec<Area>> {
    if rank >= process_count {
        return Err(CoordinationError::InvalidRank {
            rank,
            size: process_count,
        }
        .into());
    }

    let mut shuffled = partitions.to_vec();
    let mut rng = ChaCha8Rng::seed_from_u64(SHUFFLE_SEED);
    for group in shuffled.chunks_mut(process_count) {
        group.shuffle(&mut rng);
    }

    Ok(shuffled
        .into_iter()
        .enumerate()
        .filter(|(i, _)| i % process_count == rank)
        .map(|(_, area)| area)
        .collect())
}

fn check_dims(row_count: u64, column_count: u64) -> Result<()> {
    if row_count == 0 || column_count == 0 {
        return Err(ReprojectError::config(format!(
            "cannot partition a {column_count}x{row_count} raster"
        )));
    }
    Ok(())
}

/// Split `area` into halves along every dimension longer than one pixel
/// until each piece is small enough.
fn quad_split(area: Area, max_pixels: u64, out: &mut Vec<Area>) {
    let mut stack = vec![area];
    while let Some(area) = stack.pop() {
        let (rows, columns) = (area.row_count(), area.column_count());
        if rows * columns <= max_pixels || (rows == 1 && columns == 1) {
            out.push(area);
            continue;
        }

        let (first_column, last_column) = (area.first_column(), area.last_column());
        let (first_row, last_row) = (area.first_row(), area.last_row());
        let column_cuts = if columns > 1 {
            let middle = first_column + (columns - 1) / 2;
            vec![(first_column, middle), (middle + 1, last_column)]
        } else {
            vec![(first_column, last_column)]
        };
        let row_cuts = if rows > 1 {
            let middle = first_row + (rows - 1) / 2;
            vec![(first_row, middle), (middle + 1, last_row)]
        } else {
            vec![(first_row, last_row)]
        };

        for &(r0, r1) in &row_cuts {
            for &(c0, c1) in &column_cuts {
                stack.push(Area::pixels(c0, r0, c1, r1));
            }
        }
    }
}

fn sort_for_locality(partitions: &mut [Area]) {
    partitions.sort_by(|a, b| {
        a.ul.y
            .total_cmp(&b.ul.y)
            .then_with(|| a.ul.x.total_cmp(&b.ul.x))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(partitions: &[Area], row_count: u64, column_count: u64) {
        let mut hits = vec![0u8; (row_count * column_count) as usize];
        for area in partitions {
            for row in area.first_row()..=area.last_row() {
                for column in area.first_column()..=area.last_column() {
                    hits[(row * column_count + column) as usize] += 1;
                }
            }
        }
        assert!(hits.iter().all(|h| *h == 1), "partitions overlap or leave gaps");
    }

    #[test]
    fn test_count_bands() {
        let parts = partition_by_count(10, 4, 3).unwrap();
        assert_eq!(
            parts,
            vec![
                Area::pixels(0, 0, 3, 3),
                Area::pixels(0, 4, 3, 6),
                Area::pixels(0, 7, 3, 9),
            ]
        );
        assert_exact_cover(&parts, 10, 4);
    }

    #[test]
    fn test_count_errors() {
        assert!(matches!(partition_by_count(10, 4, 0), Err(ReprojectError::Config(_))));
        assert!(matches!(partition_by_count(3, 4, 4), Err(ReprojectError::Config(_))));
        assert!(matches!(partition_by_count(0, 4, 1), Err(ReprojectError::Config(_))));
    }

    #[test]
    fn test_size_respects_limit() {
        let parts = partition_by_size(37, 53, 100).unwrap();
        assert!(parts.iter().all(|p| p.pixel_count() <= 100));
        assert_exact_cover(&parts, 37, 53);
    }

    #[test]
    fn test_size_single_column() {
        let parts = partition_by_size(9, 1, 2).unwrap();
        assert!(parts.iter().all(|p| p.column_count() == 1 && p.pixel_count() <= 2));
        assert_exact_cover(&parts, 9, 1);
    }

    #[test]
    fn test_size_whole_raster_when_small() {
        assert_eq!(partition_by_size(5, 5, 25).unwrap(), vec![Area::pixels(0, 0, 4, 4)]);
    }

    #[test]
    fn test_size_sorted_for_locality() {
        let parts = partition_by_size(16, 16, 16).unwrap();
        assert!(parts
            .windows(2)
            .all(|w| (w[0].ul.y, w[0].ul.x) <= (w[1].ul.y, w[1].ul.x)));
    }

    #[test]
    fn test_tile_never_straddles_blocks() {
        let parts = partition_by_tile(100, 70, 32, 32, 300).unwrap();
        assert_exact_cover(&parts, 100, 70);
        for p in &parts {
            assert!(p.pixel_count() <= 300);
            assert_eq!(p.first_row() / 32, p.last_row() / 32, "{p}");
            assert_eq!(p.first_column() / 32, p.last_column() / 32, "{p}");
        }
    }

    #[test]
    fn test_quadtree_partitions_cover() {
        let parts = partition_by_quadtree(50, 40, 10).unwrap();
        assert_eq!(parts.len(), 10);
        assert_exact_cover(&parts, 50, 40);
    }

    #[test]
    fn test_dispatch_by_strategy() {
        let mut config = ReprojectConfig {
            partition_strategy: PartitionStrategy::Count,
            processes: 4,
            ..Default::default()
        };
        assert_eq!(partition(&config, 100, 10).unwrap().len(), 4);

        config.partition_strategy = PartitionStrategy::Size;
        config.partition_size = 250;
        assert!(partition(&config, 100, 10).unwrap().iter().all(|p| p.pixel_count() <= 250));

        config.partition_strategy = PartitionStrategy::Tile;
        config.tile_size = 0;
        assert!(partition(&config, 100, 10).is_err());
    }

    #[test]
    fn test_assignment_is_disjoint_cover() {
        let parts = partition_by_size(64, 64, 64).unwrap();
        let mut assigned: Vec<Area> = (0..3)
            .flat_map(|rank| assign_partitions(&parts, rank, 3).unwrap())
            .collect();
        assert_eq!(assigned.len(), parts.len());
        sort_for_locality(&mut assigned);
        assert_eq!(assigned, parts);
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let parts = partition_by_size(64, 64, 16).unwrap();
        assert_eq!(
            assign_partitions(&parts, 1, 4).unwrap(),
            assign_partitions(&parts, 1, 4).unwrap()
        );
        assert!(assign_partitions(&parts, 4, 4).is_err());
        assert!(assign_partitions(&parts, 0, 0).is_err());
    }
}
