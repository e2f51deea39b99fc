//! Partition completeness across strategies and raster shapes.

use raster_common::Area;
use reproject::{
    assign_partitions, partition, partition_by_count, partition_by_quadtree, partition_by_size,
    partition_by_tile, PartitionStrategy, ReprojectConfig,
};

/// Every pixel of the raster is covered by exactly one partition.
fn assert_exact_cover(partitions: &[Area], row_count: u64, column_count: u64) {
    let mut hits = vec![0u32; (row_count * column_count) as usize];
    for area in partitions {
        assert!(area.last_row() < row_count && area.last_column() < column_count, "{area}");
        for row in area.first_row()..=area.last_row() {
            for column in area.first_column()..=area.last_column() {
                hits[(row * column_count + column) as usize] += 1;
            }
        }
    }
    let bad = hits.iter().filter(|h| **h != 1).count();
    assert_eq!(bad, 0, "{bad} pixels covered zero or several times");
}

#[test]
fn test_thousand_rows_by_seven() {
    let partitions = partition_by_count(1000, 25, 7).unwrap();
    assert_eq!(partitions.len(), 7);

    let rows: Vec<u64> = partitions.iter().map(Area::row_count).collect();
    assert_eq!(rows.iter().sum::<u64>(), 1000);
    let (min, max) = (rows.iter().min().unwrap(), rows.iter().max().unwrap());
    assert!(max - min <= 1, "row counts {rows:?}");
    assert_exact_cover(&partitions, 1000, 25);
}

#[test]
fn test_count_partitions_every_size() {
    for row_count in [1, 2, 7, 13, 100] {
        for count in 1..=row_count.min(9) {
            let partitions = partition_by_count(row_count, 3, count as usize).unwrap();
            assert_eq!(partitions.len() as u64, count);
            assert_exact_cover(&partitions, row_count, 3);
        }
    }
}

#[test]
fn test_size_partitions_every_shape() {
    for (rows, columns) in [(1, 1), (1, 40), (40, 1), (17, 23), (128, 64)] {
        for max_pixels in [1, 5, 64, 10_000] {
            let partitions = partition_by_size(rows, columns, max_pixels).unwrap();
            assert!(partitions.iter().all(|p| p.pixel_count() <= max_pixels));
            assert_exact_cover(&partitions, rows, columns);
        }
    }
}

#[test]
fn test_tile_partitions_every_shape() {
    for (rows, columns) in [(5, 5), (33, 70), (256, 256)] {
        let partitions = partition_by_tile(rows, columns, 16, 16, 100).unwrap();
        assert_exact_cover(&partitions, rows, columns);
    }
}

#[test]
fn test_quadtree_partitions_every_budget() {
    for max_leaves in [4, 7, 16, 40] {
        let partitions = partition_by_quadtree(60, 45, max_leaves).unwrap();
        assert!(partitions.len() <= max_leaves);
        assert_exact_cover(&partitions, 60, 45);
    }
}

#[test]
fn test_ranks_share_every_partition_once() {
    let config = ReprojectConfig {
        partition_strategy: PartitionStrategy::Size,
        partition_size: 50,
        ..Default::default()
    };
    let partitions = partition(&config, 90, 31).unwrap();

    for process_count in [1, 2, 3, 8] {
        let assigned: Vec<Area> = (0..process_count)
            .flat_map(|rank| assign_partitions(&partitions, rank, process_count).unwrap())
            .collect();
        assert_eq!(assigned.len(), partitions.len());
        assert_exact_cover(&assigned, 90, 31);
    }
}
