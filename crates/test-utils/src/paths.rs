//! Scratch locations for rasters written by tests.

use std::path::PathBuf;

use tempfile::TempDir;

/// A temporary directory removed when the returned guard drops.
pub fn temp_test_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("prasterblaster-")
        .tempdir()
        .expect("Failed to create temporary test directory")
}

/// Path of a raster named `name` inside `dir`. Nothing is created.
pub fn temp_raster_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}
