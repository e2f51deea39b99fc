//! Synthetic raster generators.
//!
//! Every generator returns pixels in row-major order (row 0 first) with one
//! band, so a test can predict the value at any pixel.

/// Creates a raster with every pixel set to `value`.
pub fn create_constant_grid<T: Copy>(width: usize, height: usize, value: T) -> Vec<T> {
    vec![value; width * height]
}

/// Creates a raster of `background` with a single pixel set to `value`.
///
/// Useful for checking where one source pixel lands after reprojection.
pub fn create_single_pixel_grid<T: Copy>(
    width: usize,
    height: usize,
    background: T,
    (col, row): (usize, usize),
    value: T,
) -> Vec<T> {
    let mut data = vec![background; width * height];
    if col < width && row < height {
        data[row * width + col] = value;
    }
    data
}

/// Creates an 8-bit raster that brightens from left to right.
///
/// Column 0 is 0 and the last column is 255; every row is identical.
pub fn create_gradient_grid(width: usize, height: usize) -> Vec<u8> {
    let step = 255.0 / (width.max(2) - 1) as f64;
    let row: Vec<u8> = (0..width).map(|col| (col as f64 * step).round() as u8).collect();
    row.iter().copied().cycle().take(width * height).collect()
}

/// Creates a 16-bit raster numbered `0, 1, 2, ...` in row-major order,
/// wrapping at 65535.
pub fn create_sequence_grid(width: usize, height: usize) -> Vec<u16> {
    (0..width * height).map(|i| (i % 65536) as u16).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_constant_grid() {
        let grid = create_constant_grid(10, 10, 42u16);
        assert_eq!(grid.len(), 100);
        assert!(grid.iter().all(|&v| v == 42));
    }

    #[test]
    fn test_create_single_pixel_grid() {
        let grid = create_single_pixel_grid(4, 3, 0u8, (2, 1), 9);
        assert_eq!(grid.iter().filter(|&&v| v == 9).count(), 1);
        assert_eq!(grid[6], 9); // row 1, col 2

        // Out-of-range pixel leaves the background untouched
        let grid = create_single_pixel_grid(4, 3, 0u8, (4, 0), 9);
        assert!(grid.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_create_gradient_grid() {
        let grid = create_gradient_grid(256, 2);
        assert_eq!(grid.len(), 512);
        assert_eq!(grid[0], 0);
        assert_eq!(grid[255], 255);
        assert_eq!(grid[256], 0); // second row starts over
    }

    #[test]
    fn test_create_sequence_grid() {
        let grid = create_sequence_grid(3, 2);
        assert_eq!(grid, vec![0, 1, 2, 3, 4, 5]);
    }
}
