//! Inclusive rectangles in pixel or projected space.
//!
//! Pixel space puts column in `x` and row in `y` with rows growing
//! downward, so a pixel area has `ul.y <= lr.y`. Projected space has `y`
//! growing northward, so a projected area has `ul.y >= lr.y`. Code that
//! needs rows counted upward goes through [`Area::flip_rows`] rather than
//! negating coordinates inline.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Coordinate, Unit};

/// Marker used for the invalid-area sentinel.
const INVALID: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub ul: Coordinate,
    pub lr: Coordinate,
    pub unit: Unit,
}

impl Area {
    pub fn new(ul: Coordinate, lr: Coordinate) -> Self {
        Self {
            ul,
            lr,
            unit: ul.unit,
        }
    }

    /// Pixel-space area spanning `first_column..=last_column` and
    /// `first_row..=last_row`.
    pub fn pixels(first_column: u64, first_row: u64, last_column: u64, last_row: u64) -> Self {
        Self::new(
            Coordinate::pixel(first_column as f64, first_row as f64),
            Coordinate::pixel(last_column as f64, last_row as f64),
        )
    }

    /// Projected area from its upper-left and lower-right corners.
    pub fn projected(ul_x: f64, ul_y: f64, lr_x: f64, lr_y: f64, unit: Unit) -> Self {
        Self::new(
            Coordinate::new(ul_x, ul_y, unit),
            Coordinate::new(lr_x, lr_y, unit),
        )
    }

    /// The "no valid mapping" sentinel.
    pub fn invalid() -> Self {
        Self::new(
            Coordinate::pixel(INVALID, INVALID),
            Coordinate::pixel(INVALID, INVALID),
        )
    }

    pub fn is_invalid(&self) -> bool {
        self.ul.x == INVALID && self.lr.x == INVALID
    }

    /// Number of pixel rows covered (inclusive bounds).
    pub fn row_count(&self) -> u64 {
        span(self.ul.y, self.lr.y)
    }

    /// Number of pixel columns covered (inclusive bounds).
    pub fn column_count(&self) -> u64 {
        span(self.ul.x, self.lr.x)
    }

    pub fn pixel_count(&self) -> u64 {
        self.row_count() * self.column_count()
    }

    pub fn first_row(&self) -> u64 {
        self.ul.y.max(0.0) as u64
    }

    pub fn last_row(&self) -> u64 {
        self.lr.y.max(0.0) as u64
    }

    pub fn first_column(&self) -> u64 {
        self.ul.x.max(0.0) as u64
    }

    pub fn last_column(&self) -> u64 {
        self.lr.x.max(0.0) as u64
    }

    /// True if the pixel at (`column`, `row`) lies inside this pixel area.
    pub fn contains_pixel(&self, column: u64, row: u64) -> bool {
        let (c, r) = (column as f64, row as f64);
        c >= self.ul.x && c <= self.lr.x && r >= self.ul.y && r <= self.lr.y
    }

    /// True if two pixel areas share at least one pixel.
    pub fn intersects(&self, other: &Area) -> bool {
        self.ul.x <= other.lr.x
            && other.ul.x <= self.lr.x
            && self.ul.y <= other.lr.y
            && other.ul.y <= self.lr.y
    }

    /// Convert a pixel area between the row-down and row-up conventions
    /// for a raster with `row_count` rows. Applying it twice is the
    /// identity.
    pub fn flip_rows(&self, row_count: u64) -> Self {
        let mut flipped = *self;
        flipped.ul.y = flip_row(self.ul.y, row_count);
        flipped.lr.y = flip_row(self.lr.y, row_count);
        flipped
    }

    /// Shift a pixel area by whole pixels.
    pub fn translate(&self, columns: f64, rows: f64) -> Self {
        let mut moved = *self;
        moved.ul.x += columns;
        moved.lr.x += columns;
        moved.ul.y += rows;
        moved.lr.y += rows;
        moved
    }
}

/// Row index in the opposite vertical convention.
pub fn flip_row(row: f64, row_count: u64) -> f64 {
    row_count as f64 - 1.0 - row
}

fn span(a: f64, b: f64) -> u64 {
    if b < a {
        0
    } else {
        (b - a) as u64 + 1
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[({}, {}) - ({}, {})]",
            self.ul.x, self.ul.y, self.lr.x, self.lr.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_counts_are_inclusive() {
        let area = Area::pixels(0, 0, 9, 4);
        assert_eq!(area.column_count(), 10);
        assert_eq!(area.row_count(), 5);
        assert_eq!(area.pixel_count(), 50);

        let single = Area::pixels(3, 3, 3, 3);
        assert_eq!(single.pixel_count(), 1);
    }

    #[test]
    fn test_invalid_sentinel() {
        assert!(Area::invalid().is_invalid());
        assert!(!Area::pixels(0, 0, 1, 1).is_invalid());
    }

    #[test]
    fn test_flip_rows_is_involution() {
        let area = Area::pixels(2, 1, 5, 3);
        let flipped = area.flip_rows(10);
        assert_eq!(flipped.ul.y, 8.0);
        assert_eq!(flipped.lr.y, 6.0);
        assert_eq!(flipped.flip_rows(10), area);
    }

    #[test]
    fn test_intersects_and_contains() {
        let a = Area::pixels(0, 0, 4, 4);
        let b = Area::pixels(4, 4, 8, 8);
        let c = Area::pixels(5, 0, 8, 3);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains_pixel(4, 0));
        assert!(!a.contains_pixel(5, 0));
    }
}
