//! Shared test utilities for the prasterblaster workspace.
//!
//! Raster generators, spatial reference fixtures, scratch paths, and
//! tolerance assertions for projected coordinates.
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Assert that two numbers differ by at most `tolerance`.
///
/// ```
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(111_319.49, 111_319.5, 0.1);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr $(,)?) => {{
        let (left, right, tolerance) = ($left as f64, $right as f64, $tolerance as f64);
        let diff = (left - right).abs();
        assert!(
            diff <= tolerance,
            "{} = {left} and {} = {right} differ by {diff} (tolerance {tolerance})",
            stringify!($left),
            stringify!($right),
        );
    }};
}

/// Assert that two `(x, y)` points agree on both axes within `tolerance`.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $tolerance:expr $(,)?) => {{
        $crate::assert_approx_eq!($x1, $x2, $tolerance);
        $crate::assert_approx_eq!($y1, $y2, $tolerance);
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_within_tolerance() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(-5.5_f32, -5.500001, 1e-4);
        assert_coords_approx_eq!((1.0001, 2.0001), (1.0, 2.0), 0.001);
    }

    #[test]
    #[should_panic(expected = "differ by")]
    fn test_outside_tolerance() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }
}
