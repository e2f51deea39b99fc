//! Reduction of a source pixel area to one destination value.
//!
//! Pixel buffers are band-interleaved: the sample for `(column, row, band)`
//! lives at `(row * column_count + column) * band_count + band`.

use num_traits::ToPrimitive;
use raster_common::Area;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReprojectError;

/// A sample type a [`Resampler`] can work on.
pub trait Sample: Copy + PartialOrd + ToPrimitive + Send + Sync + 'static {
    /// Convert back from a computed value, rounding and saturating for
    /// integer types.
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_integer_sample {
    ($($t:ty),*) => {$(
        impl Sample for $t {
            #[inline]
            fn from_f64(value: f64) -> Self {
                value.round() as $t
            }
        }
    )*};
}

impl_integer_sample!(u8, u16, i16, u32, i32);

impl Sample for f32 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Sample for f64 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}

/// Resampling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Resampler {
    /// Value of the area's upper-left pixel.
    #[default]
    Nearest,
    Min,
    Max,
    /// Arithmetic mean over every pixel of the area.
    Mean,
}

impl Resampler {
    pub const ALL: [Resampler; 4] = [
        Resampler::Nearest,
        Resampler::Min,
        Resampler::Max,
        Resampler::Mean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
        }
    }

    /// Reduce `band` over the inclusive pixel `area` of `pixels`.
    ///
    /// `area` must already be clamped to the buffer. A single-pixel area
    /// returns that pixel for every strategy.
    pub fn resample<T: Sample>(
        &self,
        area: &Area,
        column_count: usize,
        band: usize,
        band_count: usize,
        pixels: &[T],
    ) -> T {
        let (first_column, first_row) = (area.ul.x as usize, area.ul.y as usize);
        let (last_column, last_row) = (area.lr.x as usize, area.lr.y as usize);
        let at = |column: usize, row: usize| pixels[(row * column_count + column) * band_count + band];

        let first = at(first_column, first_row);
        if (first_column == last_column && first_row == last_row) || *self == Self::Nearest {
            return first;
        }

        let samples = (first_row..=last_row)
            .flat_map(|row| (first_column..=last_column).map(move |column| (column, row)))
            .map(|(column, row)| at(column, row));

        match self {
            Self::Nearest => first,
            Self::Min => samples.fold(first, |acc, v| if v < acc { v } else { acc }),
            Self::Max => samples.fold(first, |acc, v| if v > acc { v } else { acc }),
            Self::Mean => {
                let (sum, count) = samples.fold((0.0, 0u64), |(sum, count), v| {
                    (sum + v.to_f64().unwrap_or(0.0), count + 1)
                });
                T::from_f64(sum / count as f64)
            }
        }
    }
}

impl FromStr for Resampler {
    type Err = ReprojectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "mean" => Ok(Self::Mean),
            other => Err(ReprojectError::config(format!(
                "unknown resampler '{other}' (expected nearest, min, max or mean)"
            ))),
        }
    }
}

impl fmt::Display for Resampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 4 x 3, single band:
    //  1  2  3  4
    //  5  6  7  8
    //  9 10 11 12
    fn grid() -> Vec<u16> {
        (1..=12).collect()
    }

    #[test]
    fn test_single_pixel_returns_pixel() {
        let pixels = grid();
        let area = Area::pixels(2, 1, 2, 1);
        for resampler in Resampler::ALL {
            assert_eq!(resampler.resample(&area, 4, 0, 1, &pixels), 7, "{resampler}");
        }

        let floats = [0.1f32, 0.2, 0.7];
        let area = Area::pixels(2, 0, 2, 0);
        for resampler in Resampler::ALL {
            assert_eq!(resampler.resample(&area, 3, 0, 1, &floats), 0.7);
        }
    }

    #[test]
    fn test_min_max_mean_over_area() {
        let pixels = grid();
        let area = Area::pixels(1, 0, 3, 1);
        assert_eq!(Resampler::Nearest.resample(&area, 4, 0, 1, &pixels), 2);
        assert_eq!(Resampler::Min.resample(&area, 4, 0, 1, &pixels), 2);
        assert_eq!(Resampler::Max.resample(&area, 4, 0, 1, &pixels), 8);
        // (2 + 3 + 4 + 6 + 7 + 8) / 6 = 5
        assert_eq!(Resampler::Mean.resample(&area, 4, 0, 1, &pixels), 5);
    }

    #[test]
    fn test_mean_divides_by_inclusive_count() {
        let pixels = [1.0f64, 2.0, 3.0, 4.0];
        let column = Area::pixels(0, 0, 0, 1);
        assert_eq!(Resampler::Mean.resample(&column, 2, 0, 1, &pixels), 2.0);
        let row = Area::pixels(0, 1, 1, 1);
        assert_eq!(Resampler::Mean.resample(&row, 2, 0, 1, &pixels), 3.5);
    }

    #[test]
    fn test_interleaved_bands() {
        // 2 x 1, three bands: (10, 20, 30) (40, 50, 60)
        let pixels = [10u8, 20, 30, 40, 50, 60];
        let area = Area::pixels(0, 0, 1, 0);
        assert_eq!(Resampler::Max.resample(&area, 2, 0, 3, &pixels), 40);
        assert_eq!(Resampler::Min.resample(&area, 2, 1, 3, &pixels), 20);
        assert_eq!(Resampler::Mean.resample(&area, 2, 2, 3, &pixels), 45);
    }

    #[test]
    fn test_unknown_name_is_config_error() {
        assert_eq!("MEAN".parse::<Resampler>().unwrap(), Resampler::Mean);
        assert!(matches!(
            "bilinear".parse::<Resampler>(),
            Err(ReprojectError::Config(_))
        ));
    }

    #[test]
    fn test_integer_mean_rounds() {
        let pixels = [1i16, 2];
        let area = Area::pixels(0, 0, 1, 0);
        assert_eq!(Resampler::Mean.resample(&area, 2, 0, 1, &pixels), 2);
    }
}
