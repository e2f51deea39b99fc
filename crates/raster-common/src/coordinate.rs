//! Coordinates tagged with the unit they are expressed in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::RasterError;

/// Linear and angular units understood by the projection library.
///
/// The discriminants are the GCTP unit codes and index the unit
/// conversion table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Unit {
    #[default]
    Undefined = -1,
    Radian = 0,
    Feet = 1,
    Meter = 2,
    ArcSecond = 3,
    Degree = 4,
    InternationalFeet = 5,
}

impl Unit {
    /// GCTP numeric unit code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look up a unit from its GCTP numeric code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Unit::Undefined),
            0 => Some(Unit::Radian),
            1 => Some(Unit::Feet),
            2 => Some(Unit::Meter),
            3 => Some(Unit::ArcSecond),
            4 => Some(Unit::Degree),
            5 => Some(Unit::InternationalFeet),
            _ => None,
        }
    }

    /// True for radians, arc seconds and degrees.
    pub fn is_angular(self) -> bool {
        matches!(self, Unit::Radian | Unit::ArcSecond | Unit::Degree)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Undefined => "undefined",
            Unit::Radian => "radian",
            Unit::Feet => "us-ft",
            Unit::Meter => "m",
            Unit::ArcSecond => "arc-second",
            Unit::Degree => "degree",
            Unit::InternationalFeet => "ft",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Unit {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "radian" | "radians" | "rad" => Ok(Unit::Radian),
            "us-ft" | "us_survey_foot" | "foot_us" => Ok(Unit::Feet),
            "m" | "meter" | "metre" | "meters" | "metres" => Ok(Unit::Meter),
            "arc-second" | "arcsecond" | "second" => Ok(Unit::ArcSecond),
            "degree" | "degrees" | "deg" => Ok(Unit::Degree),
            "ft" | "foot" | "international_foot" => Ok(Unit::InternationalFeet),
            other => Err(RasterError::InvalidUnit(other.to_string())),
        }
    }
}

/// A point in some coordinate space.
///
/// Pixel-space coordinates use `Unit::Undefined`; column is `x`, row is `y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub unit: Unit,
}

impl Coordinate {
    pub fn new(x: f64, y: f64, unit: Unit) -> Self {
        Self { x, y, unit }
    }

    /// A pixel-space coordinate (column, row).
    pub fn pixel(column: f64, row: f64) -> Self {
        Self::new(column, row, Unit::Undefined)
    }

    /// True when both coordinates share a unit and differ by at most
    /// `delta` on each axis.
    pub fn comparable(&self, other: &Coordinate, delta: f64) -> bool {
        self.unit == other.unit
            && (self.x - other.x).abs() <= delta
            && (self.y - other.y).abs() <= delta
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self::new(0.0, 0.0, Unit::Undefined)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {} {})", self.x, self.y, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_codes_roundtrip() {
        for code in -1..=5 {
            let unit = Unit::from_code(code).unwrap();
            assert_eq!(unit.code(), code);
        }
        assert!(Unit::from_code(6).is_none());
    }

    #[test]
    fn test_unit_parse() {
        assert_eq!("metre".parse::<Unit>().unwrap(), Unit::Meter);
        assert_eq!("Degree".parse::<Unit>().unwrap(), Unit::Degree);
        assert!("furlong".parse::<Unit>().is_err());
    }

    #[test]
    fn test_comparable_requires_same_unit() {
        let a = Coordinate::new(1.0, 2.0, Unit::Meter);
        let b = Coordinate::new(1.005, 2.0, Unit::Meter);
        let c = Coordinate::new(1.0, 2.0, Unit::Degree);

        assert!(a.comparable(&b, 0.01));
        assert!(!a.comparable(&b, 0.001));
        assert!(!a.comparable(&c, 1.0));
    }
}
