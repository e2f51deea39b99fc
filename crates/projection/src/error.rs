//! Projection error taxonomy.
//!
//! Every failure keeps the numeric GCTP status code so diagnostics can be
//! matched against the published GCTP error tables.

use raster_common::Unit;
use thiserror::Error;

/// Result type alias using ProjectionError.
pub type ProjResult<T> = Result<T, ProjectionError>;

/// GCTP status code for a point in the break region.
pub const IN_BREAK: i32 = -2;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ProjectionError {
    /// Soft failure from an interrupted projection. The point was still
    /// computed and is carried here in output units.
    #[error("point lies in the break region of an interrupted projection")]
    InBreak { x: f64, y: f64 },

    #[error("point is outside the projection domain (code {code})")]
    OutOfDomain { code: i32 },

    #[error("iteration failed to converge (code {code})")]
    NoConvergence { code: i32 },

    #[error("invalid projection parameter (code {code})")]
    InvalidParameter { code: i32 },

    #[error("incompatible units {from} -> {to}")]
    IncompatibleUnits { from: Unit, to: Unit },

    #[error("unsupported projection code {0}")]
    Unsupported(i32),
}

impl ProjectionError {
    pub fn domain(code: i32) -> Self {
        ProjectionError::OutOfDomain { code }
    }

    pub fn no_convergence(code: i32) -> Self {
        ProjectionError::NoConvergence { code }
    }

    pub fn invalid(code: i32) -> Self {
        ProjectionError::InvalidParameter { code }
    }

    /// Numeric GCTP status code.
    pub fn code(&self) -> i32 {
        match self {
            ProjectionError::InBreak { .. } => IN_BREAK,
            ProjectionError::OutOfDomain { code }
            | ProjectionError::NoConvergence { code }
            | ProjectionError::InvalidParameter { code } => *code,
            ProjectionError::IncompatibleUnits { .. } => 1101,
            ProjectionError::Unsupported(_) => -1,
        }
    }

    /// True for errors that still produced a usable point.
    pub fn is_soft(&self) -> bool {
        matches!(self, ProjectionError::InBreak { .. })
    }

    /// The computed point of a soft error.
    pub fn usable_point(&self) -> Option<(f64, f64)> {
        match self {
            ProjectionError::InBreak { x, y } => Some((*x, *y)),
            _ => None,
        }
    }

    /// Apply `f` to the point carried by a soft error, leaving hard errors
    /// untouched.
    pub(crate) fn map_point(self, f: impl FnOnce(f64, f64) -> (f64, f64)) -> Self {
        match self {
            ProjectionError::InBreak { x, y } => {
                let (x, y) = f(x, y);
                ProjectionError::InBreak { x, y }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ProjectionError::InBreak { x: 0.0, y: 0.0 }.code(), IN_BREAK);
        assert_eq!(ProjectionError::domain(93).code(), 93);
        assert_eq!(ProjectionError::no_convergence(235).code(), 235);
    }

    #[test]
    fn test_only_in_break_is_soft() {
        let soft = ProjectionError::InBreak { x: 1.0, y: 2.0 };
        assert!(soft.is_soft());
        assert_eq!(soft.usable_point(), Some((1.0, 2.0)));
        assert!(!ProjectionError::domain(1).is_soft());
        assert_eq!(ProjectionError::invalid(11).usable_point(), None);
    }
}
