//! Forward and inverse map projections.
//!
//! Implements the GCTP family of projections from scratch: conics,
//! cylindricals, azimuthals, world pseudocylindricals, the interrupted
//! projections and the oblique Mercator variants. A [`Projection`] is
//! built from a [`ProjectionSpec`] (code, 15-slot parameter array, unit,
//! datum) and converts between longitude/latitude in degrees and
//! projected coordinates in its unit. [`Transformer`] chains an inverse
//! and a forward projection.

pub mod constants;
pub mod error;
pub mod params;
pub mod projection;
pub(crate) mod projections;
pub mod srs;
pub mod transformer;
pub mod util;

pub use constants::{Datum, ProjCode, COEFCT};
pub use error::{ProjResult, ProjectionError};
pub use params::ProjectionSpec;
pub use projection::Projection;
pub use srs::{parse_srs, to_proj_string, to_wkt, SrsError, SrsResult};
pub use transformer::Transformer;
