//! Projection parameter arrays and the values every projection derives
//! from them.
//!
//! The 15-slot array follows the GCTP layout. Slots shared by most
//! projections:
//!
//! | slot | meaning |
//! |------|---------|
//! | 0, 1 | semi-major / semi-minor axis (or e²) when no datum is given |
//! | 2, 3 | standard parallels (conic projections) |
//! | 4    | central meridian, packed DMS |
//! | 5    | latitude of origin / true scale, packed DMS |
//! | 6, 7 | false easting / false northing |
//!
//! Other slots are projection specific and documented on each projection.

use raster_common::Unit;
use serde::{Deserialize, Serialize};

use crate::constants::{Datum, ProjCode, COEFCT};
use crate::error::ProjResult;
use crate::util::{dms_to_rad, sphdz, Spheroid};

/// Geostationary orbit height in meters.
const DEFAULT_PERSPECTIVE_HEIGHT: f64 = 35_786_000.0;

/// Everything needed to build a [`crate::Projection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSpec {
    pub code: ProjCode,
    pub params: [f64; COEFCT],
    /// UTM zone; negative for the southern hemisphere, zero to derive it
    /// from the longitude/latitude in slots 0 and 1.
    pub zone: i32,
    pub unit: Unit,
    pub datum: Datum,
}

impl ProjectionSpec {
    /// Default parameters for `code`: WGS84, meters (degrees for
    /// Geographic) and zeros, except where a projection cannot be built
    /// from an all-zero array. Conics default to the conterminous US
    /// standard parallels (29°30' and 45°30', origin 23°N).
    pub fn new(code: ProjCode) -> Self {
        let unit = if code == ProjCode::Geographic {
            Unit::Degree
        } else {
            Unit::Meter
        };
        let mut params = [0.0; COEFCT];
        match code {
            ProjCode::Albers | ProjCode::LambertConformalConic | ProjCode::EquidistantConic => {
                params[2] = 29_030_000.0;
                params[3] = 45_030_000.0;
                params[5] = 23_000_000.0;
                if code == ProjCode::EquidistantConic {
                    params[8] = 1.0;
                }
            }
            ProjCode::GeneralVerticalNearSide => params[2] = DEFAULT_PERSPECTIVE_HEIGHT,
            ProjCode::HotineObliqueMercator => {
                params[3] = 45_000_000.0;
                params[5] = 45_000_000.0;
                params[12] = 1.0;
            }
            ProjCode::SpaceObliqueMercator => {
                params[2] = 1.0;
                params[3] = 1.0;
                params[12] = 1.0;
            }
            ProjCode::OblatedEqualArea => {
                params[2] = 1.0;
                params[3] = 1.0;
            }
            _ => {}
        }
        Self {
            code,
            params,
            zone: 0,
            unit,
            datum: Datum::Wgs84,
        }
    }

    pub fn with_params(mut self, params: [f64; COEFCT]) -> Self {
        self.params = params;
        self
    }

    pub fn with_param(mut self, index: usize, value: f64) -> Self {
        self.params[index] = value;
        self
    }

    pub fn with_zone(mut self, zone: i32) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_datum(mut self, datum: Datum) -> Self {
        self.datum = datum;
        self
    }
}

/// Values decoded from a [`ProjectionSpec`] before projection-specific
/// initialization.
#[derive(Debug, Clone)]
pub(crate) struct Common {
    pub raw: [f64; COEFCT],
    pub zone: i32,
    pub spheroid: Spheroid,
    pub center_lon: f64,
    pub center_lat: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

impl Common {
    pub fn load(spec: &ProjectionSpec) -> ProjResult<Self> {
        let raw = spec.params;
        Ok(Self {
            raw,
            zone: spec.zone,
            spheroid: sphdz(spec.datum, &raw),
            center_lon: dms_to_rad(raw[4])?,
            center_lat: dms_to_rad(raw[5])?,
            false_easting: raw[6],
            false_northing: raw[7],
        })
    }

    /// Packed DMS slot converted to radians.
    pub fn angle(&self, index: usize) -> ProjResult<f64> {
        dms_to_rad(self.raw[index])
    }

    pub fn r_major(&self) -> f64 {
        self.spheroid.r_major
    }

    pub fn radius(&self) -> f64 {
        self.spheroid.radius
    }

    /// Eccentricity squared of the spheroid.
    pub fn es(&self) -> f64 {
        let temp = self.spheroid.r_minor / self.spheroid.r_major;
        1.0 - temp * temp
    }
}
