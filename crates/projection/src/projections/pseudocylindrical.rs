//! Spherical world projections parameterized only by the sphere radius,
//! the central meridian (slot 4) and false easting/northing: Sinusoidal,
//! Equirectangular, Miller, Mollweide, Hammer, Wagner IV and Wagner VII.

use crate::constants::{EPSLN, HALF_PI, PI};
use crate::error::{ProjResult, ProjectionError};
use crate::params::Common;
use crate::util::{adjust_lon, asinz};

/// Sphere and origin shared by every projection in this module.
#[derive(Debug, Clone)]
pub(crate) struct SphereOrigin {
    pub radius: f64,
    pub center_lon: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

impl SphereOrigin {
    pub fn new(common: &Common) -> Self {
        Self {
            radius: common.radius(),
            center_lon: common.center_lon,
            false_easting: common.false_easting,
            false_northing: common.false_northing,
        }
    }

    /// Longitude offset from the central meridian, in [-PI, PI].
    pub fn dlon(&self, lon: f64) -> f64 {
        adjust_lon(lon - self.center_lon)
    }

    pub fn offset(&self, x: f64, y: f64) -> (f64, f64) {
        (x + self.false_easting, y + self.false_northing)
    }

    pub fn unoffset(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.false_easting, y - self.false_northing)
    }
}

/// Newton iteration for the auxiliary angle `theta` solving
/// `theta + sin(theta) = con`, halved on return.
pub(crate) fn auxiliary_angle(lat: f64, con: f64, max_iter: usize, code: i32) -> ProjResult<f64> {
    let mut theta = lat;
    let mut i = 0;
    loop {
        let delta_theta = -(theta + theta.sin() - con) / (1.0 + theta.cos());
        theta += delta_theta;
        if delta_theta.abs() < EPSLN {
            break;
        }
        if i >= max_iter {
            return Err(ProjectionError::no_convergence(code));
        }
        i += 1;
    }
    Ok(theta / 2.0)
}

// ============================================================================
// Sinusoidal
// ============================================================================

#[derive(Debug, Clone)]
pub struct Sinusoidal {
    origin: SphereOrigin,
}

impl Sinusoidal {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            origin: SphereOrigin::new(common),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let r = self.origin.radius;
        let dlon = self.origin.dlon(lon);
        Ok(self.origin.offset(r * dlon * lat.cos(), r * lat))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y) = self.origin.unoffset(x, y);
        let r = self.origin.radius;
        let lat = y / r;
        if lat.abs() > HALF_PI {
            return Err(ProjectionError::domain(164));
        }
        let lon = if (lat.abs() - HALF_PI).abs() > EPSLN {
            adjust_lon(self.origin.center_lon + x / (r * lat.cos()))
        } else {
            self.origin.center_lon
        };
        Ok((lon, lat))
    }
}

// ============================================================================
// Equirectangular
// ============================================================================

/// Plate carrée with a latitude of true scale in slot 5.
#[derive(Debug, Clone)]
pub struct Equirectangular {
    origin: SphereOrigin,
    cos_lat_ts: f64,
}

impl Equirectangular {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            origin: SphereOrigin::new(common),
            cos_lat_ts: common.center_lat.cos(),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let r = self.origin.radius;
        let dlon = self.origin.dlon(lon);
        Ok(self.origin.offset(r * dlon * self.cos_lat_ts, r * lat))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y) = self.origin.unoffset(x, y);
        let r = self.origin.radius;
        let lat = y / r;
        if lat.abs() > HALF_PI {
            return Err(ProjectionError::domain(174));
        }
        let lon = adjust_lon(self.origin.center_lon + x / (r * self.cos_lat_ts));
        Ok((lon, lat))
    }
}

// ============================================================================
// Miller Cylindrical
// ============================================================================

#[derive(Debug, Clone)]
pub struct Miller {
    origin: SphereOrigin,
}

impl Miller {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            origin: SphereOrigin::new(common),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let r = self.origin.radius;
        let dlon = self.origin.dlon(lon);
        Ok(self
            .origin
            .offset(r * dlon, r * ((PI / 4.0) + (lat / 2.5)).tan().ln() * 1.25))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y) = self.origin.unoffset(x, y);
        let r = self.origin.radius;
        Ok((
            adjust_lon(self.origin.center_lon + x / r),
            2.5 * ((y / r / 1.25).exp().atan() - PI / 4.0),
        ))
    }
}

// ============================================================================
// Mollweide
// ============================================================================

const MOLLWEIDE_X: f64 = 0.900316316158;
const MOLLWEIDE_Y: f64 = 1.4142135623731;

#[derive(Debug, Clone)]
pub struct Mollweide {
    origin: SphereOrigin,
}

impl Mollweide {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            origin: SphereOrigin::new(common),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let r = self.origin.radius;
        let mut dlon = self.origin.dlon(lon);
        let theta = auxiliary_angle(lat, PI * lat.sin(), 50, 241)?;

        // cos(theta) is imprecise at the poles; pin them to the central meridian.
        if PI / 2.0 - lat.abs() < EPSLN {
            dlon = 0.0;
        }
        Ok(self.origin.offset(
            MOLLWEIDE_X * r * dlon * theta.cos(),
            MOLLWEIDE_Y * r * theta.sin(),
        ))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y) = self.origin.unoffset(x, y);
        let r = self.origin.radius;
        let arg = (y / (MOLLWEIDE_Y * r)).clamp(-0.999999999999, 0.999999999999);
        let theta = arg.asin();
        let lon = adjust_lon(self.origin.center_lon + x / (MOLLWEIDE_X * r * theta.cos()))
            .clamp(-PI, PI);
        let lat = asinz((2.0 * theta + (2.0 * theta).sin()) / PI);
        Ok((lon, lat))
    }
}

// ============================================================================
// Hammer
// ============================================================================

#[derive(Debug, Clone)]
pub struct Hammer {
    origin: SphereOrigin,
}

impl Hammer {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            origin: SphereOrigin::new(common),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let r = self.origin.radius;
        let dlon = self.origin.dlon(lon);
        let fac = r * 1.414213562 / (1.0 + lat.cos() * (dlon / 2.0).cos()).sqrt();
        Ok(self
            .origin
            .offset(fac * 2.0 * lat.cos() * (dlon / 2.0).sin(), fac * lat.sin()))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y) = self.origin.unoffset(x, y);
        let r = self.origin.radius;
        let fac = (4.0 * r * r - (x * x) / 4.0 - y * y).sqrt() / 2.0;
        let lon = adjust_lon(
            self.origin.center_lon + 2.0 * (x * fac).atan2(2.0 * r * r - x * x / 4.0 - y * y),
        );
        let lat = asinz(y * fac / r / r);
        Ok((lon, lat))
    }
}

// ============================================================================
// Wagner IV
// ============================================================================

#[derive(Debug, Clone)]
pub struct WagnerIV {
    origin: SphereOrigin,
}

impl WagnerIV {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            origin: SphereOrigin::new(common),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let r = self.origin.radius;
        let dlon = self.origin.dlon(lon);
        let theta = auxiliary_angle(lat, 2.9604205062 * lat.sin(), 30, 2)?;
        Ok(self.origin.offset(
            0.86310 * r * dlon * theta.cos(),
            1.56548 * r * theta.sin(),
        ))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y) = self.origin.unoffset(x, y);
        let r = self.origin.radius;
        let theta = asinz(y / (1.56548 * r));
        let lon = adjust_lon(self.origin.center_lon + x / (0.86310 * r * theta.cos()));
        let lat = asinz((2.0 * theta + (2.0 * theta).sin()) / 2.9604205062);
        Ok((lon, lat))
    }
}

// ============================================================================
// Wagner VII
// ============================================================================

#[derive(Debug, Clone)]
pub struct WagnerVII {
    origin: SphereOrigin,
}

impl WagnerVII {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            origin: SphereOrigin::new(common),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let r = self.origin.radius;
        let dlon = self.origin.dlon(lon);
        let (sin_lon, cos_lon) = (dlon / 3.0).sin_cos();
        let s = 0.90631 * lat.sin();
        let c0 = (1.0 - s * s).sqrt();
        let c1 = (2.0 / (1.0 + c0 * cos_lon)).sqrt();
        Ok(self
            .origin
            .offset(2.66723 * r * c0 * c1 * sin_lon, 1.24104 * r * s * c1))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y) = self.origin.unoffset(x, y);
        let r = self.origin.radius;
        let t1 = x / 2.66723;
        let t2 = y / 1.24104;
        let p = (t1 * t1 + t2 * t2).sqrt();
        if p <= EPSLN {
            return Ok((self.origin.center_lon, 0.0));
        }
        let c = 2.0 * asinz(p / (2.0 * r));
        let lat = asinz(y * c.sin() / (1.24104 * 0.90631 * p));
        let lon = adjust_lon(self.origin.center_lon + 3.0 * (x * c.tan()).atan2(2.66723 * p));
        Ok((lon, lat))
    }
}
