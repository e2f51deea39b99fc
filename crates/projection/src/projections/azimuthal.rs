//! Spherical azimuthal projections centered on slots 4 and 5: Stereographic,
//! Lambert Azimuthal Equal Area and Azimuthal Equidistant.
//!
//! The three share the same inverse skeleton; they differ in the radial
//! scale function and in the domain checks.

use crate::constants::{EPSLN, HALF_PI, PI};
use crate::error::{ProjResult, ProjectionError};
use crate::params::Common;
use crate::util::{adjust_lon, asinz};

/// Center of an azimuthal projection with its cached trigonometry.
#[derive(Debug, Clone)]
struct Center {
    lon: f64,
    lat: f64,
    sin_lat: f64,
    cos_lat: f64,
    false_easting: f64,
    false_northing: f64,
}

impl Center {
    fn new(common: &Common) -> Self {
        let (sin_lat, cos_lat) = common.center_lat.sin_cos();
        Self {
            lon: common.center_lon,
            lat: common.center_lat,
            sin_lat,
            cos_lat,
            false_easting: common.false_easting,
            false_northing: common.false_northing,
        }
    }

    /// Cosine of the angular distance from the center, plus trig terms.
    fn g(&self, lon: f64, lat: f64) -> (f64, f64, f64, f64) {
        let dlon = adjust_lon(lon - self.lon);
        let (sinphi, cosphi) = lat.sin_cos();
        let coslon = dlon.cos();
        let g = self.sin_lat * sinphi + self.cos_lat * cosphi * coslon;
        (g, dlon, sinphi, cosphi)
    }

    /// Plane coordinates for radial scale `ksp`.
    fn plane(&self, ksp: f64, dlon: f64, sinphi: f64, cosphi: f64) -> (f64, f64) {
        (
            self.false_easting + ksp * cosphi * dlon.sin(),
            self.false_northing
                + ksp * (self.cos_lat * sinphi - self.sin_lat * cosphi * dlon.cos()),
        )
    }

    /// Inverse from the angular distance `z` of a point at radius `rh`.
    fn from_distance(&self, x: f64, y: f64, rh: f64, z: f64) -> (f64, f64) {
        if rh.abs() <= EPSLN {
            return (self.lon, self.lat);
        }
        let (sinz, cosz) = z.sin_cos();
        let lat = asinz(cosz * self.sin_lat + (y * sinz * self.cos_lat) / rh);
        if (self.lat.abs() - HALF_PI).abs() <= EPSLN {
            let lon = if self.lat >= 0.0 {
                adjust_lon(self.lon + x.atan2(-y))
            } else {
                adjust_lon(self.lon - (-x).atan2(y))
            };
            return (lon, lat);
        }
        let con = cosz - self.sin_lat * lat.sin();
        if con.abs() < EPSLN && x.abs() < EPSLN {
            return (self.lon, lat);
        }
        (
            adjust_lon(self.lon + (x * sinz * self.cos_lat).atan2(con * rh)),
            lat,
        )
    }

    fn offsets(&self, x: f64, y: f64) -> (f64, f64, f64) {
        let x = x - self.false_easting;
        let y = y - self.false_northing;
        (x, y, (x * x + y * y).sqrt())
    }
}

// ============================================================================
// Stereographic
// ============================================================================

#[derive(Debug, Clone)]
pub struct Stereographic {
    r_major: f64,
    center: Center,
}

impl Stereographic {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            r_major: common.r_major(),
            center: Center::new(common),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let (g, dlon, sinphi, cosphi) = self.center.g(lon, lat);
        // Antipode of the center.
        if (g + 1.0).abs() <= EPSLN {
            return Err(ProjectionError::domain(103));
        }
        let ksp = self.r_major * 2.0 / (1.0 + g);
        Ok(self.center.plane(ksp, dlon, sinphi, cosphi))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y, rh) = self.center.offsets(x, y);
        let z = 2.0 * (rh / (2.0 * self.r_major)).atan();
        Ok(self.center.from_distance(x, y, rh, z))
    }
}

// ============================================================================
// Lambert Azimuthal Equal Area
// ============================================================================

#[derive(Debug, Clone)]
pub struct LambertAzimuthal {
    radius: f64,
    center: Center,
}

impl LambertAzimuthal {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            radius: common.radius(),
            center: Center::new(common),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let (g, dlon, sinphi, cosphi) = self.center.g(lon, lat);
        if g == -1.0 {
            return Err(ProjectionError::domain(113));
        }
        let ksp = self.radius * (2.0 / (1.0 + g)).sqrt();
        Ok(self.center.plane(ksp, dlon, sinphi, cosphi))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y, rh) = self.center.offsets(x, y);
        let temp = rh / (2.0 * self.radius);
        if temp > 1.0 {
            return Err(ProjectionError::domain(115));
        }
        let z = 2.0 * asinz(temp);
        Ok(self.center.from_distance(x, y, rh, z))
    }
}

// ============================================================================
// Azimuthal Equidistant
// ============================================================================

#[derive(Debug, Clone)]
pub struct AzimuthalEquidistant {
    r_major: f64,
    center: Center,
}

impl AzimuthalEquidistant {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            r_major: common.r_major(),
            center: Center::new(common),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let (g, dlon, sinphi, cosphi) = self.center.g(lon, lat);
        let ksp = if (g.abs() - 1.0).abs() < EPSLN {
            // The antipode projects onto a circle, not a point.
            if g < 0.0 {
                return Err(ProjectionError::domain(123));
            }
            1.0
        } else {
            let z = g.acos();
            z / z.sin()
        };
        Ok(self.center.plane(self.r_major * ksp, dlon, sinphi, cosphi))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y, rh) = self.center.offsets(x, y);
        if rh > PI * self.r_major {
            return Err(ProjectionError::domain(125));
        }
        Ok(self.center.from_distance(x, y, rh, rh / self.r_major))
    }
}

// ============================================================================
// Gnomonic
// ============================================================================

#[derive(Debug, Clone)]
pub struct Gnomonic {
    radius: f64,
    center: Center,
}

impl Gnomonic {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            radius: common.radius(),
            center: Center::new(common),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let (g, dlon, sinphi, cosphi) = self.center.g(lon, lat);
        // Only the hemisphere facing the center is projectable.
        if g <= 0.0 {
            return Err(ProjectionError::domain(133));
        }
        Ok(self.center.plane(self.radius / g, dlon, sinphi, cosphi))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y, rh) = self.center.offsets(x, y);
        let z = (rh / self.radius).atan();
        Ok(self.center.from_distance(x, y, rh, z))
    }
}

// ============================================================================
// Orthographic
// ============================================================================

#[derive(Debug, Clone)]
pub struct Orthographic {
    r_major: f64,
    center: Center,
}

impl Orthographic {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            r_major: common.r_major(),
            center: Center::new(common),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let (g, dlon, sinphi, cosphi) = self.center.g(lon, lat);
        if g > 0.0 || g.abs() <= EPSLN {
            Ok(self.center.plane(self.r_major, dlon, sinphi, cosphi))
        } else {
            Err(ProjectionError::domain(143))
        }
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y, rh) = self.center.offsets(x, y);
        if rh > self.r_major + 0.0000001 {
            return Err(ProjectionError::domain(145));
        }
        let z = asinz(rh / self.r_major);
        Ok(self.center.from_distance(x, y, rh, z))
    }
}

// ============================================================================
// General Vertical Near-Side Perspective
// ============================================================================

/// Perspective view from `height` meters (slot 2) above the center.
#[derive(Debug, Clone)]
pub struct GeneralVerticalNearSide {
    radius: f64,
    /// Distance of the viewpoint from the sphere center in radii.
    p: f64,
    center: Center,
}

impl GeneralVerticalNearSide {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        let height = common.raw[2];
        if height <= 0.0 {
            return Err(ProjectionError::invalid(151));
        }
        Ok(Self {
            radius: common.radius(),
            p: 1.0 + height / common.radius(),
            center: Center::new(common),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let (g, dlon, sinphi, cosphi) = self.center.g(lon, lat);
        // Beyond the horizon seen from the viewpoint.
        if g < 1.0 / self.p {
            return Err(ProjectionError::domain(153));
        }
        let ksp = (self.p - 1.0) / (self.p - g);
        Ok(self.center.plane(self.radius * ksp, dlon, sinphi, cosphi))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y, rh) = self.center.offsets(x, y);
        let r = rh / self.radius;
        let con = self.p - 1.0;
        let com = self.p + 1.0;
        if r > (con / com).sqrt() {
            return Err(ProjectionError::domain(155));
        }
        if rh.abs() <= EPSLN {
            return Ok((self.center.lon, self.center.lat));
        }
        let sinz = (self.p - (1.0 - (r * r * com) / con).sqrt()) / (con / r + r / con);
        Ok(self.center.from_distance(x, y, rh, asinz(sinz)))
    }
}
