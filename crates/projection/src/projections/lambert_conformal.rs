//! Lambert Conformal Conic.
//!
//! Standard parallels come from slots 2 and 3 (packed DMS); equal
//! parallels give the tangent cone.

use crate::constants::{EPSLN, HALF_PI};
use crate::error::{ProjResult, ProjectionError};
use crate::params::Common;
use crate::util::{adjust_lon, msfnz, phi2z, tsfnz};

#[derive(Debug, Clone)]
pub struct LambertConformalConic {
    r_major: f64,
    center_lon: f64,
    false_easting: f64,
    false_northing: f64,
    e: f64,
    /// Cone constant.
    ns: f64,
    f0: f64,
    /// Radius of the origin latitude.
    rh: f64,
}

impl LambertConformalConic {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        let lat1 = common.angle(2)?;
        let lat2 = common.angle(3)?;
        // Standard parallels cannot be equal and on opposite sides of the equator.
        if (lat1 + lat2).abs() < EPSLN {
            return Err(ProjectionError::invalid(41));
        }

        let e = common.es().sqrt();

        let (sin_po, cos_po) = lat1.sin_cos();
        let con = sin_po;
        let ms1 = msfnz(e, sin_po, cos_po);
        let ts1 = tsfnz(e, lat1, sin_po);

        let (sin_po, cos_po) = lat2.sin_cos();
        let ms2 = msfnz(e, sin_po, cos_po);
        let ts2 = tsfnz(e, lat2, sin_po);

        let ts0 = tsfnz(e, common.center_lat, common.center_lat.sin());

        let ns = if (lat1 - lat2).abs() > EPSLN {
            (ms1 / ms2).ln() / (ts1 / ts2).ln()
        } else {
            con
        };
        let f0 = ms1 / (ns * ts1.powf(ns));
        let rh = common.r_major() * f0 * ts0.powf(ns);

        Ok(Self {
            r_major: common.r_major(),
            center_lon: common.center_lon,
            false_easting: common.false_easting,
            false_northing: common.false_northing,
            e,
            ns,
            f0,
            rh,
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let rh1 = if (lat.abs() - HALF_PI).abs() > EPSLN {
            let ts = tsfnz(self.e, lat, lat.sin());
            self.r_major * self.f0 * ts.powf(self.ns)
        } else {
            if lat * self.ns <= 0.0 {
                return Err(ProjectionError::domain(44));
            }
            0.0
        };

        let theta = self.ns * adjust_lon(lon - self.center_lon);
        Ok((
            rh1 * theta.sin() + self.false_easting,
            self.rh - rh1 * theta.cos() + self.false_northing,
        ))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let x = x - self.false_easting;
        let y = self.rh - y + self.false_northing;

        let (rh1, con) = if self.ns > 0.0 {
            ((x * x + y * y).sqrt(), 1.0)
        } else {
            (-(x * x + y * y).sqrt(), -1.0)
        };
        let theta = if rh1 != 0.0 {
            (con * x).atan2(con * y)
        } else {
            0.0
        };

        let lat = if rh1 != 0.0 || self.ns > 0.0 {
            let ts = (rh1 / (self.r_major * self.f0)).powf(1.0 / self.ns);
            phi2z(self.e, ts)?
        } else {
            -HALF_PI
        };

        Ok((adjust_lon(theta / self.ns + self.center_lon), lat))
    }
}
