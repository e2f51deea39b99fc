//! Polar Stereographic.
//!
//! Slot 4 is the longitude below the pole, slot 5 the latitude of true
//! scale; its sign picks the pole.

use crate::constants::{EPSLN, HALF_PI};
use crate::error::ProjResult;
use crate::params::Common;
use crate::util::{adjust_lon, e4fn, msfnz, phi2z, tsfnz};

#[derive(Debug, Clone)]
pub struct PolarStereographic {
    r_major: f64,
    center_lon: f64,
    false_easting: f64,
    false_northing: f64,
    e: f64,
    e4: f64,
    /// +1 for the north pole, -1 for the south pole.
    fac: f64,
    /// Scale at the true-scale latitude, `None` when it is the pole itself.
    true_scale: Option<(f64, f64)>,
}

impl PolarStereographic {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        let e = common.es().sqrt();
        let lat_ts = common.center_lat;
        let fac = if lat_ts < 0.0 { -1.0 } else { 1.0 };

        let true_scale = if (lat_ts.abs() - HALF_PI).abs() > EPSLN {
            let con1 = fac * lat_ts;
            let (sinphi, cosphi) = con1.sin_cos();
            Some((msfnz(e, sinphi, cosphi), tsfnz(e, con1, sinphi)))
        } else {
            None
        };

        Ok(Self {
            r_major: common.r_major(),
            center_lon: common.center_lon,
            false_easting: common.false_easting,
            false_northing: common.false_northing,
            e,
            e4: e4fn(e),
            fac,
            true_scale,
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let con1 = self.fac * adjust_lon(lon - self.center_lon);
        let con2 = self.fac * lat;
        let ts = tsfnz(self.e, con2, con2.sin());
        let rh = match self.true_scale {
            Some((mcs, tcs)) => self.r_major * mcs * ts / tcs,
            None => 2.0 * self.r_major * ts / self.e4,
        };
        Ok((
            self.fac * rh * con1.sin() + self.false_easting,
            -self.fac * rh * con1.cos() + self.false_northing,
        ))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let x = (x - self.false_easting) * self.fac;
        let y = (y - self.false_northing) * self.fac;
        let rh = (x * x + y * y).sqrt();
        let ts = match self.true_scale {
            Some((mcs, tcs)) => rh * tcs / (self.r_major * mcs),
            None => rh * self.e4 / (self.r_major * 2.0),
        };
        let lat = self.fac * phi2z(self.e, ts)?;
        let lon = if rh == 0.0 {
            self.fac * self.center_lon
        } else {
            adjust_lon(self.fac * x.atan2(-y) + self.center_lon)
        };
        Ok((lon, lat))
    }
}
