//! Mercator. Slot 5 is the latitude of true scale.

use crate::constants::{EPSLN, HALF_PI};
use crate::error::{ProjResult, ProjectionError};
use crate::params::Common;
use crate::util::{adjust_lon, phi2z, tsfnz};

#[derive(Debug, Clone)]
pub struct Mercator {
    r_major: f64,
    center_lon: f64,
    false_easting: f64,
    false_northing: f64,
    e: f64,
    m1: f64,
}

impl Mercator {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        let es = common.es();
        let lat_ts = common.center_lat;
        let m1 = lat_ts.cos() / (1.0 - es * lat_ts.sin() * lat_ts.sin()).sqrt();
        Ok(Self {
            r_major: common.r_major(),
            center_lon: common.center_lon,
            false_easting: common.false_easting,
            false_northing: common.false_northing,
            e: es.sqrt(),
            m1,
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        if (lat.abs() - HALF_PI).abs() <= EPSLN {
            return Err(ProjectionError::domain(52));
        }
        let ts = tsfnz(self.e, lat, lat.sin());
        Ok((
            self.false_easting + self.r_major * self.m1 * adjust_lon(lon - self.center_lon),
            self.false_northing - self.r_major * self.m1 * ts.ln(),
        ))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let x = x - self.false_easting;
        let y = y - self.false_northing;
        let ts = (-y / (self.r_major * self.m1)).exp();
        let lat = phi2z(self.e, ts)?;
        Ok((
            adjust_lon(self.center_lon + x / (self.r_major * self.m1)),
            lat,
        ))
    }
}
