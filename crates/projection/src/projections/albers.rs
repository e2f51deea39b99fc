//! Albers Conical Equal-Area.
//!
//! Standard parallels come from slots 2 and 3 (packed DMS).

use crate::constants::{EPSLN, PI};
use crate::error::{ProjResult, ProjectionError};
use crate::params::Common;
use crate::util::{adjust_lon, msfnz, phi1z, qsfnz};

#[derive(Debug, Clone)]
pub struct Albers {
    r_major: f64,
    center_lon: f64,
    false_easting: f64,
    false_northing: f64,
    e: f64,
    es: f64,
    c: f64,
    rh: f64,
    ns0: f64,
}

impl Albers {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        let lat1 = common.angle(2)?;
        let lat2 = common.angle(3)?;
        if (lat1 + lat2).abs() < EPSLN {
            return Err(ProjectionError::invalid(31));
        }

        let es = common.es();
        let e = es.sqrt();

        let (sin_po, cos_po) = lat1.sin_cos();
        let con = sin_po;
        let ms1 = msfnz(e, sin_po, cos_po);
        let qs1 = qsfnz(e, sin_po);

        let (sin_po, cos_po) = lat2.sin_cos();
        let ms2 = msfnz(e, sin_po, cos_po);
        let qs2 = qsfnz(e, sin_po);

        let qs0 = qsfnz(e, common.center_lat.sin());

        let ns0 = if (lat1 - lat2).abs() > EPSLN {
            (ms1 * ms1 - ms2 * ms2) / (qs2 - qs1)
        } else {
            con
        };
        let c = ms1 * ms1 + ns0 * qs1;
        let rh = common.r_major() * (c - ns0 * qs0).sqrt() / ns0;

        Ok(Self {
            r_major: common.r_major(),
            center_lon: common.center_lon,
            false_easting: common.false_easting,
            false_northing: common.false_northing,
            e,
            es,
            c,
            rh,
            ns0,
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let qs = qsfnz(self.e, lat.sin());
        let rh1 = self.r_major * (self.c - self.ns0 * qs).sqrt() / self.ns0;
        let theta = self.ns0 * adjust_lon(lon - self.center_lon);
        Ok((
            rh1 * theta.sin() + self.false_easting,
            self.rh - rh1 * theta.cos() + self.false_northing,
        ))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let x = x - self.false_easting;
        let y = self.rh - y + self.false_northing;

        let (rh1, con) = if self.ns0 >= 0.0 {
            ((x * x + y * y).sqrt(), 1.0)
        } else {
            (-(x * x + y * y).sqrt(), -1.0)
        };
        let theta = if rh1 != 0.0 {
            (con * x).atan2(con * y)
        } else {
            0.0
        };

        let con = rh1 * self.ns0 / self.r_major;
        let qs = (self.c - con * con) / self.ns0;

        let lat = if self.e >= 1e-10 {
            let con = 1.0 - 0.5 * (1.0 - self.es) * ((1.0 - self.e) / (1.0 + self.e)).ln() / self.e;
            if (con.abs() - qs.abs()).abs() > 0.0000000001 {
                phi1z(self.e, qs)?
            } else if qs >= 0.0 {
                0.5 * PI
            } else {
                -0.5 * PI
            }
        } else {
            phi1z(self.e, qs)?
        };

        Ok((adjust_lon(theta / self.ns0 + self.center_lon), lat))
    }
}
