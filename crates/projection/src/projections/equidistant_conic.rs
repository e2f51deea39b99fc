//! Equidistant Conic.
//!
//! Slot 8 selects the mode: zero uses one standard parallel (slot 2),
//! non-zero uses two (slots 2 and 3).

use crate::constants::EPSLN;
use crate::error::{ProjResult, ProjectionError};
use crate::params::Common;
use crate::util::{adjust_lon, e0fn, e1fn, e2fn, e3fn, mlfn, msfnz, phi3z};

#[derive(Debug, Clone)]
pub struct EquidistantConic {
    r_major: f64,
    center_lon: f64,
    false_easting: f64,
    false_northing: f64,
    e0: f64,
    e1: f64,
    e2: f64,
    e3: f64,
    ns: f64,
    g: f64,
    rh: f64,
}

impl EquidistantConic {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        let lat1 = common.angle(2)?;
        let lat2 = common.angle(3)?;
        let two_parallels = common.raw[8] != 0.0;

        let es = common.es();
        let e = es.sqrt();
        let (e0, e1, e2, e3) = (e0fn(es), e1fn(es), e2fn(es), e3fn(es));

        let (sinphi, cosphi) = lat1.sin_cos();
        let ms1 = msfnz(e, sinphi, cosphi);
        let ml1 = mlfn(e0, e1, e2, e3, lat1);

        let ns = if two_parallels {
            if (lat1 + lat2).abs() < EPSLN {
                return Err(ProjectionError::invalid(81));
            }
            let (sinphi2, cosphi2) = lat2.sin_cos();
            let ms2 = msfnz(e, sinphi2, cosphi2);
            let ml2 = mlfn(e0, e1, e2, e3, lat2);
            if (lat1 - lat2).abs() >= EPSLN {
                (ms1 - ms2) / (ml2 - ml1)
            } else {
                sinphi2
            }
        } else {
            sinphi
        };

        let g = ml1 + ms1 / ns;
        let ml0 = mlfn(e0, e1, e2, e3, common.center_lat);
        let rh = common.r_major() * (g - ml0);

        Ok(Self {
            r_major: common.r_major(),
            center_lon: common.center_lon,
            false_easting: common.false_easting,
            false_northing: common.false_northing,
            e0,
            e1,
            e2,
            e3,
            ns,
            g,
            rh,
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let ml = mlfn(self.e0, self.e1, self.e2, self.e3, lat);
        let rh1 = self.r_major * (self.g - ml);
        let theta = self.ns * adjust_lon(lon - self.center_lon);
        Ok((
            self.false_easting + rh1 * theta.sin(),
            self.false_northing + self.rh - rh1 * theta.cos(),
        ))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let x = x - self.false_easting;
        let y = self.rh - y + self.false_northing;

        let (rh1, con) = if self.ns >= 0.0 {
            ((x * x + y * y).sqrt(), 1.0)
        } else {
            (-(x * x + y * y).sqrt(), -1.0)
        };
        let theta = if rh1 != 0.0 {
            (con * x).atan2(con * y)
        } else {
            0.0
        };

        let ml = self.g - rh1 / self.r_major;
        let lat = phi3z(ml, self.e0, self.e1, self.e2, self.e3)?;
        Ok((adjust_lon(self.center_lon + theta / self.ns), lat))
    }
}
