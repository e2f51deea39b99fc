//! Van der Grinten I.

use crate::constants::{EPSLN, HALF_PI, PI};
use crate::error::ProjResult;
use crate::params::Common;
use crate::projections::pseudocylindrical::SphereOrigin;
use crate::util::{adjust_lon, asinz};

#[derive(Debug, Clone)]
pub struct VanDerGrinten {
    origin: SphereOrigin,
}

impl VanDerGrinten {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            origin: SphereOrigin::new(common),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let r = self.origin.radius;
        let dlon = self.origin.dlon(lon);

        if lat.abs() <= EPSLN {
            return Ok(self.origin.offset(r * dlon, 0.0));
        }

        let theta = asinz(2.0 * (lat / PI).abs());
        if dlon.abs() <= EPSLN || (lat.abs() - HALF_PI).abs() <= EPSLN {
            let y = PI * r * (0.5 * theta).tan();
            return Ok(self.origin.offset(0.0, if lat >= 0.0 { y } else { -y }));
        }

        let al = 0.5 * ((PI / dlon) - (dlon / PI)).abs();
        let asq = al * al;
        let (sinth, costh) = theta.sin_cos();
        let g = costh / (sinth + costh - 1.0);
        let gsq = g * g;
        let m = g * (2.0 / sinth - 1.0);
        let msq = m * m;
        let mut con = PI
            * r
            * (al * (g - msq)
                + (asq * (g - msq) * (g - msq) - (msq + asq) * (gsq - msq)).sqrt())
            / (msq + asq);
        if dlon < 0.0 {
            con = -con;
        }
        let x = con;
        let con = (con / (PI * r)).abs();
        let y = PI * r * (1.0 - con * con - 2.0 * al * con).sqrt();
        Ok(self.origin.offset(x, if lat >= 0.0 { y } else { -y }))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y) = self.origin.unoffset(x, y);
        let con = PI * self.origin.radius;
        let xx = x / con;
        let yy = y / con;
        let xys = xx * xx + yy * yy;
        if xys <= EPSLN * EPSLN {
            return Ok((self.origin.center_lon, 0.0));
        }

        let c1 = -yy.abs() * (1.0 + xys);
        let c2 = c1 - 2.0 * yy * yy + xx * xx;
        let c3 = -2.0 * c1 + 1.0 + 2.0 * yy * yy + xys * xys;
        let d = yy * yy / c3
            + (2.0 * c2 * c2 * c2 / c3 / c3 / c3 - 9.0 * c1 * c2 / c3 / c3) / 27.0;
        let a1 = (c1 - c2 * c2 / 3.0 / c3) / c3;
        let m1 = 2.0 * (-a1 / 3.0).sqrt();
        let con = (((3.0 * d) / a1) / m1).clamp(-1.0, 1.0);
        let th1 = con.acos() / 3.0;

        let lat = (-m1 * (th1 + PI / 3.0).cos() - c2 / 3.0 / c3) * PI;
        let lat = if y >= 0.0 { lat } else { -lat };

        if xx.abs() < EPSLN {
            return Ok((self.origin.center_lon, lat));
        }
        let lon = adjust_lon(
            self.origin.center_lon
                + PI * (xys - 1.0 + (1.0 + 2.0 * (xx * xx - yy * yy) + xys * xys).sqrt())
                    / 2.0
                    / xx,
        );
        Ok((lon, lat))
    }
}
