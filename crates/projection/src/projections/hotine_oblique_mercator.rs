//! Hotine Oblique Mercator.
//!
//! Slot 2 holds the scale factor at the center (zero means 1.0) and slot 12
//! selects the form of the central line:
//!
//! * non-zero: azimuth of the central line (slot 3) through the center point
//!   given by slots 4 and 5;
//! * zero: two points on the central line, longitude/latitude in slots 8, 9
//!   and 10, 11.

use crate::constants::{EPSLN, HALF_PI, PI};
use crate::error::{ProjResult, ProjectionError};
use crate::params::Common;
use crate::util::{adjust_lon, asinz, phi2z, tsfnz};

#[derive(Debug, Clone)]
pub struct HotineObliqueMercator {
    center_lon: f64,
    false_easting: f64,
    false_northing: f64,
    e: f64,
    bl: f64,
    al: f64,
    el: f64,
    u: f64,
    singam: f64,
    cosgam: f64,
    sinaz: f64,
    cosaz: f64,
}

impl HotineObliqueMercator {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        let scale_factor = if common.raw[2] == 0.0 {
            1.0
        } else {
            common.raw[2]
        };
        let azimuth_mode = common.raw[12] != 0.0;

        let es = common.es();
        let e = es.sqrt();
        let lat_origin = common.center_lat;
        let (sinphi, cosphi) = lat_origin.sin_cos();
        let con = 1.0 - es * sinphi * sinphi;
        let com = (1.0 - es).sqrt();
        let bl = (1.0 + es * cosphi.powi(4) / (1.0 - es)).sqrt();
        let al = common.r_major() * bl * scale_factor * com / con;

        let (d, f, el) = if lat_origin.abs() < EPSLN {
            (1.0, 1.0, 1.0)
        } else {
            let ts = tsfnz(e, lat_origin, sinphi);
            let d = bl * com / (cosphi * con.sqrt());
            let f = if d * d - 1.0 > 0.0 {
                if lat_origin >= 0.0 {
                    d + (d * d - 1.0).sqrt()
                } else {
                    d - (d * d - 1.0).sqrt()
                }
            } else {
                d
            };
            (d, f, f * ts.powf(bl))
        };

        let (center_lon, gama, azimuth) = if azimuth_mode {
            let azimuth = common.angle(3)?;
            let g = 0.5 * (f - 1.0 / f);
            let gama = asinz(azimuth.sin() / d);
            let center_lon = common.center_lon - asinz(g * gama.tan()) / bl;
            let con = lat_origin.abs();
            if con <= EPSLN || (con - HALF_PI).abs() <= EPSLN {
                return Err(ProjectionError::invalid(201));
            }
            (center_lon, gama, azimuth)
        } else {
            let lon1 = common.angle(8)?;
            let lat1 = common.angle(9)?;
            let mut lon2 = common.angle(10)?;
            let lat2 = common.angle(11)?;

            let h = tsfnz(e, lat1, lat1.sin()).powf(bl);
            let l = tsfnz(e, lat2, lat2.sin()).powf(bl);
            let f = el / h;
            let g = 0.5 * (f - 1.0 / f);
            let j = (el * el - l * h) / (el * el + l * h);
            let p = (l - h) / (l + h);

            let dlon = lon1 - lon2;
            if dlon < -PI {
                lon2 -= 2.0 * PI;
            }
            if dlon > PI {
                lon2 += 2.0 * PI;
            }
            let dlon = lon1 - lon2;
            let center_lon = 0.5 * (lon1 + lon2) - (j * (0.5 * bl * dlon).tan() / p).atan() / bl;
            let dlon = adjust_lon(lon1 - center_lon);
            let gama = ((bl * dlon).sin() / g).atan();
            let azimuth = asinz(d * gama.sin());

            let con = lat1.abs();
            if (lat1 - lat2).abs() <= EPSLN
                || con <= EPSLN
                || (con - HALF_PI).abs() <= EPSLN
                || (lat_origin.abs() - HALF_PI).abs() <= EPSLN
            {
                return Err(ProjectionError::invalid(202));
            }
            (center_lon, gama, azimuth)
        };

        let (singam, cosgam) = gama.sin_cos();
        let (sinaz, cosaz) = azimuth.sin_cos();
        let u = (al / bl) * ((d * d - 1.0).max(0.0).sqrt() / cosaz).atan();
        let u = if lat_origin >= 0.0 { u } else { -u };

        Ok(Self {
            center_lon,
            false_easting: common.false_easting,
            false_northing: common.false_northing,
            e,
            bl,
            al,
            el,
            u,
            singam,
            cosgam,
            sinaz,
            cosaz,
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let dlon = adjust_lon(lon - self.center_lon);
        let vl = (self.bl * dlon).sin();

        let (ul, us) = if (lat.abs() - HALF_PI).abs() > EPSLN {
            let q = self.el / tsfnz(self.e, lat, lat.sin()).powf(self.bl);
            let s = 0.5 * (q - 1.0 / q);
            let t = 0.5 * (q + 1.0 / q);
            let ul = (s * self.singam - vl * self.cosgam) / t;
            let con = (self.bl * dlon).cos();
            let us = if con.abs() < 0.0000001 {
                self.al * self.bl * dlon
            } else {
                let us = self.al * ((s * self.cosgam + vl * self.singam) / con).atan() / self.bl;
                if con < 0.0 {
                    us + PI * self.al / self.bl
                } else {
                    us
                }
            };
            (ul, us)
        } else {
            let ul = if lat >= 0.0 { self.singam } else { -self.singam };
            (ul, self.al * lat / self.bl)
        };

        if (ul.abs() - 1.0).abs() <= EPSLN {
            return Err(ProjectionError::domain(205));
        }
        let vs = 0.5 * self.al * ((1.0 - ul) / (1.0 + ul)).ln() / self.bl;
        let us = us - self.u;
        Ok((
            self.false_easting + vs * self.cosaz + us * self.sinaz,
            self.false_northing + us * self.cosaz - vs * self.sinaz,
        ))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let x = x - self.false_easting;
        let y = y - self.false_northing;
        let vs = x * self.cosaz - y * self.sinaz;
        let us = y * self.cosaz + x * self.sinaz + self.u;
        let q = (-self.bl * vs / self.al).exp();
        let s = 0.5 * (q - 1.0 / q);
        let t = 0.5 * (q + 1.0 / q);
        let vl = (self.bl * us / self.al).sin();
        let ul = (vl * self.cosgam + s * self.singam) / t;

        if (ul.abs() - 1.0).abs() <= EPSLN {
            let lat = if ul >= 0.0 { HALF_PI } else { -HALF_PI };
            return Ok((self.center_lon, lat));
        }

        let ts = (self.el / ((1.0 + ul) / (1.0 - ul)).sqrt()).powf(1.0 / self.bl);
        let lat = phi2z(self.e, ts)?;
        let con = (self.bl * us / self.al).cos();
        let lon = adjust_lon(self.center_lon - (s * self.cosgam - vl * self.singam).atan2(con) / self.bl);
        Ok((lon, lat))
    }
}
