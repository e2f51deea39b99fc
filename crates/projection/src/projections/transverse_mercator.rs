//! Transverse Mercator and its UTM specialisation.
//!
//! Transverse Mercator reads the scale factor from slot 2 (zero means 1.0)
//! and the latitude of origin from slot 5. UTM derives everything from the
//! zone: scale 0.9996, false easting 500 km and, for southern zones, a
//! false northing of 10 000 km.

use crate::constants::{EPSLN, HALF_PI, R2D};
use crate::error::{ProjResult, ProjectionError};
use crate::params::Common;
use crate::util::{adjust_lon, asinz, calc_utm_zone, e0fn, e1fn, e2fn, e3fn, mlfn, sign};

const UTM_SCALE_FACTOR: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500000.0;
const UTM_SOUTH_FALSE_NORTHING: f64 = 10000000.0;

/// Iteration cap of the footpoint latitude solver.
const MAX_ITER: usize = 6;

#[derive(Debug, Clone)]
pub struct TransverseMercator {
    r_major: f64,
    scale_factor: f64,
    center_lon: f64,
    lat_origin: f64,
    false_easting: f64,
    false_northing: f64,
    es: f64,
    esp: f64,
    e0: f64,
    e1: f64,
    e2: f64,
    e3: f64,
    ml0: f64,
    /// Use the spherical equations (eccentricity squared below 1e-5).
    spherical: bool,
    /// Zone when built as UTM.
    zone: Option<i32>,
}

impl TransverseMercator {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        let scale_factor = if common.raw[2] == 0.0 {
            1.0
        } else {
            common.raw[2]
        };
        Ok(Self::build(
            common,
            scale_factor,
            common.center_lon,
            common.center_lat,
            common.false_easting,
            common.false_northing,
            None,
        ))
    }

    /// UTM for `common.zone`, or for the zone containing the packed DMS
    /// longitude/latitude in slots 0 and 1 when the zone is zero.
    pub(crate) fn utm(common: &Common) -> ProjResult<Self> {
        let mut zone = common.zone;
        if zone == 0 {
            let lon = common.angle(0)?;
            let lat = common.angle(1)?;
            zone = calc_utm_zone(lon * R2D);
            if lat < 0.0 {
                zone = -zone;
            }
        }
        if zone.abs() < 1 || zone.abs() > 60 {
            return Err(ProjectionError::invalid(11));
        }

        let center_lon = ((6 * zone.abs()) - 183) as f64 * crate::constants::D2R;
        let false_northing = if zone < 0 { UTM_SOUTH_FALSE_NORTHING } else { 0.0 };
        Ok(Self::build(
            common,
            UTM_SCALE_FACTOR,
            center_lon,
            0.0,
            UTM_FALSE_EASTING,
            false_northing,
            Some(zone),
        ))
    }

    fn build(
        common: &Common,
        scale_factor: f64,
        center_lon: f64,
        lat_origin: f64,
        false_easting: f64,
        false_northing: f64,
        zone: Option<i32>,
    ) -> Self {
        let es = common.es();
        let (e0, e1, e2, e3) = (e0fn(es), e1fn(es), e2fn(es), e3fn(es));
        let r_major = common.r_major();
        Self {
            r_major,
            scale_factor,
            center_lon,
            lat_origin,
            false_easting,
            false_northing,
            es,
            esp: es / (1.0 - es),
            e0,
            e1,
            e2,
            e3,
            ml0: r_major * mlfn(e0, e1, e2, e3, lat_origin),
            spherical: es < 0.00001,
            zone,
        }
    }

    pub fn zone(&self) -> Option<i32> {
        self.zone
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let delta_lon = adjust_lon(lon - self.center_lon);
        let (sin_phi, cos_phi) = lat.sin_cos();
        let k = self.r_major * self.scale_factor;

        if self.spherical {
            let b = cos_phi * delta_lon.sin();
            if (b.abs() - 1.0).abs() < 0.0000000001 {
                return Err(ProjectionError::domain(93));
            }
            let x = 0.5 * k * ((1.0 + b) / (1.0 - b)).ln();
            // Rounding pushes the ratio just past 1.0 on the equator.
            let mut con = (cos_phi * delta_lon.cos() / (1.0 - b * b).sqrt())
                .clamp(-1.0, 1.0)
                .acos();
            if lat < 0.0 {
                con = -con;
            }
            let y = k * (con - self.lat_origin);
            return Ok((x + self.false_easting, y + self.false_northing));
        }

        let al = cos_phi * delta_lon;
        let als = al * al;
        let c = self.esp * cos_phi * cos_phi;
        let tq = lat.tan();
        let t = tq * tq;
        let con = 1.0 - self.es * sin_phi * sin_phi;
        let n = self.r_major / con.sqrt();
        let ml = self.r_major * mlfn(self.e0, self.e1, self.e2, self.e3, lat);

        let x = self.scale_factor
            * n
            * al
            * (1.0
                + als / 6.0
                    * (1.0 - t + c
                        + als / 20.0 * (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * self.esp)))
            + self.false_easting;

        let y = self.scale_factor
            * (ml - self.ml0
                + n * tq
                    * (als
                        * (0.5
                            + als / 24.0
                                * (5.0 - t + 9.0 * c + 4.0 * c * c
                                    + als / 30.0
                                        * (61.0 - 58.0 * t + t * t + 600.0 * c
                                            - 330.0 * self.esp)))))
            + self.false_northing;

        Ok((x, y))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let x = x - self.false_easting;
        let y = y - self.false_northing;

        if self.spherical {
            let k = self.r_major * self.scale_factor;
            let f = (x / k).exp();
            let g = 0.5 * (f - 1.0 / f);
            let temp = self.lat_origin + y / k;
            let h = temp.cos();
            let con = ((1.0 - h * h) / (1.0 + g * g)).sqrt();
            let mut lat = asinz(con);
            if temp < 0.0 {
                lat = -lat;
            }
            if g == 0.0 && h == 0.0 {
                return Ok((self.center_lon, lat));
            }
            return Ok((adjust_lon(g.atan2(h) + self.center_lon), lat));
        }

        let con = (self.ml0 + y / self.scale_factor) / self.r_major;
        let mut phi = con;
        let mut i = 0;
        loop {
            let delta_phi = ((con + self.e1 * (2.0 * phi).sin() - self.e2 * (4.0 * phi).sin()
                + self.e3 * (6.0 * phi).sin())
                / self.e0)
                - phi;
            phi += delta_phi;
            if delta_phi.abs() <= EPSLN {
                break;
            }
            if i >= MAX_ITER {
                return Err(ProjectionError::no_convergence(95));
            }
            i += 1;
        }

        if phi.abs() >= HALF_PI {
            return Ok((self.center_lon, HALF_PI * sign(y)));
        }

        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();
        let c = self.esp * cos_phi * cos_phi;
        let cs = c * c;
        let t = tan_phi * tan_phi;
        let ts = t * t;
        let con = 1.0 - self.es * sin_phi * sin_phi;
        let n = self.r_major / con.sqrt();
        let r = n * (1.0 - self.es) / con;
        let d = x / (n * self.scale_factor);
        let ds = d * d;

        let lat = phi
            - (n * tan_phi * ds / r)
                * (0.5
                    - ds / 24.0
                        * (5.0 + 3.0 * t + 10.0 * c - 4.0 * cs - 9.0 * self.esp
                            - ds / 30.0
                                * (61.0 + 90.0 * t + 298.0 * c + 45.0 * ts
                                    - 252.0 * self.esp
                                    - 3.0 * cs)));
        let lon = adjust_lon(
            self.center_lon
                + (d * (1.0
                    - ds / 6.0
                        * (1.0 + 2.0 * t + c
                            - ds / 20.0
                                * (5.0 - 2.0 * c + 28.0 * t - 3.0 * cs + 8.0 * self.esp
                                    + 24.0 * ts)))
                    / cos_phi),
        );
        Ok((lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{Datum, ProjCode, D2R};
    use crate::params::ProjectionSpec;

    fn on_sphere(code: ProjCode, zone: i32) -> Common {
        let spec = ProjectionSpec::new(code)
            .with_zone(zone)
            .with_datum(Datum::Sphere);
        Common::load(&spec).unwrap()
    }

    #[test]
    fn test_spherical_equator_is_finite() {
        let tm = TransverseMercator::new(&on_sphere(ProjCode::TransverseMercator, 0)).unwrap();
        assert!(tm.spherical);
        for lon in [-1.25, 1.25, -5.0, 0.0, 3.0] {
            let (x, y) = tm.forward(lon * D2R, 0.0).unwrap();
            assert!(x.is_finite() && y.is_finite(), "lon {lon} -> ({x}, {y})");
            assert!(y.abs() < 1e-6, "lon {lon} leaves the equator: {y}");
            let (lon2, lat2) = tm.inverse(x, y).unwrap();
            assert!((lon2 / D2R - lon).abs() < 1e-9, "lon {lon} -> {}", lon2 / D2R);
            assert!(lat2.abs() < 1e-12);
        }
    }

    #[test]
    fn test_spherical_utm_equator_round_trip() {
        let utm = TransverseMercator::utm(&on_sphere(ProjCode::Utm, 31)).unwrap();
        assert_eq!(utm.zone(), Some(31));
        let (x, y) = utm.forward(1.75 * D2R, 0.0).unwrap();
        assert!(y.is_finite());
        let (lon, lat) = utm.inverse(x, y).unwrap();
        assert!((lon / D2R - 1.75).abs() < 1e-9);
        assert!(lat.abs() < 1e-12);
    }
}
