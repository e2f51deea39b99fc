//! Space Oblique Mercator.
//!
//! Slot 12 selects the orbit description:
//!
//! * non-zero: Landsat satellite number (slot 2) and path (slot 3); the
//!   orbit and the longitude of the ascending node follow from those;
//! * zero: explicit orbit with inclination in slot 3 (packed DMS), the
//!   ascending node longitude in slot 4, the period in minutes in slot 8
//!   and a start-of-path flag in slot 10.

use crate::constants::{D2R, HALF_PI, LANDSAT_RATIO, PI};
use crate::error::{ProjResult, ProjectionError};
use crate::params::Common;
use crate::util::{adjust_lon, som_series, SomOrbit};

const MAX_ITER: usize = 50;

#[derive(Debug, Clone)]
pub struct SpaceObliqueMercator {
    a: f64,
    es: f64,
    center_lon: f64,
    false_easting: f64,
    false_northing: f64,
    start: f64,
    orbit: SomOrbit,
    u: f64,
    a2: f64,
    a4: f64,
    b: f64,
    c1: f64,
    c3: f64,
}

impl SpaceObliqueMercator {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        let es = common.es();
        let landsat = common.raw[12] != 0.0;

        let (alf, p21, center_lon, start) = if landsat {
            let satnum = common.raw[2] as i64;
            let path = common.raw[3] as i64 as f64;
            if satnum < 4 {
                (
                    99.092 * D2R,
                    103.2669323 / 1440.0,
                    (128.87 - (360.0 / 251.0 * path)) * D2R,
                    0.0,
                )
            } else {
                (
                    98.2 * D2R,
                    98.8841202 / 1440.0,
                    (129.30 - (360.0 / 233.0 * path)) * D2R,
                    0.0,
                )
            }
        } else {
            (
                common.angle(3)?,
                common.raw[8] / 1440.0,
                common.center_lon,
                common.raw[10],
            )
        };

        let mut ca = alf.cos();
        if ca.abs() < 1.0e-9 {
            ca = 1.0e-9;
        }
        let sa = alf.sin();
        let e2c = es * ca * ca;
        let e2s = es * sa * sa;
        let w = (1.0 - e2c) / (1.0 - es);
        let one_es = 1.0 - es;
        let orbit = SomOrbit {
            p21,
            sa,
            ca,
            q: e2s / one_es,
            t: (e2s * (2.0 - es)) / (one_es * one_es),
            w: w * w - 1.0,
            xj: one_es * one_es * one_es,
        };

        // Simpson's rule over 0..=90 degrees in 9 degree steps.
        let mut sums = [0.0; 5];
        let mut accumulate = |dlam: f64, weight: f64| {
            let (fb, fa2, fa4, fc1, fc3) = som_series(&orbit, dlam);
            for (sum, term) in sums.iter_mut().zip([fa2, fa4, fb, fc1, fc3]) {
                *sum += weight * term;
            }
        };
        accumulate(0.0, 1.0);
        for i in (9..=81).step_by(18) {
            accumulate(i as f64, 4.0);
        }
        for i in (18..=72).step_by(18) {
            accumulate(i as f64, 2.0);
        }
        accumulate(90.0, 1.0);
        let [suma2, suma4, sumb, sumc1, sumc3] = sums;

        Ok(Self {
            a: common.r_major(),
            es,
            center_lon,
            false_easting: common.false_easting,
            false_northing: common.false_northing,
            start,
            orbit,
            u: e2c / one_es,
            a2: suma2 / 30.0,
            a4: suma4 / 60.0,
            b: sumb / 30.0,
            c1: sumc1 / 15.0,
            c3: sumc3 / 45.0,
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        const CONV: f64 = 1.0e-7;
        let o = &self.orbit;
        let radlt = lat.clamp(-1.570796, 1.570796);
        let radln = lon - self.center_lon;

        let mut tlamp = if radlt < 0.0 {
            1.5 * PI
        } else if self.start != 0.0 {
            2.5 * PI
        } else {
            HALF_PI
        };

        let mut tlam;
        let mut xlamt;
        let mut passes = 0;
        loop {
            let mut sav = tlamp;
            let scl = if (radln + o.p21 * tlamp).cos() >= 0.0 {
                1.0
            } else {
                -1.0
            };
            let ab2 = tlamp - scl * tlamp.sin() * HALF_PI;

            let mut iterations = 0;
            loop {
                xlamt = radln + o.p21 * sav;
                let c = xlamt.cos();
                if c.abs() < 1.0e-7 {
                    xlamt -= 1.0e-7;
                }
                let xlam = ((1.0 - self.es) * radlt.tan() * o.sa + xlamt.sin() * o.ca) / c;
                tlam = xlam.atan() + ab2;
                if (sav.abs() - tlam.abs()).abs() < CONV {
                    break;
                }
                iterations += 1;
                if iterations > MAX_ITER {
                    return Err(ProjectionError::no_convergence(216));
                }
                sav = tlam;
            }

            // Keep the transformed longitude on the same orbit pass.
            let rlm = PI * LANDSAT_RATIO;
            let rlm2 = rlm + 2.0 * PI;
            passes += 1;
            let done = passes >= 3 || (tlam > rlm && tlam < rlm2);
            if tlam < rlm {
                tlamp = 2.5 * PI;
            }
            if tlam >= rlm2 {
                tlamp = HALF_PI;
            }
            if done {
                break;
            }
        }

        let dp = radlt.sin();
        let tphi = (((1.0 - self.es) * o.ca * dp - o.sa * radlt.cos() * xlamt.sin())
            / (1.0 - self.es * dp * dp).sqrt())
        .asin();
        let tanlg = (PI / 4.0 + tphi / 2.0).tan().ln();
        let sd = tlam.sin();
        let s = o.s_term(tlam);
        let d = (o.xj * o.xj + s * s).sqrt();

        let x = self.b * tlam + self.a2 * (2.0 * tlam).sin() + self.a4 * (4.0 * tlam).sin()
            - tanlg * s / d;
        let y = self.c1 * sd + self.c3 * (3.0 * tlam).sin() + tanlg * o.xj / d;
        Ok((
            x * self.a + self.false_easting,
            y * self.a + self.false_northing,
        ))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        const CONV: f64 = 1.0e-9;
        let o = &self.orbit;
        let a = self.a;
        let x = x - self.false_easting;
        let y = y - self.false_northing;

        let mut tlon = x / (a * self.b);
        let mut s = 0.0;
        let mut converged = false;
        for _ in 0..MAX_ITER {
            let sav = tlon;
            s = o.s_term(tlon);
            let blon = (x / a) + (y / a) * s / o.xj
                - self.a2 * (2.0 * tlon).sin()
                - self.a4 * (4.0 * tlon).sin()
                - (s / o.xj) * (self.c1 * tlon.sin() + self.c3 * (3.0 * tlon).sin());
            tlon = blon / self.b;
            if (tlon - sav).abs() < CONV {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(ProjectionError::no_convergence(214));
        }

        let st = tlon.sin();
        let defac = ((1.0 + s * s / o.xj / o.xj).sqrt()
            * (y / a - self.c1 * st - self.c3 * (3.0 * tlon).sin()))
        .exp();
        let tlat = 2.0 * (defac.atan() - PI / 4.0);
        let dd = st * st;
        if tlon.cos().abs() < 1.0e-7 {
            tlon -= 1.0e-7;
        }
        let bigk = tlat.sin();
        let bigk2 = bigk * bigk;
        let mut xlamt = (((1.0 - bigk2 / (1.0 - self.es)) * tlon.tan() * o.ca
            - bigk * o.sa * ((1.0 + o.q * dd) * (1.0 - bigk2) - bigk2 * self.u).sqrt()
                / tlon.cos())
            / (1.0 - bigk2 * (1.0 + self.u)))
            .atan();
        let sl = if xlamt >= 0.0 { 1.0 } else { -1.0 };
        let scl = if tlon.cos() >= 0.0 { 1.0 } else { -1.0 };
        xlamt -= HALF_PI * (1.0 - scl) * sl;
        let dlon = xlamt - o.p21 * tlon;

        let lat = if o.sa.abs() < 1.0e-7 {
            (bigk / ((1.0 - self.es) * (1.0 - self.es) + self.es * bigk2).sqrt()).asin()
        } else {
            ((tlon.tan() * xlamt.cos() - o.ca * xlamt.sin()) / ((1.0 - self.es) * o.sa)).atan()
        };
        Ok((adjust_lon(dlon + self.center_lon), lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ProjCode;
    use crate::params::ProjectionSpec;

    fn landsat(satnum: f64, path: f64) -> SpaceObliqueMercator {
        let spec = ProjectionSpec::new(ProjCode::SpaceObliqueMercator)
            .with_param(2, satnum)
            .with_param(3, path)
            .with_param(12, 1.0);
        SpaceObliqueMercator::new(&Common::load(&spec).unwrap()).unwrap()
    }

    #[test]
    fn test_landsat_path_sets_ascending_node() {
        let som = landsat(5.0, 10.0);
        let expected = (129.30 - 360.0 / 233.0 * 10.0) * D2R;
        assert!((som.center_lon - expected).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip_near_ground_track() {
        let som = landsat(5.0, 30.0);
        let lon0 = som.center_lon;
        for lat in [10.0_f64, 25.0, 40.0] {
            let lon = lon0 - 0.2 * lat * D2R;
            let (x, y) = som.forward(lon, lat * D2R).unwrap();
            let (lon2, lat2) = som.inverse(x, y).unwrap();
            assert!((adjust_lon(lon2 - lon)).abs() < 1e-5, "lat {lat}");
            assert!((lat2 - lat * D2R).abs() < 1e-5, "lat {lat}");
        }
    }
}
