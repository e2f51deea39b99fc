//! Geodesy primitives shared by the projections.
//!
//! These follow the published GCTP formulas exactly, including iteration
//! limits and convergence tolerances, so results stay comparable with other
//! GCTP-derived software. Iterative helpers return `NoConvergence` carrying
//! the GCTP status code when they run out of iterations.

use raster_common::Unit;

use crate::constants::{
    Datum, DBLLONG, EPSLN, HALF_PI, MAJOR_AXES, MAXLONG, MAX_VAL, MINOR_AXES, PI, R2D, RADVAL,
    S2R, SPHDCT, TWO_PI, UNIT_FACTORS,
};
use crate::error::{ProjResult, ProjectionError};

/// Sign of `x`, treating zero as positive.
pub fn sign(x: f64) -> f64 {
    if x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// `asin` with the argument clamped to [-1, 1].
pub fn asinz(con: f64) -> f64 {
    con.clamp(-1.0, 1.0).asin()
}

/// Reduce a longitude in radians to [-PI, PI].
///
/// Large magnitudes are reduced in several scales before the final
/// subtraction so the result stays exact for values far outside the range.
pub fn adjust_lon(mut x: f64) -> f64 {
    let mut count = 0;
    loop {
        if x.abs() <= PI {
            break;
        } else if ((x / PI).abs() as i64) < 2 {
            x -= sign(x) * TWO_PI;
        } else if (((x / TWO_PI).abs() as i64) as f64) < MAXLONG {
            x -= ((x / TWO_PI) as i64) as f64 * TWO_PI;
        } else if (((x / (MAXLONG * TWO_PI)).abs() as i64) as f64) < MAXLONG {
            x -= ((x / (MAXLONG * TWO_PI)) as i64) as f64 * (TWO_PI * MAXLONG);
        } else if (((x / (DBLLONG * TWO_PI)).abs() as i64) as f64) < MAXLONG {
            x -= ((x / (DBLLONG * TWO_PI)) as i64) as f64 * (TWO_PI * DBLLONG);
        } else {
            x -= sign(x) * TWO_PI;
        }

        count += 1;
        if count > MAX_VAL {
            break;
        }
    }
    x
}

pub fn msfnz(eccent: f64, sinphi: f64, cosphi: f64) -> f64 {
    let con = eccent * sinphi;
    cosphi / (1.0 - con * con).sqrt()
}

pub fn qsfnz(eccent: f64, sinphi: f64) -> f64 {
    if eccent > 1.0e-7 {
        let con = eccent * sinphi;
        (1.0 - eccent * eccent)
            * (sinphi / (1.0 - con * con) - (0.5 / eccent) * ((1.0 - con) / (1.0 + con)).ln())
    } else {
        2.0 * sinphi
    }
}

pub fn tsfnz(eccent: f64, phi: f64, sinphi: f64) -> f64 {
    let con = eccent * sinphi;
    let com = 0.5 * eccent;
    let con = ((1.0 - con) / (1.0 + con)).powf(com);
    (0.5 * (HALF_PI - phi)).tan() / con
}

/// Latitude from the authalic `qs` (Albers inverse).
pub fn phi1z(eccent: f64, qs: f64) -> ProjResult<f64> {
    let mut phi = asinz(0.5 * qs);
    if eccent < EPSLN {
        return Ok(phi);
    }

    let eccnts = eccent * eccent;
    for _ in 1..=25 {
        let (sinpi, cospi) = phi.sin_cos();
        let con = eccent * sinpi;
        let com = 1.0 - con * con;
        let dphi = 0.5 * com * com / cospi
            * (qs / (1.0 - eccnts) - sinpi / com
                + 0.5 / eccent * ((1.0 - con) / (1.0 + con)).ln());
        phi += dphi;
        if dphi.abs() <= 1e-7 {
            return Ok(phi);
        }
    }
    Err(ProjectionError::no_convergence(1))
}

/// Latitude from the isometric `ts` (conformal inverses).
pub fn phi2z(eccent: f64, ts: f64) -> ProjResult<f64> {
    let eccnth = 0.5 * eccent;
    let mut phi = HALF_PI - 2.0 * ts.atan();
    for _ in 0..=15 {
        let con = eccent * phi.sin();
        let dphi = HALF_PI - 2.0 * (ts * ((1.0 - con) / (1.0 + con)).powf(eccnth)).atan() - phi;
        phi += dphi;
        if dphi.abs() <= 0.0000000001 {
            return Ok(phi);
        }
    }
    Err(ProjectionError::no_convergence(2))
}

/// Latitude from the meridional distance `ml`.
pub fn phi3z(ml: f64, e0: f64, e1: f64, e2: f64, e3: f64) -> ProjResult<f64> {
    let mut phi = ml;
    for _ in 0..15 {
        let dphi =
            (ml + e1 * (2.0 * phi).sin() - e2 * (4.0 * phi).sin() + e3 * (6.0 * phi).sin()) / e0
                - phi;
        phi += dphi;
        if dphi.abs() <= 0.0000000001 {
            return Ok(phi);
        }
    }
    Err(ProjectionError::no_convergence(3))
}

/// Latitude for the ellipsoidal polyconic inverse. Returns `(phi, c)`.
#[allow(clippy::too_many_arguments)]
pub fn phi4z(eccent: f64, e0: f64, e1: f64, e2: f64, e3: f64, a: f64, b: f64) -> ProjResult<(f64, f64)> {
    let mut phi = a;
    for _ in 1..=15 {
        let sinphi = phi.sin();
        let tanphi = phi.tan();
        let c = tanphi * (1.0 - eccent * sinphi * sinphi).sqrt();
        let sin2ph = (2.0 * phi).sin();
        let ml = e0 * phi - e1 * sin2ph + e2 * (4.0 * phi).sin() - e3 * (6.0 * phi).sin();
        let mlp = e0 - 2.0 * e1 * (2.0 * phi).cos() + 4.0 * e2 * (4.0 * phi).cos()
            - 6.0 * e3 * (6.0 * phi).cos();
        let con1 = 2.0 * ml + c * (ml * ml + b) - 2.0 * a * (c * ml + 1.0);
        let con2 = eccent * sin2ph * (ml * ml + b - 2.0 * a * ml) / (2.0 * c);
        let con3 = 2.0 * (a - ml) * (c * mlp - 2.0 / sin2ph) - 2.0 * mlp;
        let dphi = con1 / (con2 + con3);
        phi += dphi;
        if dphi.abs() <= 0.0000000001 {
            return Ok((phi, c));
        }
    }
    Err(ProjectionError::no_convergence(4))
}

pub fn e0fn(x: f64) -> f64 {
    1.0 - 0.25 * x * (1.0 + x / 16.0 * (3.0 + 1.25 * x))
}

pub fn e1fn(x: f64) -> f64 {
    0.375 * x * (1.0 + 0.25 * x * (1.0 + 0.46875 * x))
}

pub fn e2fn(x: f64) -> f64 {
    0.05859375 * x * x * (1.0 + 0.75 * x)
}

pub fn e3fn(x: f64) -> f64 {
    x * x * x * (35.0 / 3072.0)
}

pub fn e4fn(x: f64) -> f64 {
    let con = 1.0 + x;
    let com = 1.0 - x;
    (con.powf(con) * com.powf(com)).sqrt()
}

/// Meridional distance for latitude `phi`.
pub fn mlfn(e0: f64, e1: f64, e2: f64, e3: f64, phi: f64) -> f64 {
    e0 * phi - e1 * (2.0 * phi).sin() + e2 * (4.0 * phi).sin() - e3 * (6.0 * phi).sin()
}

/// UTM zone number for a longitude in degrees.
pub fn calc_utm_zone(lon: f64) -> i32 {
    ((lon + 180.0) / 6.0 + 1.0) as i32
}

// ============================================================================
// Packed angles
// ============================================================================

/// Convert a packed DMS angle (`DDDMMMSSS.SS`) to decimal degrees.
pub fn paksz(ang: f64) -> ProjResult<f64> {
    let fac = if ang < 0.0 { -1.0 } else { 1.0 };

    let mut sec = ang.abs();
    let mut tmp = 1000000.0;
    let deg = (sec / tmp) as i64;
    if deg > 360 {
        return Err(ProjectionError::invalid(1116));
    }
    let deg = deg as f64;

    sec -= deg * tmp;
    tmp = 1000.0;
    let min = (sec / tmp) as i64;
    if min > 60 {
        return Err(ProjectionError::invalid(1116));
    }
    let min = min as f64;

    sec -= min * tmp;
    if sec > 60.0 {
        return Err(ProjectionError::invalid(1116));
    }

    Ok(fac * (deg * 3600.0 + min * 60.0 + sec) / 3600.0)
}

/// Packed DMS angle to radians.
pub fn dms_to_rad(angle: f64) -> ProjResult<f64> {
    Ok(paksz(angle)? * 3600.0 * S2R)
}

/// Pack a `DDDMMSS.SS` value into `DDDMMMSSS.SS`.
pub fn pakcz(pak: f64) -> f64 {
    let mut con = pak.abs();
    let degs = ((con / 10000.0) + 0.001) as i64;
    con -= (degs * 10000) as f64;
    let mins = ((con / 100.0) + 0.001) as i64;
    let secs = con - (mins * 100) as f64;
    let con = degs as f64 * 1000000.0 + mins as f64 * 1000.0 + secs;
    if pak < 0.0 {
        -con
    } else {
        con
    }
}

/// Radians to packed DMS.
pub fn pakr2dm(pak: f64) -> f64 {
    pack_dms(pak * R2D)
}

/// Decimal degrees to packed DMS, the inverse of [`paksz`].
pub fn pack_dms(degrees: f64) -> f64 {
    let negative = degrees < 0.0;
    let mut con = degrees.abs();
    let degs = con as i64;
    con = (con - degs as f64) * 60.0;
    let mins = con as i64;
    let secs = (con - mins as f64) * 60.0;
    let packed = degs as f64 * 1000000.0 + mins as f64 * 1000.0 + secs;
    if negative {
        -packed
    } else {
        packed
    }
}

// ============================================================================
// Units and spheroids
// ============================================================================

/// Conversion factor from `from` units to `to` units.
pub fn untfz(from: Unit, to: Unit) -> ProjResult<f64> {
    let (i, o) = match (usize::try_from(from.code()), usize::try_from(to.code())) {
        (Ok(i), Ok(o)) if i < 6 && o < 6 => (i, o),
        _ => return Err(ProjectionError::invalid(5)),
    };
    let factor = UNIT_FACTORS[i][o];
    if factor == 0.0 {
        return Err(ProjectionError::IncompatibleUnits { from, to });
    }
    Ok(factor)
}

/// Semi-major axis, semi-minor axis and reference sphere radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spheroid {
    pub r_major: f64,
    pub r_minor: f64,
    pub radius: f64,
}

/// Resolve the spheroid for a datum, reading the axes from `params[0]` and
/// `params[1]` when the datum is not set.
///
/// With no datum, `params[1]` is either a semi-minor axis (> 1), an
/// eccentricity squared (0 < e² <= 1), or zero for a sphere of radius
/// `params[0]`. When `params[0]` is zero too, Clarke 1866 or the reference
/// sphere is used.
pub fn sphdz(datum: Datum, params: &[f64; 15]) -> Spheroid {
    match usize::try_from(datum.code()) {
        Ok(index) => {
            let index = if index > SPHDCT - 1 { 0 } else { index };
            Spheroid {
                r_major: MAJOR_AXES[index],
                r_minor: MINOR_AXES[index],
                radius: MAJOR_AXES[RADVAL],
            }
        }
        Err(_) => {
            let t_major = params[0].abs();
            let t_minor = params[1].abs();
            if t_major > 0.0 {
                let r_minor = if t_minor > 1.0 {
                    t_minor
                } else if t_minor > 0.0 {
                    (1.0 - t_minor).sqrt() * t_major
                } else {
                    t_major
                };
                Spheroid {
                    r_major: t_major,
                    r_minor,
                    radius: t_major,
                }
            } else if t_minor > 0.0 {
                Spheroid {
                    r_major: MAJOR_AXES[0],
                    r_minor: MINOR_AXES[0],
                    radius: MAJOR_AXES[0],
                }
            } else {
                Spheroid {
                    r_major: MAJOR_AXES[RADVAL],
                    r_minor: MAJOR_AXES[RADVAL],
                    radius: MAJOR_AXES[RADVAL],
                }
            }
        }
    }
}

// ============================================================================
// Space Oblique Mercator series
// ============================================================================

/// Orbit constants feeding the SOM Fourier series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SomOrbit {
    pub p21: f64,
    pub sa: f64,
    pub ca: f64,
    pub q: f64,
    pub t: f64,
    pub w: f64,
    pub xj: f64,
}

impl SomOrbit {
    /// The `S` term of the SOM equations at transformed longitude `tlam`.
    pub fn s_term(&self, tlam: f64) -> f64 {
        let sd = tlam.sin();
        let sdsq = sd * sd;
        self.p21
            * self.sa
            * tlam.cos()
            * ((1.0 + self.t * sdsq) / ((1.0 + self.w * sdsq) * (1.0 + self.q * sdsq))).sqrt()
    }
}

/// Series terms at `dlam` degrees: `(fb, fa2, fa4, fc1, fc3)`.
pub fn som_series(orbit: &SomOrbit, dlam: f64) -> (f64, f64, f64, f64, f64) {
    let dlam = dlam * 0.0174532925;
    let sd = dlam.sin();
    let sdsq = sd * sd;
    let (q, w) = (orbit.q, orbit.w);
    let s = orbit.s_term(dlam);
    let h = ((1.0 + q * sdsq) / (1.0 + w * sdsq)).sqrt()
        * (((1.0 + w * sdsq) / ((1.0 + q * sdsq) * (1.0 + q * sdsq))) - orbit.p21 * orbit.ca);
    let sq = (orbit.xj * orbit.xj + s * s).sqrt();
    let fb = (h * orbit.xj - s * s) / sq;
    let fa2 = fb * (2.0 * dlam).cos();
    let fa4 = fb * (4.0 * dlam).cos();
    let fc = s * (h + orbit.xj) / sq;
    let fc1 = fc * dlam.cos();
    let fc3 = fc * (3.0 * dlam).cos();
    (fb, fa2, fa4, fc1, fc3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::D2R;

    #[test]
    fn test_adjust_lon_range_and_idempotence() {
        let samples = [
            0.0, 1.0, -1.0, PI, -PI, 3.5, -3.5, 7.0, -7.0, 100.0, -100.0, 1.0e6, -1.0e6,
            1.0e12, 12.0 * PI + 0.25,
        ];
        for x in samples {
            let once = adjust_lon(x);
            assert!(once.abs() <= PI + 1e-9, "adjust_lon({}) = {} out of range", x, once);
            let twice = adjust_lon(once);
            assert!((once - twice).abs() < 1e-12, "adjust_lon not idempotent for {}", x);
        }
    }

    #[test]
    fn test_adjust_lon_preserves_angle() {
        let x = 190.0 * D2R;
        let adjusted = adjust_lon(x);
        assert!((adjusted - (-170.0 * D2R)).abs() < 1e-12);
    }

    #[test]
    fn test_paksz_and_pack_dms() {
        // 45°30'36" packed
        let deg = paksz(45030036.0).unwrap();
        assert!((deg - 45.51).abs() < 1e-9);
        assert!((paksz(pack_dms(-123.456)).unwrap() + 123.456).abs() < 1e-9);
        assert!(paksz(400000000.0).is_err());
        assert!(paksz(10070000.0).is_err());
    }

    #[test]
    fn test_pakcz() {
        assert_eq!(pakcz(453036.0), 45030036.0);
        assert_eq!(pakcz(-453036.0), -45030036.0);
    }

    #[test]
    fn test_pakr2dm() {
        let packed = pakr2dm(45.5_f64.to_radians());
        assert!((paksz(packed).unwrap() - 45.5).abs() < 1e-9, "{packed}");
    }

    #[test]
    fn test_untfz() {
        assert_eq!(untfz(Unit::Meter, Unit::Meter).unwrap(), 1.0);
        assert!((untfz(Unit::Radian, Unit::Degree).unwrap() - R2D).abs() < 1e-9);
        assert!(matches!(
            untfz(Unit::Meter, Unit::Degree),
            Err(ProjectionError::IncompatibleUnits { .. })
        ));
        assert!(untfz(Unit::Undefined, Unit::Meter).is_err());
    }

    #[test]
    fn test_sphdz_variants() {
        let mut params = [0.0; 15];
        let s = sphdz(Datum::Wgs84, &params);
        assert_eq!(s.r_major, 6378137.0);
        assert_eq!(s.radius, 6370997.0);

        params[0] = 6378137.0;
        params[1] = 0.006694379990;
        let s = sphdz(Datum::NotSet, &params);
        assert!((s.r_minor - 6356752.314).abs() < 0.01);

        params[1] = 0.0;
        let s = sphdz(Datum::NotSet, &params);
        assert_eq!(s.r_minor, 6378137.0);

        let s = sphdz(Datum::NotSet, &[0.0; 15]);
        assert_eq!(s.r_major, 6370997.0);
    }

    #[test]
    fn test_phi_inversions() {
        let e: f64 = 0.0818191908426;
        let phi = 0.7;
        let ts = tsfnz(e, phi, phi.sin());
        assert!((phi2z(e, ts).unwrap() - phi).abs() < 1e-9);

        let qs = qsfnz(e, phi.sin());
        assert!((phi1z(e, qs).unwrap() - phi).abs() < 1e-6);

        let es = e * e;
        let (e0, e1, e2, e3) = (e0fn(es), e1fn(es), e2fn(es), e3fn(es));
        let ml = mlfn(e0, e1, e2, e3, phi);
        assert!((phi3z(ml, e0, e1, e2, e3).unwrap() - phi).abs() < 1e-9);
    }

    #[test]
    fn test_calc_utm_zone() {
        assert_eq!(calc_utm_zone(-177.0), 1);
        assert_eq!(calc_utm_zone(3.0), 31);
        assert_eq!(calc_utm_zone(179.0), 60);
    }
}
