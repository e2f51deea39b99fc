//! Modified-stereographic conformal projection for Alaska.
//!
//! Center and eccentricity are fixed (152°W, 64°N, Clarke 1866); only the
//! semi-major axis and false easting/northing come from the parameters.

use crate::constants::{D2R, EPSLN, HALF_PI};
use crate::error::{ProjResult, ProjectionError};
use crate::params::Common;
use crate::util::{adjust_lon, asinz};

const CENTER_LON: f64 = -152.0 * D2R;
const CENTER_LAT: f64 = 64.0 * D2R;
const CLARKE_1866_ES: f64 = 0.006768657997291094;

/// Series order.
const N: usize = 6;
const ACOEF: [f64; N + 1] = [
    0.0, 0.9945303, 0.0052083, 0.0072721, -0.0151089, 0.0642675, 0.3582802,
];
const BCOEF: [f64; N + 1] = [
    0.0, 0.0, -0.0027404, 0.0048181, -0.1932526, -0.1381226, -0.2884586,
];

const MAX_ITER: usize = 20;

#[derive(Debug, Clone)]
pub struct AlaskaConformal {
    r_major: f64,
    false_easting: f64,
    false_northing: f64,
    e: f64,
    sin_center_lat: f64,
    cos_center_lat: f64,
}

impl AlaskaConformal {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        let e = CLARKE_1866_ES.sqrt();
        let chi = conformal_lat(e, CENTER_LAT);
        let (sin_center_lat, cos_center_lat) = chi.sin_cos();
        Ok(Self {
            r_major: common.r_major(),
            false_easting: common.false_easting,
            false_northing: common.false_northing,
            e,
            sin_center_lat,
            cos_center_lat,
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let dlon = adjust_lon(lon - CENTER_LON);
        let (sinlon, coslon) = dlon.sin_cos();
        let (sinphi, cosphi) = conformal_lat(self.e, lat).sin_cos();

        // Oblique stereographic.
        let g = self.sin_center_lat * sinphi + self.cos_center_lat * cosphi * coslon;
        let s = 2.0 / (1.0 + g);
        let xp = s * cosphi * sinlon;
        let yp = s * (self.cos_center_lat * sinphi - self.sin_center_lat * cosphi * coslon);

        let (ar, ai, br, bi) = series(xp, yp);
        Ok((
            (xp * ar - yp * ai + br) * self.r_major + self.false_easting,
            (yp * ar + xp * ai + bi) * self.r_major + self.false_northing,
        ))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let x = (x - self.false_easting) / self.r_major;
        let y = (y - self.false_northing) / self.r_major;

        // Newton iteration back to oblique stereographic coordinates.
        let (mut xp, mut yp) = (x, y);
        let mut iterations = 0;
        loop {
            let (ar, ai, br, bi) = series(xp, yp);
            let (cr, ci, dr, di) = series_derivative(xp, yp);
            let fxyr = xp * ar - yp * ai + br - x;
            let fxyi = yp * ar + xp * ai + bi - y;
            let fpxyr = xp * cr - yp * ci + dr;
            let fpxyi = yp * cr + xp * ci + di;
            let den = fpxyr * fpxyr + fpxyi * fpxyi;
            let dxp = -(fxyr * fpxyr + fxyi * fpxyi) / den;
            let dyp = -(fxyi * fpxyr - fxyr * fpxyi) / den;
            xp += dxp;
            yp += dyp;
            iterations += 1;
            if iterations > MAX_ITER {
                return Err(ProjectionError::no_convergence(235));
            }
            if dxp.abs() + dyp.abs() <= EPSLN {
                break;
            }
        }

        let rh = (xp * xp + yp * yp).sqrt();
        if rh.abs() <= EPSLN {
            return Ok((CENTER_LON, CENTER_LAT));
        }
        let z = 2.0 * (rh / 2.0).atan();
        let (sinz, cosz) = z.sin_cos();
        let chi = asinz(cosz * self.sin_center_lat + (yp * sinz * self.cos_center_lat) / rh);

        let mut phi = chi;
        let mut iterations = 0;
        loop {
            let esphi = self.e * phi.sin();
            let dphi = 2.0
                * (((HALF_PI + chi) / 2.0).tan()
                    * ((1.0 + esphi) / (1.0 - esphi)).powf(self.e / 2.0))
                .atan()
                - HALF_PI
                - phi;
            phi += dphi;
            iterations += 1;
            if iterations > MAX_ITER {
                return Err(ProjectionError::no_convergence(236));
            }
            if dphi.abs() <= EPSLN {
                break;
            }
        }

        let lon = adjust_lon(
            CENTER_LON
                + (xp * sinz)
                    .atan2(rh * self.cos_center_lat * cosz - yp * self.sin_center_lat * sinz),
        );
        Ok((lon, phi))
    }
}

fn conformal_lat(e: f64, lat: f64) -> f64 {
    let esphi = e * lat.sin();
    2.0 * (((HALF_PI + lat) / 2.0).tan() * ((1.0 - esphi) / (1.0 + esphi)).powf(e / 2.0)).atan()
        - HALF_PI
}

/// Complex polynomial of the modified-stereographic series evaluated at
/// `xp + i*yp` by Knuth's method. Returns `(ar, ai, br, bi)` so that the
/// value is `z * (ar + i*ai) + (br + i*bi)`.
fn series(xp: f64, yp: f64) -> (f64, f64, f64, f64) {
    let r = xp + xp;
    let s = xp * xp + yp * yp;
    let (mut ar, mut ai) = (ACOEF[N], BCOEF[N]);
    let (mut br, mut bi) = (ACOEF[N - 1], BCOEF[N - 1]);
    for j in 2..=N {
        let arn = br + r * ar;
        let ain = bi + r * ai;
        br = ACOEF[N - j] - s * ar;
        bi = BCOEF[N - j] - s * ai;
        ar = arn;
        ai = ain;
    }
    // The last step above computed br/bi from index 0, which is zero.
    (ar, ai, br, bi)
}

/// Same evaluation for the derivative polynomial, coefficients `k * a_k`.
fn series_derivative(xp: f64, yp: f64) -> (f64, f64, f64, f64) {
    let r = xp + xp;
    let s = xp * xp + yp * yp;
    let (mut cr, mut ci) = (N as f64 * ACOEF[N], N as f64 * BCOEF[N]);
    let (mut dr, mut di) = ((N - 1) as f64 * ACOEF[N - 1], (N - 1) as f64 * BCOEF[N - 1]);
    for j in 2..N {
        let crn = dr + r * cr;
        let cin = di + r * ci;
        dr = (N - j) as f64 * ACOEF[N - j] - s * cr;
        di = (N - j) as f64 * BCOEF[N - j] - s * ci;
        cr = crn;
        ci = cin;
    }
    (cr, ci, dr, di)
}
