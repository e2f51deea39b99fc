//! Robinson.
//!
//! Forward and inverse interpolate the published 5° tables with Stirling's
//! second-difference formula; the inverse iterates on latitude until the
//! forward series reproduces `y`.

use crate::constants::{EPSLN, PI};
use crate::error::{ProjResult, ProjectionError};
use crate::params::Common;
use crate::projections::pseudocylindrical::SphereOrigin;
use crate::util::adjust_lon;

/// Parallel distances; slot 0 is padding so the table can be indexed from
/// one below the equator row.
const PR: [f64; 21] = [
    0.0, -0.062, 0.0, 0.062, 0.124, 0.186, 0.248, 0.31, 0.372, 0.434, 0.4958, 0.5571, 0.6176,
    0.6769, 0.7346, 0.7903, 0.8435, 0.8936, 0.9394, 0.9761, 1.0,
];

/// Parallel lengths before scaling by [`XLR_SCALE`].
const XLR: [f64; 21] = [
    0.0, 0.9986, 1.0, 0.9986, 0.9954, 0.99, 0.9822, 0.973, 0.96, 0.9427, 0.9216, 0.8962, 0.8679,
    0.835, 0.7986, 0.7597, 0.7186, 0.6732, 0.6213, 0.5722, 0.5322,
];

const XLR_SCALE: f64 = 0.9858;

/// Iteration cap of the inverse latitude search.
const MAX_ITER: usize = 75;

const DEG_TO_RAD: f64 = 0.01745329252;

#[derive(Debug, Clone)]
pub struct Robinson {
    origin: SphereOrigin,
}

/// Stirling interpolation in `table` at row `ip1` with fraction `p2`.
fn stirling(table: &[f64; 21], ip1: usize, p2: f64) -> f64 {
    table[ip1 + 2]
        + p2 * (table[ip1 + 3] - table[ip1 + 1]) / 2.0
        + p2 * p2 * (table[ip1 + 3] - 2.0 * table[ip1 + 2] + table[ip1 + 1]) / 2.0
}

/// Row index for `p2` (a latitude in units of 5°), clamped to the table.
fn row(p2: f64) -> usize {
    ((p2 - EPSLN).max(0.0) as usize).min(17)
}

impl Robinson {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            origin: SphereOrigin::new(common),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let r = self.origin.radius;
        let dlon = self.origin.dlon(lon);
        let p2 = (lat / 5.0 / DEG_TO_RAD).abs();
        let ip1 = row(p2);
        let p2 = p2 - ip1 as f64;

        let x = r * stirling(&XLR, ip1, p2) * XLR_SCALE * dlon;
        let y = r * stirling(&PR, ip1, p2) * PI / 2.0;
        Ok(self.origin.offset(x, if lat >= 0.0 { y } else { -y }))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (x, y) = self.origin.unoffset(x, y);
        let r = self.origin.radius;
        let yy = 2.0 * y / PI / r;
        let mut phid = yy * 90.0;
        let mut p2 = (phid / 5.0).abs();
        let mut ip1 = (p2 - EPSLN).max(0.0) as i64;
        if ip1 == 0 {
            ip1 = 1;
        }
        let mut ip1 = ip1.min(17);

        let mut i = 0;
        loop {
            let row = ip1 as usize;
            let u = PR[row + 3] - PR[row + 1];
            let v = PR[row + 3] - 2.0 * PR[row + 2] + PR[row + 1];
            let t = 2.0 * (yy.abs() - PR[row + 2]) / u;
            let c = v / u;
            p2 = t * (1.0 - c * t * (1.0 - 2.0 * c * t));

            if p2 >= 0.0 || ip1 == 1 {
                phid = (p2 + ip1 as f64) * 5.0;
                if y < 0.0 {
                    phid = -phid;
                }
                loop {
                    p2 = (phid / 5.0).abs();
                    ip1 = row_index(p2);
                    p2 -= ip1 as f64;
                    let y1 = r * stirling(&PR, ip1 as usize, p2) * PI / 2.0;
                    let y1 = if y >= 0.0 { y1 } else { -y1 };
                    phid += -180.0 * (y1 - y) / PI / r;
                    i += 1;
                    if i > MAX_ITER {
                        return Err(ProjectionError::no_convergence(234));
                    }
                    if (y1 - y).abs() <= 0.00001 {
                        break;
                    }
                }
                break;
            }

            ip1 -= 1;
            if ip1 < 0 {
                return Err(ProjectionError::no_convergence(234));
            }
        }

        let lat = phid * DEG_TO_RAD;
        let lon = self.origin.center_lon
            + x / r / (stirling(&XLR, ip1 as usize, p2) * XLR_SCALE);
        Ok((adjust_lon(lon), lat))
    }
}

fn row_index(p2: f64) -> i64 {
    row(p2) as i64
}
