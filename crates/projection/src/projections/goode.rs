//! Goode Homolosine and Interrupted Mollweide.
//!
//! Both are spherical world projections cut into lobes, each lobe with its
//! own central meridian. Inverse points that land outside their lobe's
//! longitude range are reported as [`ProjectionError::InBreak`] carrying
//! the computed longitude/latitude.

use crate::constants::{EPSLN, HALF_PI, PI};
use crate::error::{ProjResult, ProjectionError, IN_BREAK};
use crate::params::Common;
use crate::projections::pseudocylindrical::auxiliary_angle;
use crate::util::{adjust_lon, sign};

/// Latitude where the sinusoidal and homolographic zones meet (40°44'11.8").
const HOMOLINE: f64 = 0.710987989993;

const MOLL_X: f64 = 0.900316316158;
const MOLL_Y: f64 = 1.4142135623731;
/// Vertical offset aligning the Mollweide zones with the sinusoidal zone.
const GOODE_Y_SHIFT: f64 = 0.0528035274542;

const LON_M100: f64 = -1.74532925199;
const LON_M40: f64 = -0.698131700798;
const LON_M20: f64 = -0.349065850399;
const LON_80: f64 = 1.3962634016;

#[derive(Debug, Clone, Copy)]
struct Lobe {
    center_lon: f64,
    west: f64,
    east: f64,
}

const fn lobe(center_lon: f64, west: f64, east: f64) -> Lobe {
    Lobe {
        center_lon,
        west,
        east,
    }
}

const WEST_EDGE: f64 = -(PI + EPSLN);
const EAST_EDGE: f64 = PI + EPSLN;

/// Goode regions. 1, 3, 4, 5, 8 and 9 are sinusoidal; the rest are
/// homolographic (0 and 2 north, 6, 7, 10 and 11 south).
const GOODE_LOBES: [Lobe; 12] = [
    lobe(LON_M100, WEST_EDGE, LON_M40),
    lobe(LON_M100, WEST_EDGE, LON_M40),
    lobe(0.523598775598, LON_M40, EAST_EDGE),
    lobe(0.523598775598, LON_M40, EAST_EDGE),
    lobe(-2.79252680319, WEST_EDGE, LON_M100),
    lobe(-1.0471975512, LON_M100, LON_M20),
    lobe(-2.79252680319, WEST_EDGE, LON_M100),
    lobe(-1.0471975512, LON_M100, LON_M20),
    lobe(0.349065850399, LON_M20, LON_80),
    lobe(2.44346095279, LON_80, EAST_EDGE),
    lobe(0.349065850399, LON_M20, LON_80),
    lobe(2.44346095279, LON_80, EAST_EDGE),
];

fn is_sinusoidal_region(region: usize) -> bool {
    matches!(region, 1 | 3 | 4 | 5 | 8 | 9)
}

/// Region index from a latitude-like and longitude-like value scaled to
/// the unit sphere. Used by both directions.
fn goode_region(lat: f64, lon: f64) -> usize {
    if lat >= HOMOLINE {
        if lon <= LON_M40 {
            0
        } else {
            2
        }
    } else if lat >= 0.0 {
        if lon <= LON_M40 {
            1
        } else {
            3
        }
    } else {
        let southern = lat < -HOMOLINE;
        let base = if lon <= LON_M100 {
            4
        } else if lon <= LON_M20 {
            5
        } else if lon <= LON_80 {
            8
        } else {
            9
        };
        if southern {
            base + 2
        } else {
            base
        }
    }
}

// ============================================================================
// Goode Homolosine
// ============================================================================

#[derive(Debug, Clone)]
pub struct GoodeHomolosine {
    radius: f64,
}

impl GoodeHomolosine {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            radius: common.radius(),
        })
    }

    fn false_easting(&self, region: usize) -> f64 {
        self.radius * GOODE_LOBES[region].center_lon
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let region = goode_region(lat, lon);
        let r = self.radius;
        let mut dlon = adjust_lon(lon - GOODE_LOBES[region].center_lon);

        if is_sinusoidal_region(region) {
            let x = self.false_easting(region) + r * dlon * lat.cos();
            return Ok((x, r * lat));
        }

        let theta = auxiliary_angle(lat, PI * lat.sin(), 50, 251)?;
        if HALF_PI - lat.abs() < EPSLN {
            dlon = 0.0;
        }
        let x = self.false_easting(region) + MOLL_X * r * dlon * theta.cos();
        let y = r * (MOLL_Y * theta.sin() - GOODE_Y_SHIFT * sign(lat));
        Ok((x, y))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let r = self.radius;
        let region = goode_region(y / r, x / r);
        let lobe = GOODE_LOBES[region];
        let x = x - self.false_easting(region);

        let (mut lon, lat) = if is_sinusoidal_region(region) {
            let lat = y / r;
            if lat.abs() > HALF_PI {
                return Err(ProjectionError::domain(252));
            }
            let lon = if (lat.abs() - HALF_PI).abs() > EPSLN {
                adjust_lon(lobe.center_lon + x / (r * lat.cos()))
            } else {
                lobe.center_lon
            };
            (lon, lat)
        } else {
            let arg = (y + GOODE_Y_SHIFT * r * sign(y)) / (MOLL_Y * r);
            if arg.abs() > 1.0 {
                return Err(ProjectionError::domain(IN_BREAK));
            }
            let theta = arg.asin();
            let lon = adjust_lon(lobe.center_lon + x / (MOLL_X * r * theta.cos()));
            if lon < -(PI + EPSLN) {
                return Err(ProjectionError::domain(IN_BREAK));
            }
            let arg = (2.0 * theta + (2.0 * theta).sin()) / PI;
            if arg.abs() > 1.0 {
                return Err(ProjectionError::domain(IN_BREAK));
            }
            (lon, arg.asin())
        };

        // +180 and -180 can swap sides near the antimeridian.
        if (x < 0.0 && PI - lon < EPSLN) || (x > 0.0 && PI + lon < EPSLN) {
            lon = -lon;
        }

        if lon < lobe.west || lon > lobe.east {
            return Err(ProjectionError::InBreak { x: lon, y: lat });
        }
        Ok((lon, lat))
    }
}

// ============================================================================
// Interrupted Mollweide
// ============================================================================

const IMOLL_CENTERS: [f64; 6] = [
    1.0471975512,
    -2.96705972839,
    -0.523598776,
    1.57079632679,
    -2.44346095279,
    -0.34906585,
];

const IMOLL_EASTINGS: [f64; 6] = [
    -2.19988776387,
    -0.15713484,
    2.04275292359,
    -1.72848324304,
    0.31426968,
    2.19988776387,
];

/// Longitude bounds shared by several lobes.
const LON_20: f64 = 0.34906585;
const LON_110: f64 = 1.91986217719;
const LON_140: f64 = 2.44346095279;
const LON_M70: f64 = -1.2217304764;
const ANTIMERIDIAN: f64 = PI + 1.0e-14;

#[derive(Debug, Clone)]
pub struct InterruptedMollweide {
    radius: f64,
}

impl InterruptedMollweide {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        Ok(Self {
            radius: common.radius(),
        })
    }

    fn forward_region(lon: f64, lat: f64) -> usize {
        let wraps = |east_start: f64, west_end: f64| {
            (lon >= east_start && lon <= ANTIMERIDIAN) || (lon >= -ANTIMERIDIAN && lon < west_end)
        };
        if lat >= 0.0 {
            if (LON_20..LON_110).contains(&lon) {
                0
            } else if wraps(1.919862177, LON_M100) {
                1
            } else {
                2
            }
        } else if (LON_20..LON_140).contains(&lon) {
            3
        } else if wraps(LON_140, LON_M70) {
            4
        } else {
            5
        }
    }

    fn inverse_region(&self, x: f64, y: f64) -> usize {
        let r = self.radius;
        if y >= 0.0 {
            if x <= r * -1.41421356248 {
                0
            } else if x <= r * 0.942809042 {
                1
            } else {
                2
            }
        } else if x <= r * -0.942809042 {
            3
        } else if x <= r * 1.41421356248 {
            4
        } else {
            5
        }
    }

    fn in_break(region: usize, lon: f64) -> bool {
        match region {
            0 => !(LON_20..=LON_110).contains(&lon),
            1 => (lon < LON_110 && lon > LON_20) || (lon > LON_M100 && lon < LON_20),
            2 => lon < -1.745329252 || lon > LON_20,
            3 => !(LON_20..=LON_140).contains(&lon),
            4 => (lon < LON_140 && lon > LON_20) || (lon > LON_M70 && lon < LON_20),
            _ => !(LON_M70..=LON_20).contains(&lon),
        }
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let region = Self::forward_region(lon, lat);
        let r = self.radius;
        let mut dlon = adjust_lon(lon - IMOLL_CENTERS[region]);
        let theta = auxiliary_angle(lat, PI * lat.sin(), 50, 2)?;
        if HALF_PI - lat.abs() < EPSLN {
            dlon = 0.0;
        }
        let x = r * IMOLL_EASTINGS[region] + MOLL_X * r * dlon * theta.cos();
        Ok((x, r * MOLL_Y * theta.sin()))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let r = self.radius;
        let region = self.inverse_region(x, y);
        let x = x - r * IMOLL_EASTINGS[region];

        let arg = y / (MOLL_Y * r);
        if arg.abs() > 1.0 {
            return Err(ProjectionError::domain(IN_BREAK));
        }
        let theta = arg.asin();
        let lon = adjust_lon(IMOLL_CENTERS[region] + x / (MOLL_X * r * theta.cos()));
        let lat = ((2.0 * theta + (2.0 * theta).sin()) / PI).clamp(-1.0, 1.0).asin();

        if Self::in_break(region, lon) {
            return Err(ProjectionError::InBreak { x: lon, y: lat });
        }
        Ok((lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ProjCode, D2R};
    use crate::params::ProjectionSpec;

    fn common(code: ProjCode) -> Common {
        Common::load(&ProjectionSpec::new(code)).unwrap()
    }

    #[test]
    fn test_goode_round_trip_in_each_zone() {
        let goode = GoodeHomolosine::new(&common(ProjCode::GoodeHomolosine)).unwrap();
        for (lon, lat) in [(-120.0, 60.0), (10.0, 20.0), (-150.0, -10.0), (100.0, -55.0)] {
            let (x, y) = goode.forward(lon * D2R, lat * D2R).unwrap();
            let (lon2, lat2) = goode.inverse(x, y).unwrap();
            assert!((lon2 / D2R - lon).abs() < 1e-6, "lon {lon}");
            assert!((lat2 / D2R - lat).abs() < 1e-6, "lat {lat}");
        }
    }

    #[test]
    fn test_goode_interruption_is_soft() {
        let goode = GoodeHomolosine::new(&common(ProjCode::GoodeHomolosine)).unwrap();
        let r = goode.radius;
        // Between the -160 and -60 southern lobes, inside the -160 lobe's
        // column but east of its -100 boundary.
        let (_, y) = goode.forward(-160.0 * D2R, -60.0 * D2R).unwrap();
        let err = goode.inverse(-1.8 * r, y).unwrap_err();
        assert!(err.is_soft());
        let (lon, _) = err.usable_point().unwrap();
        assert!(lon > LON_M100);
    }

    #[test]
    fn test_interrupted_mollweide_round_trip() {
        let moll = InterruptedMollweide::new(&common(ProjCode::InterruptedMollweide)).unwrap();
        for (lon, lat) in [(60.0, 30.0), (-170.0, 10.0), (-30.0, 45.0), (90.0, -20.0), (-20.0, -60.0)] {
            let (x, y) = moll.forward(lon * D2R, lat * D2R).unwrap();
            let (lon2, lat2) = moll.inverse(x, y).unwrap();
            assert!((lon2 / D2R - lon).abs() < 1e-6, "lon {lon}");
            assert!((lat2 / D2R - lat).abs() < 1e-6, "lat {lat}");
        }
    }
}
