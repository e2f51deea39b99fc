//! Oblated Equal Area on the sphere.
//!
//! Slots 2 and 3 are the oval shape parameters `m` and `n`, slot 8 the
//! rotation angle (packed DMS). Slots 4 and 5 give the center.

use crate::error::{ProjResult, ProjectionError};
use crate::params::Common;
use crate::util::adjust_lon;

#[derive(Debug, Clone)]
pub struct OblatedEqualArea {
    radius: f64,
    center_lon: f64,
    false_easting: f64,
    false_northing: f64,
    m: f64,
    n: f64,
    theta: f64,
    sin_lat_o: f64,
    cos_lat_o: f64,
}

impl OblatedEqualArea {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        let (m, n) = (common.raw[2], common.raw[3]);
        if m == 0.0 || n == 0.0 {
            return Err(ProjectionError::invalid(301));
        }
        let (sin_lat_o, cos_lat_o) = common.center_lat.sin_cos();
        Ok(Self {
            radius: common.radius(),
            center_lon: common.center_lon,
            false_easting: common.false_easting,
            false_northing: common.false_northing,
            m,
            n,
            theta: common.angle(8)?,
            sin_lat_o,
            cos_lat_o,
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let (m, n, r) = (self.m, self.n, self.radius);
        let dlon = lon - self.center_lon;
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_dlon, cos_dlon) = dlon.sin_cos();

        let z = (self.sin_lat_o * sin_lat + self.cos_lat_o * cos_lat * cos_dlon)
            .clamp(-1.0, 1.0)
            .acos();
        let az = (cos_lat * sin_dlon)
            .atan2(self.cos_lat_o * sin_lat - self.sin_lat_o * cos_lat * cos_dlon)
            + self.theta;
        let (sin_az, cos_az) = az.sin_cos();
        let temp = 2.0 * (z / 2.0).sin();
        let x_prime = temp * sin_az;
        let y_prime = temp * cos_az;

        let big_m = (x_prime / 2.0).asin();
        let big_n = (y_prime / 2.0 * big_m.cos() / (2.0 * big_m / m).cos()).asin();

        let x = m * r * (2.0 * big_m / m).sin() * big_n.cos() / (2.0 * big_n / n).cos();
        let y = n * r * (2.0 * big_n / n).sin();
        Ok((x + self.false_easting, y + self.false_northing))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let (m, n, r) = (self.m, self.n, self.radius);
        let x = x - self.false_easting;
        let y = y - self.false_northing;

        let big_n = (n / 2.0) * (y / (n * r)).asin();
        let temp = x / (m * r) * (2.0 * big_n / n).cos() / big_n.cos();
        let big_m = (m / 2.0) * temp.asin();
        let x_prime = 2.0 * big_m.sin();
        let y_prime = 2.0 * big_n.sin() * (2.0 * big_m / m).cos() / big_m.cos();

        let z = 2.0 * ((x_prime * x_prime + y_prime * y_prime).sqrt() / 2.0).asin();
        let az = x_prime.atan2(y_prime);
        let (sin_diff, cos_diff) = (az - self.theta).sin_cos();
        let (sin_z, cos_z) = z.sin_cos();

        let lat = (self.sin_lat_o * cos_z + self.cos_lat_o * sin_z * cos_diff).asin();
        let lon = adjust_lon(
            self.center_lon
                + (sin_z * sin_diff).atan2(self.cos_lat_o * cos_z - self.sin_lat_o * sin_z * cos_diff),
        );
        if lat.is_nan() || lon.is_nan() {
            return Err(ProjectionError::domain(302));
        }
        Ok((lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ProjCode, D2R};
    use crate::params::ProjectionSpec;

    #[test]
    fn test_round_trip_with_false_origin() {
        let spec = ProjectionSpec::new(ProjCode::OblatedEqualArea)
            .with_param(2, 2.0)
            .with_param(3, 1.0)
            .with_param(5, 30_000_000.0)
            .with_param(6, 1000.0)
            .with_param(7, -2000.0);
        let proj = OblatedEqualArea::new(&Common::load(&spec).unwrap()).unwrap();

        let (x, y) = proj.forward(0.0, 30.0 * D2R).unwrap();
        assert!((x - 1000.0).abs() < 1e-6);
        assert!((y + 2000.0).abs() < 1e-6);

        let (x, y) = proj.forward(10.0 * D2R, 35.0 * D2R).unwrap();
        let (lon, lat) = proj.inverse(x, y).unwrap();
        assert!((lon / D2R - 10.0).abs() < 1e-7);
        assert!((lat / D2R - 35.0).abs() < 1e-7);
    }

    #[test]
    fn test_zero_shape_rejected() {
        let spec = ProjectionSpec::new(ProjCode::OblatedEqualArea).with_param(2, 0.0);
        assert!(OblatedEqualArea::new(&Common::load(&spec).unwrap()).is_err());
    }
}
