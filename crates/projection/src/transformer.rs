//! Point conversion between two projections through geographic space.

use std::sync::Arc;

use raster_common::{Coordinate, Unit};

use crate::constants::{Datum, ProjCode, COEFCT};
use crate::error::{ProjResult, ProjectionError};
use crate::params::ProjectionSpec;
use crate::projection::Projection;

/// Converts coordinates from an input projection to an output projection.
///
/// Projections are shared, so one transformer per worker thread can point
/// at the same pair of instances.
#[derive(Debug, Clone)]
pub struct Transformer {
    input: Arc<Projection>,
    output: Arc<Projection>,
}

impl Transformer {
    pub fn new(input: Arc<Projection>, output: Arc<Projection>) -> Self {
        Self { input, output }
    }

    /// Default-parameterized projection for `code`.
    pub fn convert_projection(code: ProjCode) -> Option<Projection> {
        Projection::from_code(code)
    }

    pub fn input(&self) -> &Arc<Projection> {
        &self.input
    }

    pub fn output(&self) -> &Arc<Projection> {
        &self.output
    }

    pub fn set_input(&mut self, code: ProjCode) -> ProjResult<()> {
        self.input = Arc::new(build_default(code)?);
        Ok(())
    }

    pub fn set_input_with(
        &mut self,
        code: ProjCode,
        params: [f64; COEFCT],
        unit: Unit,
        datum: Datum,
    ) -> ProjResult<()> {
        self.input = Arc::new(build_with(code, params, unit, datum)?);
        Ok(())
    }

    pub fn set_input_projection(&mut self, projection: Arc<Projection>) {
        self.input = projection;
    }

    pub fn set_output(&mut self, code: ProjCode) -> ProjResult<()> {
        self.output = Arc::new(build_default(code)?);
        Ok(())
    }

    pub fn set_output_with(
        &mut self,
        code: ProjCode,
        params: [f64; COEFCT],
        unit: Unit,
        datum: Datum,
    ) -> ProjResult<()> {
        self.output = Arc::new(build_with(code, params, unit, datum)?);
        Ok(())
    }

    pub fn set_output_projection(&mut self, projection: Arc<Projection>) {
        self.output = projection;
    }

    /// Input projection coordinates to output projection coordinates.
    ///
    /// A point in a break region still updates `coord` and the soft error
    /// is returned afterwards; hard errors leave `coord` untouched.
    pub fn transform(&self, coord: &mut Coordinate) -> ProjResult<()> {
        let mut soft = None;
        let (lon, lat) = soften(self.input.inverse(coord.x, coord.y), &mut soft)?;
        let (x, y) = soften(self.output.forward(lon, lat), &mut soft)?;
        *coord = Coordinate::new(x, y, self.output.unit());
        soft.map_or(Ok(()), Err)
    }

    /// Input projection coordinates to longitude/latitude in degrees.
    pub fn transform_inverse(&self, coord: &mut Coordinate) -> ProjResult<()> {
        let mut soft = None;
        let (lon, lat) = soften(self.input.inverse(coord.x, coord.y), &mut soft)?;
        *coord = Coordinate::new(lon, lat, Unit::Degree);
        soft.map_or(Ok(()), Err)
    }

    /// Longitude/latitude in degrees to output projection coordinates.
    pub fn transform_forward(&self, coord: &mut Coordinate) -> ProjResult<()> {
        let mut soft = None;
        let (x, y) = soften(self.output.forward(coord.x, coord.y), &mut soft)?;
        *coord = Coordinate::new(x, y, self.output.unit());
        soft.map_or(Ok(()), Err)
    }
}

/// Unwrap a result, turning a soft error into its point and remembering
/// the error.
fn soften(
    result: ProjResult<(f64, f64)>,
    soft: &mut Option<ProjectionError>,
) -> ProjResult<(f64, f64)> {
    match result {
        Ok(point) => Ok(point),
        Err(err) => match err.usable_point() {
            Some(point) => {
                *soft = Some(err);
                Ok(point)
            }
            None => Err(err),
        },
    }
}

fn build_default(code: ProjCode) -> ProjResult<Projection> {
    Projection::new(ProjectionSpec::new(code))
}

fn build_with(
    code: ProjCode,
    params: [f64; COEFCT],
    unit: Unit,
    datum: Datum,
) -> ProjResult<Projection> {
    Projection::new(
        ProjectionSpec::new(code)
            .with_params(params)
            .with_unit(unit)
            .with_datum(datum),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geographic() -> Arc<Projection> {
        Arc::new(Projection::from_code(ProjCode::Geographic).unwrap())
    }

    #[test]
    fn test_geographic_to_sinusoidal_and_back() {
        let sinusoidal = Arc::new(Projection::from_code(ProjCode::Sinusoidal).unwrap());
        let there = Transformer::new(geographic(), sinusoidal.clone());
        let back = Transformer::new(sinusoidal, geographic());

        let mut coord = Coordinate::new(-75.0, 40.0, Unit::Degree);
        there.transform(&mut coord).unwrap();
        assert_eq!(coord.unit, Unit::Meter);
        back.transform(&mut coord).unwrap();
        assert_eq!(coord.unit, Unit::Degree);
        assert!((coord.x + 75.0).abs() < 1e-9);
        assert!((coord.y - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_hard_error_leaves_coordinate() {
        let mercator = Arc::new(Projection::from_code(ProjCode::Mercator).unwrap());
        let transformer = Transformer::new(geographic(), mercator);
        let mut coord = Coordinate::new(0.0, 90.0, Unit::Degree);
        let err = transformer.transform(&mut coord).unwrap_err();
        assert!(!err.is_soft());
        assert_eq!(coord, Coordinate::new(0.0, 90.0, Unit::Degree));
    }

    #[test]
    fn test_state_plane_cannot_be_selected() {
        let mut transformer = Transformer::new(geographic(), geographic());
        assert!(transformer.set_output(ProjCode::StatePlane).is_err());
        assert!(Transformer::convert_projection(ProjCode::StatePlane).is_none());
    }

    #[test]
    fn test_set_input_with_explicit_parameters() {
        let mut transformer = Transformer::new(geographic(), geographic());
        let mut params = [0.0; COEFCT];
        params[4] = -96_000_000.0;
        transformer
            .set_input_with(ProjCode::Sinusoidal, params, Unit::Meter, Datum::Wgs84)
            .unwrap();
        let mut coord = Coordinate::new(0.0, 0.0, Unit::Meter);
        transformer.transform(&mut coord).unwrap();
        assert!((coord.x + 96.0).abs() < 1e-9);
    }
}
