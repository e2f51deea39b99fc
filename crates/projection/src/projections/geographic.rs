//! Geographic longitude/latitude. Internal coordinates are radians, so
//! both directions are the identity.

use crate::error::ProjResult;
use crate::params::Common;

#[derive(Debug, Clone, Default)]
pub struct Geographic;

impl Geographic {
    pub(crate) fn new(_common: &Common) -> ProjResult<Self> {
        Ok(Self)
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        Ok((lon, lat))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        Ok((x, y))
    }
}
