//! The closed set of supported projections behind one value type.
//!
//! A [`Projection`] is built once from a [`ProjectionSpec`]; all derived
//! constants are computed at construction, so forward and inverse calls
//! take `&self` and can be shared across threads.

use std::fmt;

use raster_common::Unit;

use crate::constants::{Datum, ProjCode, COEFCT, D2R, R2D};
use crate::error::{ProjResult, ProjectionError};
use crate::params::{Common, ProjectionSpec};
use crate::projections::*;
use crate::util::untfz;

#[derive(Debug, Clone)]
pub(crate) enum ProjectionKind {
    Geographic(Geographic),
    Utm(TransverseMercator),
    Albers(Albers),
    LambertConformalConic(LambertConformalConic),
    Mercator(Mercator),
    PolarStereographic(PolarStereographic),
    Polyconic(Polyconic),
    EquidistantConic(EquidistantConic),
    TransverseMercator(TransverseMercator),
    Stereographic(Stereographic),
    LambertAzimuthal(LambertAzimuthal),
    AzimuthalEquidistant(AzimuthalEquidistant),
    Gnomonic(Gnomonic),
    Orthographic(Orthographic),
    GeneralVerticalNearSide(GeneralVerticalNearSide),
    Sinusoidal(Sinusoidal),
    Equirectangular(Equirectangular),
    Miller(Miller),
    VanDerGrinten(VanDerGrinten),
    HotineObliqueMercator(HotineObliqueMercator),
    Robinson(Robinson),
    SpaceObliqueMercator(SpaceObliqueMercator),
    AlaskaConformal(AlaskaConformal),
    GoodeHomolosine(GoodeHomolosine),
    Mollweide(Mollweide),
    InterruptedMollweide(InterruptedMollweide),
    Hammer(Hammer),
    WagnerIV(WagnerIV),
    WagnerVII(WagnerVII),
    OblatedEqualArea(OblatedEqualArea),
}

macro_rules! dispatch {
    ($kind:expr, $p:ident => $body:expr) => {
        match $kind {
            ProjectionKind::Geographic($p) => $body,
            ProjectionKind::Utm($p) => $body,
            ProjectionKind::Albers($p) => $body,
            ProjectionKind::LambertConformalConic($p) => $body,
            ProjectionKind::Mercator($p) => $body,
            ProjectionKind::PolarStereographic($p) => $body,
            ProjectionKind::Polyconic($p) => $body,
            ProjectionKind::EquidistantConic($p) => $body,
            ProjectionKind::TransverseMercator($p) => $body,
            ProjectionKind::Stereographic($p) => $body,
            ProjectionKind::LambertAzimuthal($p) => $body,
            ProjectionKind::AzimuthalEquidistant($p) => $body,
            ProjectionKind::Gnomonic($p) => $body,
            ProjectionKind::Orthographic($p) => $body,
            ProjectionKind::GeneralVerticalNearSide($p) => $body,
            ProjectionKind::Sinusoidal($p) => $body,
            ProjectionKind::Equirectangular($p) => $body,
            ProjectionKind::Miller($p) => $body,
            ProjectionKind::VanDerGrinten($p) => $body,
            ProjectionKind::HotineObliqueMercator($p) => $body,
            ProjectionKind::Robinson($p) => $body,
            ProjectionKind::SpaceObliqueMercator($p) => $body,
            ProjectionKind::AlaskaConformal($p) => $body,
            ProjectionKind::GoodeHomolosine($p) => $body,
            ProjectionKind::Mollweide($p) => $body,
            ProjectionKind::InterruptedMollweide($p) => $body,
            ProjectionKind::Hammer($p) => $body,
            ProjectionKind::WagnerIV($p) => $body,
            ProjectionKind::WagnerVII($p) => $body,
            ProjectionKind::OblatedEqualArea($p) => $body,
        }
    };
}

impl ProjectionKind {
    fn build(code: ProjCode, common: &Common) -> ProjResult<Self> {
        use ProjectionKind as K;
        Ok(match code {
            ProjCode::Geographic => K::Geographic(Geographic::new(common)?),
            ProjCode::Utm => K::Utm(TransverseMercator::utm(common)?),
            ProjCode::StatePlane => return Err(ProjectionError::Unsupported(code.code())),
            ProjCode::Albers => K::Albers(Albers::new(common)?),
            ProjCode::LambertConformalConic => {
                K::LambertConformalConic(LambertConformalConic::new(common)?)
            }
            ProjCode::Mercator => K::Mercator(Mercator::new(common)?),
            ProjCode::PolarStereographic => K::PolarStereographic(PolarStereographic::new(common)?),
            ProjCode::Polyconic => K::Polyconic(Polyconic::new(common)?),
            ProjCode::EquidistantConic => K::EquidistantConic(EquidistantConic::new(common)?),
            ProjCode::TransverseMercator => {
                K::TransverseMercator(TransverseMercator::new(common)?)
            }
            ProjCode::Stereographic => K::Stereographic(Stereographic::new(common)?),
            ProjCode::LambertAzimuthal => K::LambertAzimuthal(LambertAzimuthal::new(common)?),
            ProjCode::AzimuthalEquidistant => {
                K::AzimuthalEquidistant(AzimuthalEquidistant::new(common)?)
            }
            ProjCode::Gnomonic => K::Gnomonic(Gnomonic::new(common)?),
            ProjCode::Orthographic => K::Orthographic(Orthographic::new(common)?),
            ProjCode::GeneralVerticalNearSide => {
                K::GeneralVerticalNearSide(GeneralVerticalNearSide::new(common)?)
            }
            ProjCode::Sinusoidal => K::Sinusoidal(Sinusoidal::new(common)?),
            ProjCode::Equirectangular => K::Equirectangular(Equirectangular::new(common)?),
            ProjCode::Miller => K::Miller(Miller::new(common)?),
            ProjCode::VanDerGrinten => K::VanDerGrinten(VanDerGrinten::new(common)?),
            ProjCode::HotineObliqueMercator => {
                K::HotineObliqueMercator(HotineObliqueMercator::new(common)?)
            }
            ProjCode::Robinson => K::Robinson(Robinson::new(common)?),
            ProjCode::SpaceObliqueMercator => {
                K::SpaceObliqueMercator(SpaceObliqueMercator::new(common)?)
            }
            ProjCode::AlaskaConformal => K::AlaskaConformal(AlaskaConformal::new(common)?),
            ProjCode::GoodeHomolosine => K::GoodeHomolosine(GoodeHomolosine::new(common)?),
            ProjCode::Mollweide => K::Mollweide(Mollweide::new(common)?),
            ProjCode::InterruptedMollweide => {
                K::InterruptedMollweide(InterruptedMollweide::new(common)?)
            }
            ProjCode::Hammer => K::Hammer(Hammer::new(common)?),
            ProjCode::WagnerIV => K::WagnerIV(WagnerIV::new(common)?),
            ProjCode::WagnerVII => K::WagnerVII(WagnerVII::new(common)?),
            ProjCode::OblatedEqualArea => K::OblatedEqualArea(OblatedEqualArea::new(common)?),
        })
    }

    fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        dispatch!(self, p => p.forward(lon, lat))
    }

    fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        dispatch!(self, p => p.inverse(x, y))
    }
}

/// A fully initialized map projection.
///
/// `forward` takes longitude/latitude in decimal degrees and returns
/// coordinates in the projection's unit; `inverse` goes the other way.
#[derive(Debug, Clone)]
pub struct Projection {
    spec: ProjectionSpec,
    kind: ProjectionKind,
    /// Internal projected unit to output unit.
    to_output: f64,
    /// Output unit to internal projected unit.
    from_output: f64,
}

impl Projection {
    pub fn new(spec: ProjectionSpec) -> ProjResult<Self> {
        let common = Common::load(&spec)?;
        let kind = ProjectionKind::build(spec.code, &common)?;
        let internal = if spec.code == ProjCode::Geographic {
            Unit::Radian
        } else {
            Unit::Meter
        };
        let to_output = untfz(internal, spec.unit)?;
        let from_output = untfz(spec.unit, internal)?;
        tracing::trace!(code = ?spec.code, unit = %spec.unit, datum = ?spec.datum, "Projection initialized");
        Ok(Self {
            spec,
            kind,
            to_output,
            from_output,
        })
    }

    /// Default-parameterized projection for `code`, or `None` when the
    /// code is unsupported or cannot be built without parameters.
    pub fn from_code(code: ProjCode) -> Option<Self> {
        Self::new(ProjectionSpec::new(code)).ok()
    }

    /// Project longitude/latitude in degrees.
    pub fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let scale = self.to_output;
        self.kind
            .forward(lon * D2R, lat * D2R)
            .map(|(x, y)| (x * scale, y * scale))
            .map_err(|err| err.map_point(|x, y| (x * scale, y * scale)))
    }

    /// Unproject to longitude/latitude in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let scale = self.from_output;
        self.kind
            .inverse(x * scale, y * scale)
            .map(|(lon, lat)| (lon * R2D, lat * R2D))
            .map_err(|err| err.map_point(|lon, lat| (lon * R2D, lat * R2D)))
    }

    pub fn code(&self) -> ProjCode {
        self.spec.code
    }

    pub fn name(&self) -> &'static str {
        self.spec.code.name()
    }

    pub fn params(&self) -> &[f64; COEFCT] {
        &self.spec.params
    }

    pub fn unit(&self) -> Unit {
        self.spec.unit
    }

    pub fn datum(&self) -> Datum {
        self.spec.datum
    }

    pub fn spec(&self) -> &ProjectionSpec {
        &self.spec
    }

    pub fn is_geographic(&self) -> bool {
        self.spec.code == ProjCode::Geographic
    }

    /// Zone actually used by a UTM projection.
    pub fn utm_zone(&self) -> Option<i32> {
        match &self.kind {
            ProjectionKind::Utm(tm) => tm.zone(),
            _ => None,
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.spec.unit)
    }
}
