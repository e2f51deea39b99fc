//! Per-projection math. Every type here works in radians on the
//! geographic side and in meters on the projected side (radians for
//! [`Geographic`]); unit conversion happens in [`crate::Projection`].

mod alaska_conformal;
mod albers;
mod azimuthal;
mod equidistant_conic;
mod geographic;
mod goode;
mod hotine_oblique_mercator;
mod lambert_conformal;
mod mercator;
mod oblated_equal_area;
mod polar_stereographic;
mod polyconic;
pub(crate) mod pseudocylindrical;
mod robinson;
mod space_oblique_mercator;
mod transverse_mercator;
mod van_der_grinten;

pub use alaska_conformal::AlaskaConformal;
pub use albers::Albers;
pub use azimuthal::{
    AzimuthalEquidistant, GeneralVerticalNearSide, Gnomonic, LambertAzimuthal, Orthographic,
    Stereographic,
};
pub use equidistant_conic::EquidistantConic;
pub use geographic::Geographic;
pub use goode::{GoodeHomolosine, InterruptedMollweide};
pub use hotine_oblique_mercator::HotineObliqueMercator;
pub use lambert_conformal::LambertConformalConic;
pub use mercator::Mercator;
pub use oblated_equal_area::OblatedEqualArea;
pub use polar_stereographic::PolarStereographic;
pub use polyconic::Polyconic;
pub use pseudocylindrical::{
    Equirectangular, Hammer, Miller, Mollweide, Sinusoidal, WagnerIV, WagnerVII,
};
pub use robinson::Robinson;
pub use space_oblique_mercator::SpaceObliqueMercator;
pub use transverse_mercator::TransverseMercator;
pub use van_der_grinten::VanDerGrinten;
