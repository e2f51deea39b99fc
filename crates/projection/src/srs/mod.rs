//! Spatial reference text formats.
//!
//! Two interchange forms are understood: PROJ-style `+key=value` strings
//! and WKT1 (`GEOGCS[...]` / `PROJCS[...]`). Both parse into a
//! [`ProjectionSpec`] and both can be produced from a [`Projection`].
//! Angles are decimal degrees in text and packed DMS in the parameter
//! array.

mod proj_string;
mod wkt;

use thiserror::Error;

use crate::constants::{Datum, ProjCode, R2D};
use crate::error::ProjectionError;
use crate::params::ProjectionSpec;
use crate::util::{dms_to_rad, pack_dms, sphdz};

pub use proj_string::{parse_proj_string, to_proj_string};
pub use wkt::{parse_wkt, to_wkt};

#[derive(Debug, Error)]
pub enum SrsError {
    #[error("empty spatial reference")]
    Empty,

    #[error("unknown projection: {0}")]
    UnknownProjection(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("malformed WKT: {0}")]
    MalformedWkt(String),

    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),
}

pub type SrsResult<T> = Result<T, SrsError>;

/// Parse either a PROJ string or WKT, deciding by the first character.
pub fn parse_srs(text: &str) -> SrsResult<ProjectionSpec> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SrsError::Empty);
    }
    if text.starts_with('+') {
        parse_proj_string(text)
    } else {
        parse_wkt(text)
    }
}

// ============================================================================
// Shared tables
// ============================================================================

/// How a text value maps into a parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotKind {
    /// Decimal degrees in text, packed DMS in the slot.
    Angle,
    /// Stored as is.
    Plain,
}

/// One named parameter: slot, PROJ key, WKT `PARAMETER` name.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slot {
    pub index: usize,
    pub proj: &'static str,
    pub wkt: &'static str,
    pub kind: SlotKind,
}

const fn slot(index: usize, proj: &'static str, wkt: &'static str, kind: SlotKind) -> Slot {
    Slot {
        index,
        proj,
        wkt,
        kind,
    }
}

use SlotKind::{Angle, Plain};

const LON_0: Slot = slot(4, "lon_0", "central_meridian", Angle);
const LAT_0: Slot = slot(5, "lat_0", "latitude_of_origin", Angle);
const LAT_TS: Slot = slot(5, "lat_ts", "standard_parallel_1", Angle);
const LAT_1: Slot = slot(2, "lat_1", "standard_parallel_1", Angle);
const LAT_2: Slot = slot(3, "lat_2", "standard_parallel_2", Angle);
const X_0: Slot = slot(6, "x_0", "false_easting", Plain);
const Y_0: Slot = slot(7, "y_0", "false_northing", Plain);
const K_0: Slot = slot(2, "k", "scale_factor", Plain);

const CONIC: &[Slot] = &[LAT_1, LAT_2, LON_0, LAT_0, X_0, Y_0];
const CENTERED: &[Slot] = &[LON_0, LAT_0, X_0, Y_0];
const WORLD: &[Slot] = &[LON_0, X_0, Y_0];
const TRUE_SCALE: &[Slot] = &[LON_0, LAT_TS, X_0, Y_0];
const PERSPECTIVE: &[Slot] = &[slot(2, "h", "height", Plain), LON_0, LAT_0, X_0, Y_0];
const OBLIQUE: &[Slot] = &[
    K_0,
    slot(3, "alpha", "azimuth", Angle),
    slot(4, "lonc", "longitude_of_center", Angle),
    slot(5, "lat_0", "latitude_of_center", Angle),
    slot(8, "lon_1", "longitude_of_point_1", Angle),
    slot(9, "lat_1", "latitude_of_point_1", Angle),
    slot(10, "lon_2", "longitude_of_point_2", Angle),
    slot(11, "lat_2", "latitude_of_point_2", Angle),
    X_0,
    Y_0,
];
const LANDSAT: &[Slot] = &[
    slot(2, "lsat", "landsat_number", Plain),
    slot(3, "path", "path_number", Plain),
    X_0,
    Y_0,
];
const OBLATED: &[Slot] = &[
    slot(2, "m", "shape_m", Plain),
    slot(3, "n", "shape_n", Plain),
    LON_0,
    slot(5, "lat_0", "latitude_of_center", Angle),
    slot(8, "theta", "angle", Angle),
    X_0,
    Y_0,
];
const TRANSVERSE: &[Slot] = &[K_0, LON_0, LAT_0, X_0, Y_0];

/// Parameters each projection reads, in output order.
pub(crate) fn slots(code: ProjCode) -> &'static [Slot] {
    match code {
        ProjCode::Geographic | ProjCode::Utm | ProjCode::StatePlane => &[],
        ProjCode::GoodeHomolosine | ProjCode::InterruptedMollweide => &[],
        ProjCode::Albers | ProjCode::LambertConformalConic | ProjCode::EquidistantConic => CONIC,
        ProjCode::Mercator | ProjCode::PolarStereographic | ProjCode::Equirectangular => {
            TRUE_SCALE
        }
        ProjCode::TransverseMercator => TRANSVERSE,
        ProjCode::Polyconic
        | ProjCode::Stereographic
        | ProjCode::LambertAzimuthal
        | ProjCode::AzimuthalEquidistant
        | ProjCode::Gnomonic
        | ProjCode::Orthographic => CENTERED,
        ProjCode::GeneralVerticalNearSide => PERSPECTIVE,
        ProjCode::Sinusoidal
        | ProjCode::Miller
        | ProjCode::VanDerGrinten
        | ProjCode::Robinson
        | ProjCode::Mollweide
        | ProjCode::Hammer
        | ProjCode::WagnerIV
        | ProjCode::WagnerVII => WORLD,
        ProjCode::HotineObliqueMercator => OBLIQUE,
        ProjCode::SpaceObliqueMercator => LANDSAT,
        ProjCode::AlaskaConformal => &[X_0, Y_0],
        ProjCode::OblatedEqualArea => OBLATED,
    }
}

/// Projection names: `(code, PROJ name, WKT PROJECTION name)`.
const NAMES: &[(ProjCode, &str, &str)] = &[
    (ProjCode::Utm, "utm", "Transverse_Mercator"),
    (ProjCode::Albers, "aea", "Albers_Conic_Equal_Area"),
    (ProjCode::LambertConformalConic, "lcc", "Lambert_Conformal_Conic_2SP"),
    (ProjCode::Mercator, "merc", "Mercator_1SP"),
    (ProjCode::PolarStereographic, "stere", "Polar_Stereographic"),
    (ProjCode::Polyconic, "poly", "Polyconic"),
    (ProjCode::EquidistantConic, "eqdc", "Equidistant_Conic"),
    (ProjCode::TransverseMercator, "tmerc", "Transverse_Mercator"),
    (ProjCode::Stereographic, "stere", "Stereographic"),
    (ProjCode::LambertAzimuthal, "laea", "Lambert_Azimuthal_Equal_Area"),
    (ProjCode::AzimuthalEquidistant, "aeqd", "Azimuthal_Equidistant"),
    (ProjCode::Gnomonic, "gnom", "Gnomonic"),
    (ProjCode::Orthographic, "ortho", "Orthographic"),
    (ProjCode::GeneralVerticalNearSide, "nsper", "Vertical_Near_Side_Perspective"),
    (ProjCode::Sinusoidal, "sinu", "Sinusoidal"),
    (ProjCode::Equirectangular, "eqc", "Equirectangular"),
    (ProjCode::Miller, "mill", "Miller_Cylindrical"),
    (ProjCode::VanDerGrinten, "vandg", "VanDerGrinten"),
    (ProjCode::HotineObliqueMercator, "omerc", "Hotine_Oblique_Mercator"),
    (ProjCode::Robinson, "robin", "Robinson"),
    (ProjCode::SpaceObliqueMercator, "lsat", "Space_Oblique_Mercator"),
    (ProjCode::AlaskaConformal, "alsk", "Alaska_Conformal"),
    (ProjCode::GoodeHomolosine, "igh", "Goode_Homolosine"),
    (ProjCode::Mollweide, "moll", "Mollweide"),
    (ProjCode::InterruptedMollweide, "imoll", "Interrupted_Mollweide"),
    (ProjCode::Hammer, "hammer", "Hammer_Aitoff"),
    (ProjCode::WagnerIV, "wag4", "Wagner_IV"),
    (ProjCode::WagnerVII, "wag7", "Wagner_VII"),
    (ProjCode::OblatedEqualArea, "oea", "Oblated_Equal_Area"),
];

pub(crate) fn proj_name(code: ProjCode) -> Option<&'static str> {
    if code == ProjCode::Geographic {
        return Some("longlat");
    }
    NAMES.iter().find(|(c, _, _)| *c == code).map(|(_, p, _)| *p)
}

pub(crate) fn wkt_name(code: ProjCode) -> Option<&'static str> {
    NAMES.iter().find(|(c, _, _)| *c == code).map(|(_, _, w)| *w)
}

pub(crate) fn code_from_wkt_name(name: &str) -> Option<ProjCode> {
    let wanted = normalize(name);
    NAMES
        .iter()
        .filter(|(code, _, _)| *code != ProjCode::Utm)
        .find(|(_, _, w)| normalize(w) == wanted)
        .map(|(code, _, _)| *code)
        .or_else(|| match wanted.as_str() {
            "lambertconformalconic" | "lambertconformalconic1sp" => {
                Some(ProjCode::LambertConformalConic)
            }
            "mercator" | "mercator2sp" => Some(ProjCode::Mercator),
            "albers" => Some(ProjCode::Albers),
            "equidistantcylindrical" | "platecarree" => Some(ProjCode::Equirectangular),
            "obliquemercator" => Some(ProjCode::HotineObliqueMercator),
            "polarstereographicvarianta" | "polarstereographicvariantb" => {
                Some(ProjCode::PolarStereographic)
            }
            _ => None,
        })
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Text value of a slot.
pub(crate) fn slot_value(spec: &ProjectionSpec, slot: &Slot) -> f64 {
    let raw = spec.params[slot.index];
    match slot.kind {
        Angle => dms_to_rad(raw).map(|rad| round_degrees(rad * R2D)).unwrap_or(0.0),
        Plain => raw,
    }
}

/// Store a text value into its slot.
pub(crate) fn set_slot(spec: &mut ProjectionSpec, slot: &Slot, value: f64) {
    spec.params[slot.index] = match slot.kind {
        Angle => pack_dms(value),
        Plain => value,
    };
}

/// Packed DMS keeps seconds to about 1e-9 degrees; trim the noise.
fn round_degrees(degrees: f64) -> f64 {
    (degrees * 1.0e9).round() / 1.0e9
}

/// Semi-major axis and inverse flattening of a projection's spheroid. A sphere
/// has inverse flattening zero.
pub(crate) fn axes_and_inverse_flattening(spec: &ProjectionSpec) -> (f64, f64) {
    let spheroid = sphdz(spec.datum, &spec.params);
    let (a, b) = (spheroid.r_major, spheroid.r_minor);
    if (a - b).abs() < 1.0e-9 {
        (a, 0.0)
    } else {
        (a, a / (a - b))
    }
}

/// Set an explicit spheroid from semi-major axis and semi-minor axis.
pub(crate) fn set_axes(spec: &mut ProjectionSpec, a: f64, b: f64) {
    match known_datum(a, b) {
        Some(datum) => spec.datum = datum,
        None => {
            spec.datum = Datum::NotSet;
            spec.params[0] = a;
            spec.params[1] = if (a - b).abs() < 1.0e-9 { 0.0 } else { b };
        }
    }
}

/// Datum whose axes are closest to `a`/`b`, within a millimeter.
fn known_datum(a: f64, b: f64) -> Option<Datum> {
    Datum::ALL
        .iter()
        .filter_map(|datum| {
            let (major, minor) = datum.axes()?;
            let error = (major - a).abs() + (minor - b).abs();
            (error < 1.0e-3).then_some((*datum, error))
        })
        .min_by(|x, y| x.1.total_cmp(&y.1))
        .map(|(datum, _)| datum)
}
