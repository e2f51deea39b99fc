//! Numeric constants, projection codes, datums and lookup tables.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const PI: f64 = std::f64::consts::PI;
pub const HALF_PI: f64 = PI * 0.5;
pub const TWO_PI: f64 = PI * 2.0;
pub const EPSLN: f64 = 1.0e-10;
pub const R2D: f64 = 57.2957795131;
pub const D2R: f64 = 1.745329251994328e-2;
pub const S2R: f64 = 4.848136811095359e-6;

/// Iteration cap for `adjust_lon`.
pub const MAX_VAL: i64 = 4;
pub const MAXLONG: f64 = 2147483647.0;
pub const DBLLONG: f64 = 4.61168601e18;

/// Index of the reference sphere in the axis tables.
pub const RADVAL: usize = 19;

/// Number of parameters in a projection parameter array.
pub const COEFCT: usize = 15;

/// Number of supported spheroids.
pub const SPHDCT: usize = 31;

pub const LANDSAT_RATIO: f64 = 0.5201613;

/// Semi-major axes of the supported spheroids, indexed by datum code.
pub const MAJOR_AXES: [f64; SPHDCT] = [
    6378206.4,
    6378249.145,
    6377397.155,
    6378157.5,
    6378388.0,
    6378135.0,
    6377276.3452,
    6378145.0,
    6378137.0,
    6377563.396,
    6377304.063,
    6377340.189,
    6378137.0,
    6378155.0,
    6378160.0,
    6378245.0,
    6378270.0,
    6378166.0,
    6378150.0,
    6370997.0,
    6377483.865,
    6377298.556,
    6377301.243,
    6377295.664,
    6377304.063,
    6377309.613,
    6378388.0,
    6378200.0,
    6378160.0,
    6378160.0,
    6378165.0,
];

/// Semi-minor axes of the supported spheroids, indexed by datum code.
pub const MINOR_AXES: [f64; SPHDCT] = [
    6356583.8,
    6356514.86955,
    6356078.96284,
    6356772.2,
    6356911.94613,
    6356750.519915,
    6356075.4133,
    6356759.769356,
    6356752.31414,
    6356256.91,
    6356103.039,
    6356034.448,
    6356752.314245,
    6356773.3205,
    6356774.719,
    6356863.0188,
    6356794.343479,
    6356784.283666,
    6356768.337303,
    6370997.0,
    6356165.382966,
    6356097.5503,
    6356100.228368,
    6356094.667915,
    6356103.038993,
    6356108.570542,
    6356911.946128,
    6356818.169,
    6356774.504086,
    6356774.719195,
    6356783.286959,
];

/// Unit conversion factors `UNIT_FACTORS[from][to]`, indexed by unit code
/// (radian, US feet, meter, arc second, degree, international feet). Zero
/// marks an angular/linear mismatch.
pub const UNIT_FACTORS: [[f64; 6]; 6] = [
    [1.0, 0.0, 0.0, 206264.8062470963, 57.29577951308231, 0.0],
    [0.0, 1.0, 0.3048006096012192, 0.0, 0.0, 1.000002000004],
    [0.0, 3.280833333333333, 1.0, 0.0, 0.0, 3.280839895013124],
    [0.4848136811095360e-5, 0.0, 0.0, 1.0, 0.2777777777777778e-3, 0.0],
    [0.1745329251994330e-1, 0.0, 0.0, 3600.0, 1.0, 0.0],
    [0.0, 0.9999980000000, 0.3048, 0.0, 0.0, 1.0],
];

// ============================================================================
// Projection codes
// ============================================================================

/// GCTP projection codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjCode {
    Geographic = 0,
    Utm = 1,
    StatePlane = 2,
    Albers = 3,
    LambertConformalConic = 4,
    Mercator = 5,
    PolarStereographic = 6,
    Polyconic = 7,
    EquidistantConic = 8,
    TransverseMercator = 9,
    Stereographic = 10,
    LambertAzimuthal = 11,
    AzimuthalEquidistant = 12,
    Gnomonic = 13,
    Orthographic = 14,
    GeneralVerticalNearSide = 15,
    Sinusoidal = 16,
    Equirectangular = 17,
    Miller = 18,
    VanDerGrinten = 19,
    HotineObliqueMercator = 20,
    Robinson = 21,
    SpaceObliqueMercator = 22,
    AlaskaConformal = 23,
    GoodeHomolosine = 24,
    Mollweide = 25,
    InterruptedMollweide = 26,
    Hammer = 27,
    WagnerIV = 28,
    WagnerVII = 29,
    OblatedEqualArea = 30,
}

impl ProjCode {
    pub const ALL: [ProjCode; 31] = [
        ProjCode::Geographic,
        ProjCode::Utm,
        ProjCode::StatePlane,
        ProjCode::Albers,
        ProjCode::LambertConformalConic,
        ProjCode::Mercator,
        ProjCode::PolarStereographic,
        ProjCode::Polyconic,
        ProjCode::EquidistantConic,
        ProjCode::TransverseMercator,
        ProjCode::Stereographic,
        ProjCode::LambertAzimuthal,
        ProjCode::AzimuthalEquidistant,
        ProjCode::Gnomonic,
        ProjCode::Orthographic,
        ProjCode::GeneralVerticalNearSide,
        ProjCode::Sinusoidal,
        ProjCode::Equirectangular,
        ProjCode::Miller,
        ProjCode::VanDerGrinten,
        ProjCode::HotineObliqueMercator,
        ProjCode::Robinson,
        ProjCode::SpaceObliqueMercator,
        ProjCode::AlaskaConformal,
        ProjCode::GoodeHomolosine,
        ProjCode::Mollweide,
        ProjCode::InterruptedMollweide,
        ProjCode::Hammer,
        ProjCode::WagnerIV,
        ProjCode::WagnerVII,
        ProjCode::OblatedEqualArea,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn name(self) -> &'static str {
        match self {
            ProjCode::Geographic => "Geographic",
            ProjCode::Utm => "UTM",
            ProjCode::StatePlane => "State Plane",
            ProjCode::Albers => "Albers Conical Equal-Area",
            ProjCode::LambertConformalConic => "Lambert Conformal Conic",
            ProjCode::Mercator => "Mercator",
            ProjCode::PolarStereographic => "Polar Stereographic",
            ProjCode::Polyconic => "Polyconic",
            ProjCode::EquidistantConic => "Equidistant Conic",
            ProjCode::TransverseMercator => "Transverse Mercator",
            ProjCode::Stereographic => "Stereographic",
            ProjCode::LambertAzimuthal => "Lambert Azimuthal Equal Area",
            ProjCode::AzimuthalEquidistant => "Azimuthal Equidistant",
            ProjCode::Gnomonic => "Gnomonic",
            ProjCode::Orthographic => "Orthographic",
            ProjCode::GeneralVerticalNearSide => "General Vertical Near-Side Perspective",
            ProjCode::Sinusoidal => "Sinusoidal",
            ProjCode::Equirectangular => "Equirectangular",
            ProjCode::Miller => "Miller Cylindrical",
            ProjCode::VanDerGrinten => "Van der Grinten",
            ProjCode::HotineObliqueMercator => "Hotine Oblique Mercator",
            ProjCode::Robinson => "Robinson",
            ProjCode::SpaceObliqueMercator => "Space Oblique Mercator",
            ProjCode::AlaskaConformal => "Alaska Conformal",
            ProjCode::GoodeHomolosine => "Interrupted Goode Homolosine",
            ProjCode::Mollweide => "Mollweide",
            ProjCode::InterruptedMollweide => "Interrupted Mollweide",
            ProjCode::Hammer => "Hammer",
            ProjCode::WagnerIV => "Wagner IV",
            ProjCode::WagnerVII => "Wagner VII",
            ProjCode::OblatedEqualArea => "Oblated Equal Area",
        }
    }
}

impl fmt::Display for ProjCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Datums
// ============================================================================

/// Spheroid selection. `NotSet` means the axes come from the first two
/// entries of the parameter array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Datum {
    #[default]
    NotSet = -1,
    Clarke1866 = 0,
    Clarke1880,
    Bessel,
    International1967,
    International1909,
    Wgs72,
    Everest,
    Wgs66,
    Grs1980,
    Airy,
    ModifiedEverest,
    ModifiedAiry,
    Wgs84,
    SoutheastAsia,
    AustralianNational,
    Krassovsky,
    Hough,
    Mercury1960,
    ModifiedMercury1968,
    Sphere,
    Bessel1841Namibia,
    EverestSabah,
    EverestIndia1956,
    EverestMalaysia1969,
    EverestMalay1948,
    EverestPakistan,
    Hayford,
    Helmert1906,
    Indonesian1974,
    SouthAmerican1969,
    Wgs60,
}

impl Datum {
    pub(crate) const ALL: [Datum; SPHDCT] = [
        Datum::Clarke1866,
        Datum::Clarke1880,
        Datum::Bessel,
        Datum::International1967,
        Datum::International1909,
        Datum::Wgs72,
        Datum::Everest,
        Datum::Wgs66,
        Datum::Grs1980,
        Datum::Airy,
        Datum::ModifiedEverest,
        Datum::ModifiedAiry,
        Datum::Wgs84,
        Datum::SoutheastAsia,
        Datum::AustralianNational,
        Datum::Krassovsky,
        Datum::Hough,
        Datum::Mercury1960,
        Datum::ModifiedMercury1968,
        Datum::Sphere,
        Datum::Bessel1841Namibia,
        Datum::EverestSabah,
        Datum::EverestIndia1956,
        Datum::EverestMalaysia1969,
        Datum::EverestMalay1948,
        Datum::EverestPakistan,
        Datum::Hayford,
        Datum::Helmert1906,
        Datum::Indonesian1974,
        Datum::SouthAmerican1969,
        Datum::Wgs60,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        if code == -1 {
            return Some(Datum::NotSet);
        }
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Semi-major and semi-minor axes, if this datum names a spheroid.
    pub fn axes(self) -> Option<(f64, f64)> {
        usize::try_from(self.code())
            .ok()
            .map(|i| (MAJOR_AXES[i], MINOR_AXES[i]))
    }

    /// Spheroid name as used in WKT `SPHEROID` nodes.
    pub fn spheroid_name(self) -> &'static str {
        match self {
            Datum::NotSet => "unnamed",
            Datum::Clarke1866 => "Clarke 1866",
            Datum::Clarke1880 => "Clarke 1880",
            Datum::Bessel => "Bessel 1841",
            Datum::International1967 => "International 1967",
            Datum::International1909 => "International 1909",
            Datum::Wgs72 => "WGS 72",
            Datum::Everest => "Everest",
            Datum::Wgs66 => "WGS 66",
            Datum::Grs1980 => "GRS 1980",
            Datum::Airy => "Airy 1830",
            Datum::ModifiedEverest => "Modified Everest",
            Datum::ModifiedAiry => "Modified Airy",
            Datum::Wgs84 => "WGS 84",
            Datum::SoutheastAsia => "Southeast Asia",
            Datum::AustralianNational => "Australian National",
            Datum::Krassovsky => "Krassovsky 1940",
            Datum::Hough => "Hough",
            Datum::Mercury1960 => "Mercury 1960",
            Datum::ModifiedMercury1968 => "Modified Mercury 1968",
            Datum::Sphere => "Sphere",
            Datum::Bessel1841Namibia => "Bessel 1841 (Namibia)",
            Datum::EverestSabah => "Everest (Sabah and Sarawak)",
            Datum::EverestIndia1956 => "Everest (India 1956)",
            Datum::EverestMalaysia1969 => "Everest (Malaysia 1969)",
            Datum::EverestMalay1948 => "Everest (Malay and Singapore 1948)",
            Datum::EverestPakistan => "Everest (Pakistan)",
            Datum::Hayford => "Hayford",
            Datum::Helmert1906 => "Helmert 1906",
            Datum::Indonesian1974 => "Indonesian 1974",
            Datum::SouthAmerican1969 => "South American 1969",
            Datum::Wgs60 => "WGS 60",
        }
    }

    /// Datum whose spheroid has the given name, ignoring case and
    /// punctuation.
    pub fn from_spheroid_name(name: &str) -> Option<Self> {
        let wanted = normalize_name(name);
        Self::ALL
            .iter()
            .copied()
            .find(|d| normalize_name(d.spheroid_name()) == wanted)
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
