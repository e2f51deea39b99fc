//! Common test fixtures for reprojection tests.
//!
//! Spatial references are given as PROJ strings so any crate can parse
//! them without depending on a particular projection API.

/// Spatial reference strings used across the test suite.
pub mod srs {
    /// Longitude/latitude in degrees on WGS84.
    pub const GEOGRAPHIC: &str = "+proj=longlat +datum=WGS84";

    /// World sinusoidal on a sphere, in meters.
    pub const SINUSOIDAL: &str = "+proj=sinu +lon_0=0 +R=6370997 +units=m";

    /// World Mollweide on a sphere, in meters.
    pub const MOLLWEIDE: &str = "+proj=moll +lon_0=0 +R=6370997 +units=m";

    /// Spherical Mercator, in meters.
    pub const MERCATOR: &str = "+proj=merc +lon_0=0 +R=6370997 +units=m";

    /// Lambert azimuthal equal area centered on North America.
    pub const LAEA_NORTH_AMERICA: &str = "+proj=laea +lat_0=45 +lon_0=-100 +R=6370997 +units=m";

    /// Orthographic centered on the prime meridian; half the globe has no
    /// projected coordinates.
    pub const ORTHOGRAPHIC: &str = "+proj=ortho +lat_0=0 +lon_0=0 +R=6370997 +units=m";

    /// Garbage that no parser should accept.
    pub const INVALID: &str = "+proj=no_such_projection";
}
