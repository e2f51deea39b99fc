//! PROJ-style `+key=value` strings.

use std::collections::HashMap;
use std::fmt::Write;

use raster_common::Unit;

use super::{
    axes_and_inverse_flattening, proj_name, set_axes, set_slot, slot_value, slots, SrsError,
    SrsResult, NAMES,
};
use crate::constants::{Datum, ProjCode};
use crate::params::ProjectionSpec;
use crate::projection::Projection;

/// PROJ ellipsoid names for the datums PROJ knows under the same axes.
const ELLIPSOIDS: &[(Datum, &str)] = &[
    (Datum::Clarke1866, "clrk66"),
    (Datum::Clarke1880, "clrk80"),
    (Datum::Bessel, "bessel"),
    (Datum::International1909, "intl"),
    (Datum::Wgs72, "WGS72"),
    (Datum::Everest, "evrst30"),
    (Datum::Wgs66, "WGS66"),
    (Datum::Grs1980, "GRS80"),
    (Datum::Airy, "airy"),
    (Datum::ModifiedAiry, "mod_airy"),
    (Datum::Wgs84, "WGS84"),
    (Datum::AustralianNational, "aust_SA"),
    (Datum::Krassovsky, "krass"),
    (Datum::Helmert1906, "helmert"),
    (Datum::Sphere, "sphere"),
    (Datum::Wgs60, "WGS60"),
];

pub fn parse_proj_string(text: &str) -> SrsResult<ProjectionSpec> {
    let mut pairs: HashMap<&str, &str> = HashMap::new();
    for token in text.split_whitespace() {
        let token = token.trim_start_matches('+');
        if token.is_empty() {
            continue;
        }
        let (key, value) = token.split_once('=').unwrap_or((token, ""));
        pairs.insert(key, value);
    }

    let name = *pairs.get("proj").ok_or(SrsError::Empty)?;
    let number = |key: &str| -> SrsResult<Option<f64>> {
        match pairs.get(key) {
            None => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| SrsError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    };

    let code = match name {
        "longlat" | "latlong" | "lonlat" | "latlon" => ProjCode::Geographic,
        "stere" => {
            let polar = number("lat_0")?.is_some_and(|lat| (lat.abs() - 90.0).abs() < 1e-9);
            if polar {
                ProjCode::PolarStereographic
            } else {
                ProjCode::Stereographic
            }
        }
        other => NAMES
            .iter()
            .find(|(_, proj, _)| *proj == other)
            .map(|(code, _, _)| *code)
            .ok_or_else(|| SrsError::UnknownProjection(other.to_string()))?,
    };

    let mut spec = ProjectionSpec::new(code);
    for slot in slots(code) {
        if let Some(value) = number(slot.proj)? {
            set_slot(&mut spec, slot, value);
        }
    }

    match code {
        ProjCode::Utm => {
            let zone = number("zone")?.unwrap_or(0.0) as i32;
            spec.zone = if pairs.contains_key("south") { -zone } else { zone };
        }
        ProjCode::PolarStereographic if !pairs.contains_key("lat_ts") => {
            if let Some(lat_0) = number("lat_0")? {
                set_slot(&mut spec, &slots(code)[1], lat_0);
            }
        }
        ProjCode::EquidistantConic => {
            spec.params[8] = if pairs.contains_key("lat_2") { 1.0 } else { 0.0 };
        }
        ProjCode::HotineObliqueMercator => {
            let two_point = pairs.contains_key("lon_1") && !pairs.contains_key("alpha");
            spec.params[12] = if two_point { 0.0 } else { 1.0 };
        }
        _ => {}
    }

    if let Some(datum) = pairs.get("datum") {
        spec.datum = match datum.to_ascii_uppercase().as_str() {
            "WGS84" => Datum::Wgs84,
            "NAD83" => Datum::Grs1980,
            "NAD27" => Datum::Clarke1866,
            other => return Err(SrsError::InvalidValue {
                key: "datum".to_string(),
                value: other.to_string(),
            }),
        };
    }
    if let Some(ellps) = pairs.get("ellps") {
        spec.datum = ELLIPSOIDS
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(ellps))
            .map(|(datum, _)| *datum)
            .ok_or_else(|| SrsError::InvalidValue {
                key: "ellps".to_string(),
                value: ellps.to_string(),
            })?;
    }
    if let Some(radius) = number("R")? {
        set_axes(&mut spec, radius, radius);
    } else if let Some(a) = number("a")? {
        let b = match (number("b")?, number("rf")?) {
            (Some(b), _) => b,
            (None, Some(rf)) if rf != 0.0 => a * (1.0 - 1.0 / rf),
            _ => a,
        };
        set_axes(&mut spec, a, b);
    }

    if let Some(units) = pairs.get("units") {
        spec.unit = units.parse::<Unit>().map_err(|_| SrsError::InvalidValue {
            key: "units".to_string(),
            value: units.to_string(),
        })?;
    }
    Ok(spec)
}

/// PROJ string for a projection. State Plane has no PROJ equivalent here
/// and cannot be built as a [`Projection`] anyway.
pub fn to_proj_string(projection: &Projection) -> String {
    let spec = projection.spec();
    let code = spec.code;
    let mut out = format!("+proj={}", proj_name(code).unwrap_or("unknown"));

    match code {
        ProjCode::Utm => {
            let zone = projection.utm_zone().unwrap_or(spec.zone);
            let _ = write!(out, " +zone={}", zone.abs());
            if zone < 0 {
                out.push_str(" +south");
            }
        }
        ProjCode::PolarStereographic => {
            let lat_ts = slot_value(spec, &slots(code)[1]);
            let pole = if lat_ts < 0.0 { -90 } else { 90 };
            let _ = write!(out, " +lat_0={pole}");
        }
        _ => {}
    }

    for slot in slots(code) {
        let skip = match code {
            ProjCode::EquidistantConic => slot.index == 3 && spec.params[8] == 0.0,
            ProjCode::HotineObliqueMercator if spec.params[12] != 0.0 => {
                (8..=11).contains(&slot.index)
            }
            ProjCode::HotineObliqueMercator => slot.index == 3,
            _ => false,
        };
        if !skip {
            let _ = write!(out, " +{}={}", slot.proj, slot_value(spec, slot));
        }
    }

    match ELLIPSOIDS.iter().find(|(datum, _)| *datum == spec.datum) {
        Some((Datum::Wgs84, _)) => out.push_str(" +datum=WGS84"),
        Some((_, name)) => {
            let _ = write!(out, " +ellps={name}");
        }
        None => {
            let (a, rf) = axes_and_inverse_flattening(spec);
            if rf == 0.0 {
                let _ = write!(out, " +R={a}");
            } else {
                let _ = write!(out, " +a={a} +rf={rf}");
            }
        }
    }

    if !projection.unit().is_angular() {
        let _ = write!(out, " +units={}", projection.unit());
    }
    out.push_str(" +no_defs");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(text: &str) -> ProjectionSpec {
        let spec = parse_proj_string(text).unwrap();
        let projection = Projection::new(spec.clone()).unwrap();
        let again = parse_proj_string(&to_proj_string(&projection)).unwrap();
        assert_eq!(again.code, spec.code);
        assert_eq!(again.datum, spec.datum);
        assert_eq!(again.unit, spec.unit);
        for (a, b) in again.params.iter().zip(spec.params.iter()) {
            assert!((a - b).abs() < 1e-6, "{text}: {a} != {b}");
        }
        again
    }

    #[test]
    fn test_utm_south() {
        let spec = round_trip("+proj=utm +zone=33 +south +datum=WGS84 +units=m +no_defs");
        assert_eq!(spec.code, ProjCode::Utm);
        assert_eq!(spec.zone, -33);
    }

    #[test]
    fn test_albers_conus() {
        let spec = round_trip(
            "+proj=aea +lat_1=29.5 +lat_2=45.5 +lat_0=23 +lon_0=-96 +x_0=0 +y_0=0 +ellps=GRS80 +units=m",
        );
        assert_eq!(spec.code, ProjCode::Albers);
        assert_eq!(spec.datum, Datum::Grs1980);
        assert_eq!(spec.params[2], 29_030_000.0);
        assert_eq!(spec.params[4], -96_000_000.0);
    }

    #[test]
    fn test_polar_stereographic_from_stere() {
        let spec = round_trip("+proj=stere +lat_0=-90 +lat_ts=-71 +lon_0=0 +datum=WGS84 +units=m");
        assert_eq!(spec.code, ProjCode::PolarStereographic);
        assert_eq!(spec.params[5], -71_000_000.0);

        let oblique = parse_proj_string("+proj=stere +lat_0=45 +lon_0=10").unwrap();
        assert_eq!(oblique.code, ProjCode::Stereographic);
    }

    #[test]
    fn test_sphere_radius_and_feet() {
        let spec = round_trip("+proj=sinu +lon_0=0 +R=6371007.181 +units=us-ft");
        assert_eq!(spec.datum, Datum::NotSet);
        assert_eq!(spec.params[0], 6371007.181);
        assert_eq!(spec.unit, Unit::Feet);
    }

    #[test]
    fn test_geographic() {
        let spec = round_trip("+proj=longlat +datum=WGS84 +no_defs");
        assert_eq!(spec.code, ProjCode::Geographic);
        assert_eq!(spec.unit, Unit::Degree);
    }

    #[test]
    fn test_unknown_projection() {
        assert!(matches!(
            parse_proj_string("+proj=bogus"),
            Err(SrsError::UnknownProjection(_))
        ));
        assert!(matches!(
            parse_proj_string("+proj=sinu +lon_0=abc"),
            Err(SrsError::InvalidValue { .. })
        ));
    }
}
