//! WKT1 `GEOGCS` / `PROJCS` text.

use std::fmt::Write;

use raster_common::Unit;

use super::{
    axes_and_inverse_flattening, code_from_wkt_name, set_axes, set_slot, slot_value, slots,
    wkt_name, SrsError, SrsResult,
};
use crate::constants::{Datum, ProjCode};
use crate::params::ProjectionSpec;
use crate::projection::Projection;

/// One `NAME[arg, ...]` node.
#[derive(Debug, Clone, PartialEq)]
struct Node {
    keyword: String,
    args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Text(String),
    Number(f64),
    Node(Node),
}

impl Node {
    fn text(&self, index: usize) -> Option<&str> {
        match self.args.get(index) {
            Some(Value::Text(text)) => Some(text),
            _ => None,
        }
    }

    fn number(&self, index: usize) -> Option<f64> {
        match self.args.get(index) {
            Some(Value::Number(n)) => Some(*n),
            _ => None,
        }
    }

    fn children<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.args.iter().filter_map(move |value| match value {
            Value::Node(node) if node.keyword.eq_ignore_ascii_case(keyword) => Some(node),
            _ => None,
        })
    }

    fn child<'a>(&'a self, keyword: &'a str) -> Option<&'a Node> {
        self.children(keyword).next()
    }

    /// First matching node anywhere below this one.
    fn find(&self, keyword: &str) -> Option<&Node> {
        self.args.iter().find_map(|value| match value {
            Value::Node(node) if node.keyword.eq_ignore_ascii_case(keyword) => Some(node),
            Value::Node(node) => node.find(keyword),
            _ => None,
        })
    }
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn error(&self, message: &str) -> SrsError {
        SrsError::MalformedWkt(format!("{message} at offset {}", self.pos))
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.rest().chars().next()
    }

    fn expect(&mut self, wanted: char) -> SrsResult<()> {
        match self.peek() {
            Some(c) if c == wanted => {
                self.pos += c.len_utf8();
                Ok(())
            }
            _ => Err(self.error(&format!("expected '{wanted}'"))),
        }
    }

    fn node(&mut self) -> SrsResult<Node> {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected keyword"));
        }
        let keyword = rest[..len].to_string();
        self.pos += len;

        let close = match self.peek() {
            Some('[') => ']',
            Some('(') => ')',
            _ => return Err(self.error("expected '['")),
        };
        self.pos += 1;

        let mut args = Vec::new();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(Node { keyword, args });
        }
        loop {
            args.push(self.value()?);
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok(Node { keyword, args });
                }
                _ => return Err(self.error("expected ',' or closing bracket")),
            }
        }
    }

    fn value(&mut self) -> SrsResult<Value> {
        match self.peek() {
            Some('"') => {
                self.pos += 1;
                let rest = self.rest();
                let end = rest.find('"').ok_or_else(|| self.error("unterminated string"))?;
                let text = rest[..end].to_string();
                self.pos += end + 1;
                Ok(Value::Text(text))
            }
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
                let rest = self.rest();
                let len = rest
                    .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')))
                    .unwrap_or(rest.len());
                let number = rest[..len]
                    .parse()
                    .map_err(|_| self.error("invalid number"))?;
                self.pos += len;
                Ok(Value::Number(number))
            }
            Some(_) => {
                // Bare enumerations such as AXIS["X",EAST].
                let save = self.pos;
                match self.node() {
                    Ok(node) => Ok(Value::Node(node)),
                    Err(_) => {
                        self.pos = save;
                        let rest = self.rest();
                        let len = rest
                            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                            .unwrap_or(rest.len());
                        if len == 0 {
                            return Err(self.error("unexpected character"));
                        }
                        self.pos += len;
                        Ok(Value::Text(rest[..len].to_string()))
                    }
                }
            }
            None => Err(self.error("unexpected end of input")),
        }
    }
}

pub fn parse_wkt(text: &str) -> SrsResult<ProjectionSpec> {
    let mut parser = Parser::new(text.trim());
    let root = parser.node()?;
    if parser.peek().is_some() {
        return Err(parser.error("trailing characters"));
    }

    let geogcs = if root.keyword.eq_ignore_ascii_case("GEOGCS") {
        Some(&root)
    } else {
        root.child("GEOGCS")
    };

    let mut spec = if root.keyword.eq_ignore_ascii_case("GEOGCS") {
        let mut spec = ProjectionSpec::new(ProjCode::Geographic);
        if let Some(unit) = root.child("UNIT").and_then(|u| u.number(1)) {
            if (unit - 1.0).abs() < 1e-12 {
                spec.unit = Unit::Radian;
            }
        }
        spec
    } else if root.keyword.eq_ignore_ascii_case("PROJCS") {
        parse_projcs(&root)?
    } else {
        return Err(SrsError::MalformedWkt(format!(
            "unsupported root node {}",
            root.keyword
        )));
    };

    if let Some(spheroid) = geogcs.and_then(|g| g.find("SPHEROID")) {
        let named = spheroid.text(0).and_then(Datum::from_spheroid_name);
        match (named, spheroid.number(1), spheroid.number(2)) {
            (Some(datum), _, _) => spec.datum = datum,
            (None, Some(a), Some(rf)) => {
                let b = if rf == 0.0 { a } else { a * (1.0 - 1.0 / rf) };
                set_axes(&mut spec, a, b);
            }
            _ => return Err(SrsError::MalformedWkt("SPHEROID without axes".to_string())),
        }
    }
    Ok(spec)
}

fn parse_projcs(root: &Node) -> SrsResult<ProjectionSpec> {
    let method = root
        .child("PROJECTION")
        .and_then(|p| p.text(0))
        .ok_or_else(|| SrsError::MalformedWkt("PROJCS without PROJECTION".to_string()))?;
    let mut code = code_from_wkt_name(method)
        .ok_or_else(|| SrsError::UnknownProjection(method.to_string()))?;

    let zone = root.text(0).and_then(utm_zone_from_name);
    if code == ProjCode::TransverseMercator && zone.is_some() {
        code = ProjCode::Utm;
    }

    let mut spec = ProjectionSpec::new(code);
    if let Some(zone) = zone.filter(|_| code == ProjCode::Utm) {
        spec.zone = zone;
    }

    let parameters: Vec<(&str, f64)> = root
        .children("PARAMETER")
        .filter_map(|p| Some((p.text(0)?, p.number(1)?)))
        .collect();
    let lookup = |name: &str| {
        parameters
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    };

    for slot in slots(code) {
        let value = lookup(slot.wkt).or_else(|| match slot.index {
            4 => lookup("longitude_of_center"),
            5 => lookup("latitude_of_origin")
                .or_else(|| lookup("latitude_of_center"))
                .or_else(|| lookup("standard_parallel_1")),
            _ => None,
        });
        if let Some(value) = value {
            set_slot(&mut spec, slot, value);
        }
    }

    match code {
        ProjCode::EquidistantConic => {
            spec.params[8] = if lookup("standard_parallel_2").is_some() {
                1.0
            } else {
                0.0
            };
        }
        ProjCode::HotineObliqueMercator => {
            let two_point = lookup("longitude_of_point_1").is_some() && lookup("azimuth").is_none();
            spec.params[12] = if two_point { 0.0 } else { 1.0 };
        }
        _ => {}
    }

    if let Some(unit) = root.child("UNIT") {
        spec.unit = linear_unit(unit.text(0).unwrap_or(""), unit.number(1).unwrap_or(1.0));
    }
    Ok(spec)
}

/// `UTM zone 33N` / `UTM Zone 33, Southern Hemisphere` → signed zone.
fn utm_zone_from_name(name: &str) -> Option<i32> {
    let lower = name.to_ascii_lowercase();
    let start = lower.find("utm zone")? + "utm zone".len();
    let rest = lower[start..].trim_start();
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let zone: i32 = digits.parse().ok()?;
    let suffix = &rest[digits.len()..];
    let south = suffix.starts_with('s') || suffix.contains("south");
    Some(if south { -zone } else { zone })
}

fn linear_unit(name: &str, factor: f64) -> Unit {
    if let Ok(unit) = name.replace(' ', "_").parse::<Unit>() {
        if !unit.is_angular() {
            return unit;
        }
    }
    if (factor - 0.3048006096012192).abs() < 1e-12 {
        Unit::Feet
    } else if (factor - 0.3048).abs() < 1e-12 {
        Unit::InternationalFeet
    } else {
        Unit::Meter
    }
}

fn geogcs(spec: &ProjectionSpec) -> String {
    let (a, rf) = axes_and_inverse_flattening(spec);
    let (geog_name, datum_name) = match spec.datum {
        Datum::Wgs84 => ("WGS 84", "WGS_1984".to_string()),
        Datum::NotSet => ("unnamed", "unknown".to_string()),
        datum => (datum.spheroid_name(), datum.spheroid_name().replace(' ', "_")),
    };
    let (unit_name, unit_factor) = if spec.code == ProjCode::Geographic && spec.unit == Unit::Radian
    {
        ("radian", 1.0)
    } else {
        ("degree", 0.0174532925199433)
    };
    format!(
        "GEOGCS[\"{geog_name}\",DATUM[\"{datum_name}\",SPHEROID[\"{}\",{a},{rf}]],PRIMEM[\"Greenwich\",0],UNIT[\"{unit_name}\",{unit_factor}]]",
        spec.datum.spheroid_name()
    )
}

/// WKT1 for a projection. Geographic projections produce a bare `GEOGCS`.
pub fn to_wkt(projection: &Projection) -> String {
    let spec = projection.spec();
    let geog = geogcs(spec);
    if spec.code == ProjCode::Geographic {
        return geog;
    }

    let code = spec.code;
    let name = match code {
        ProjCode::Utm => {
            let zone = projection.utm_zone().unwrap_or(spec.zone);
            let hemisphere = if zone < 0 { 'S' } else { 'N' };
            format!("UTM Zone {}{hemisphere}", zone.abs())
        }
        _ => projection.name().to_string(),
    };

    let mut out = format!(
        "PROJCS[\"{name}\",{geog},PROJECTION[\"{}\"]",
        wkt_name(code).unwrap_or("unknown")
    );

    if code == ProjCode::Utm {
        let zone = projection.utm_zone().unwrap_or(spec.zone);
        let central_meridian = (6 * zone.abs() - 183) as f64;
        let false_northing = if zone < 0 { 10_000_000.0 } else { 0.0 };
        let _ = write!(
            out,
            ",PARAMETER[\"latitude_of_origin\",0],PARAMETER[\"central_meridian\",{central_meridian}],PARAMETER[\"scale_factor\",0.9996],PARAMETER[\"false_easting\",500000],PARAMETER[\"false_northing\",{false_northing}]"
        );
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
            let _ = write!(out, ",PARAMETER[\"{}\",{}]", slot.wkt, slot_value(spec, slot));
        }
    }

    let (unit_name, factor) = match projection.unit() {
        Unit::Feet => ("US survey foot", 0.3048006096012192),
        Unit::InternationalFeet => ("foot", 0.3048),
        _ => ("metre", 1.0),
    };
    let _ = write!(out, ",UNIT[\"{unit_name}\",{factor}]]");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_utm_wkt() {
        let wkt = r#"PROJCS["WGS 84 / UTM zone 33N",
            GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]]],
                PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],
            PROJECTION["Transverse_Mercator"],
            PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",15],
            PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],
            PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],
            AXIS["Easting",EAST],AXIS["Northing",NORTH]]"#;
        let spec = parse_wkt(wkt).unwrap();
        assert_eq!(spec.code, ProjCode::Utm);
        assert_eq!(spec.zone, 33);
        assert_eq!(spec.datum, Datum::Wgs84);
        assert_eq!(spec.unit, Unit::Meter);
    }

    #[test]
    fn test_round_trip_lambert_conformal() {
        let spec = ProjectionSpec::new(ProjCode::LambertConformalConic)
            .with_param(2, 33_000_000.0)
            .with_param(3, 45_000_000.0)
            .with_param(4, -96_000_000.0)
            .with_param(5, 39_000_000.0)
            .with_param(6, 1000.0)
            .with_datum(Datum::Grs1980);
        let projection = Projection::new(spec.clone()).unwrap();
        let parsed = parse_wkt(&to_wkt(&projection)).unwrap();
        assert_eq!(parsed.code, ProjCode::LambertConformalConic);
        assert_eq!(parsed.datum, Datum::Grs1980);
        for i in 2..=7 {
            assert!((parsed.params[i] - spec.params[i]).abs() < 1e-6, "slot {i}");
        }
    }

    #[test]
    fn test_geographic_round_trip() {
        let projection = Projection::from_code(ProjCode::Geographic).unwrap();
        let wkt = to_wkt(&projection);
        assert!(wkt.starts_with("GEOGCS[\"WGS 84\""));
        let spec = parse_wkt(&wkt).unwrap();
        assert_eq!(spec.code, ProjCode::Geographic);
        assert_eq!(spec.unit, Unit::Degree);
    }

    #[test]
    fn test_custom_sphere() {
        let spec = ProjectionSpec::new(ProjCode::Sinusoidal)
            .with_datum(Datum::NotSet)
            .with_param(0, 6371007.181);
        let projection = Projection::new(spec).unwrap();
        let parsed = parse_wkt(&to_wkt(&projection)).unwrap();
        assert_eq!(parsed.datum, Datum::NotSet);
        assert_eq!(parsed.params[0], 6371007.181);
        assert_eq!(parsed.params[1], 0.0);
    }

    #[test]
    fn test_malformed() {
        assert!(parse_wkt("PROJCS[\"x\"").is_err());
        assert!(parse_wkt("LOCAL_CS[\"x\"]").is_err());
    }
}
