//! GeoTIFF tag layout shared by the writer and the reader.

use std::io::{Read, Seek, Write};

use projection::Projection;
use raster_common::{GeoTransform, Unit};
use tiff::decoder::ifd::Value;
use tiff::decoder::Decoder;
use tiff::encoder::{DirectoryEncoder, TiffKind};
use tiff::tags::Tag;

use crate::error::{Result, SptwError};

// GeoTIFF tag IDs (not in the tiff crate)
pub const MODEL_PIXEL_SCALE: u16 = 33550;
pub const MODEL_TIEPOINT: u16 = 33922;
pub const MODEL_TRANSFORMATION: u16 = 34264;
pub const GEO_KEY_DIRECTORY: u16 = 34735;
pub const GEO_ASCII_PARAMS: u16 = 34737;

// GeoKey IDs
const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GT_CITATION: u16 = 1026;
const GEOG_ANGULAR_UNITS: u16 = 2054;
const PROJ_LINEAR_UNITS: u16 = 3076;

// GeoKey values
const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const ANGULAR_RADIAN: u16 = 9101;
const ANGULAR_DEGREE: u16 = 9102;
const ANGULAR_ARC_SECOND: u16 = 9104;
const LINEAR_METER: u16 = 9001;
const LINEAR_FOOT: u16 = 9002;
const LINEAR_FOOT_US_SURVEY: u16 = 9003;

/// GeoAsciiParams content: the projection's WKT terminated by `|`.
pub fn ascii_params(wkt: &str) -> String {
    format!("{wkt}|")
}

/// GeoKeyDirectory for a raster in `projection`, whose citation points at
/// `citation_len` characters at the start of GeoAsciiParams.
pub fn geokey_directory(projection: &Projection, citation_len: usize) -> Vec<u16> {
    let geographic = projection.is_geographic();
    let mut keys: Vec<[u16; 4]> = vec![
        [
            GT_MODEL_TYPE,
            0,
            1,
            if geographic {
                MODEL_TYPE_GEOGRAPHIC
            } else {
                MODEL_TYPE_PROJECTED
            },
        ],
        [GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA],
        [
            GT_CITATION,
            GEO_ASCII_PARAMS,
            citation_len.min(u16::MAX as usize) as u16,
            0,
        ],
    ];

    let unit_key = match projection.unit() {
        Unit::Degree => Some((GEOG_ANGULAR_UNITS, ANGULAR_DEGREE)),
        Unit::Radian => Some((GEOG_ANGULAR_UNITS, ANGULAR_RADIAN)),
        Unit::ArcSecond => Some((GEOG_ANGULAR_UNITS, ANGULAR_ARC_SECOND)),
        Unit::Meter => Some((PROJ_LINEAR_UNITS, LINEAR_METER)),
        Unit::InternationalFeet => Some((PROJ_LINEAR_UNITS, LINEAR_FOOT)),
        Unit::Feet => Some((PROJ_LINEAR_UNITS, LINEAR_FOOT_US_SURVEY)),
        Unit::Undefined => None,
    };
    if let Some((key, value)) = unit_key {
        keys.push([key, 0, 1, value]);
    }
    // Keys must be sorted by ID.
    keys.sort_by_key(|key| key[0]);

    let mut directory = vec![1, 1, 0, keys.len() as u16];
    directory.extend(keys.iter().flatten());
    directory
}

/// Write the georeferencing tags of a north-up raster.
pub fn write_geotiff_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<W, K>,
    geotransform: &GeoTransform,
    projection: &Projection,
) -> Result<()> {
    let pixel_size = geotransform.pixel_size();
    let scale = [pixel_size, pixel_size, 0.0];
    dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), scale.as_slice())?;

    let tiepoint = [0.0, 0.0, 0.0, geotransform.ul_x(), geotransform.ul_y(), 0.0];
    dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), tiepoint.as_slice())?;

    let ascii = ascii_params(&projection::to_wkt(projection));
    let keys = geokey_directory(projection, ascii.len());
    dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), keys.as_slice())?;
    dir.write_tag(Tag::Unknown(GEO_ASCII_PARAMS), ascii.as_str())?;
    Ok(())
}

/// Geotransform from ModelTiepoint + ModelPixelScale, or from
/// ModelTransformation. `None` when the file carries neither.
pub fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<GeoTransform>> {
    let tiepoint = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT));
    let scale = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE));
    if let (Ok(tiepoint), Ok(scale)) = (tiepoint, scale) {
        if tiepoint.len() >= 6 && scale.len() >= 2 {
            let [i, j, _, x, y, _] = [
                tiepoint[0],
                tiepoint[1],
                tiepoint[2],
                tiepoint[3],
                tiepoint[4],
                tiepoint[5],
            ];
            let (sx, sy) = (scale[0], scale[1]);
            return Ok(Some(GeoTransform([x - i * sx, sx, 0.0, y + j * sy, 0.0, -sy])));
        }
    }

    if let Ok(matrix) = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_TRANSFORMATION)) {
        if matrix.len() >= 8 {
            return Ok(Some(GeoTransform([
                matrix[3], matrix[0], matrix[1], matrix[7], matrix[4], matrix[5],
            ])));
        }
    }
    Ok(None)
}

/// WKT or PROJ text from GeoAsciiParams, without the `|` separators.
pub fn read_projection_text<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<String> {
    let text = decoder.get_tag_ascii_string(Tag::Unknown(GEO_ASCII_PARAMS)).ok()?;
    let text = text.trim_end_matches(['|', '\0']).trim();
    let first = text.split('|').next().unwrap_or(text).trim();
    (!first.is_empty()).then(|| first.to_string())
}

/// Unsigned integers of a tag, scalar or list. `None` when absent.
pub fn tag_u64s<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> Result<Option<Vec<u64>>> {
    let values = match decoder.find_tag(tag)? {
        None => return Ok(None),
        Some(Value::List(values)) => values
            .into_iter()
            .map(Value::into_u64)
            .collect::<tiff::TiffResult<Vec<_>>>()?,
        Some(value) => vec![value.into_u64()?],
    };
    Ok(Some(values))
}

/// First value of an unsigned tag, or `default` when absent.
pub fn tag_u64_or<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag, default: u64) -> Result<u64> {
    Ok(tag_u64s(decoder, tag)?
        .and_then(|values| values.first().copied())
        .unwrap_or(default))
}

/// Every value of `values` is equal; returns it.
pub fn uniform(values: &[u64], what: &str) -> Result<u64> {
    match values.split_first() {
        Some((first, rest)) if rest.iter().all(|v| v == first) => Ok(*first),
        Some(_) => Err(SptwError::layout(format!("{what} differs between bands"))),
        None => Err(SptwError::layout(format!("{what} is empty"))),
    }
}

/// Whether the file's TIFF header byte order matches this machine.
pub fn native_byte_order<R: Read + Seek>(reader: &mut R) -> Result<bool> {
    let mut header = [0u8; 2];
    reader.seek(std::io::SeekFrom::Start(0))?;
    reader.read_exact(&mut header)?;
    let native: &[u8; 2] = if cfg!(target_endian = "little") { b"II" } else { b"MM" };
    Ok(&header == native)
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::{parse_srs, ProjCode};

    #[test]
    fn test_geokeys_geographic() {
        let projection = Projection::from_code(ProjCode::Geographic).unwrap();
        let keys = geokey_directory(&projection, 42);
        assert_eq!(&keys[..4], &[1, 1, 0, 4]);
        assert_eq!(&keys[4..8], &[GT_MODEL_TYPE, 0, 1, MODEL_TYPE_GEOGRAPHIC]);
        assert_eq!(&keys[12..16], &[GT_CITATION, GEO_ASCII_PARAMS, 42, 0]);
        assert_eq!(&keys[16..20], &[GEOG_ANGULAR_UNITS, 0, 1, ANGULAR_DEGREE]);
    }

    #[test]
    fn test_geokeys_projected_sorted() {
        let spec = parse_srs("+proj=sinu +lon_0=0 +R=6370997 +units=m").unwrap();
        let projection = Projection::new(spec).unwrap();
        let keys = geokey_directory(&projection, 10);
        assert_eq!(keys[7], MODEL_TYPE_PROJECTED);
        let ids: Vec<u16> = keys[4..].chunks(4).map(|k| k[0]).collect();
        assert_eq!(ids, vec![GT_MODEL_TYPE, GT_RASTER_TYPE, GT_CITATION, PROJ_LINEAR_UNITS]);
        assert_eq!(keys[keys.len() - 1], LINEAR_METER);
    }

    #[test]
    fn test_uniform() {
        assert_eq!(uniform(&[16, 16, 16], "bits").unwrap(), 16);
        assert!(uniform(&[8, 16], "bits").is_err());
        assert!(uniform(&[], "bits").is_err());
    }

    #[test]
    fn test_ascii_params_terminated() {
        assert_eq!(ascii_params("GEOGCS[]"), "GEOGCS[]|");
    }
}
