//! Pixel sample types supported end to end.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::RasterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelType {
    U8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl PixelType {
    pub const ALL: [PixelType; 7] = [
        PixelType::U8,
        PixelType::U16,
        PixelType::I16,
        PixelType::U32,
        PixelType::I32,
        PixelType::F32,
        PixelType::F64,
    ];

    /// Size of one sample in bytes.
    pub fn byte_size(self) -> usize {
        match self {
            PixelType::U8 => 1,
            PixelType::U16 | PixelType::I16 => 2,
            PixelType::U32 | PixelType::I32 | PixelType::F32 => 4,
            PixelType::F64 => 8,
        }
    }

    pub fn bits_per_sample(self) -> u16 {
        (self.byte_size() * 8) as u16
    }

    /// TIFF SampleFormat value: 1 unsigned, 2 signed, 3 IEEE float.
    pub fn sample_format(self) -> u16 {
        match self {
            PixelType::U8 | PixelType::U16 | PixelType::U32 => 1,
            PixelType::I16 | PixelType::I32 => 2,
            PixelType::F32 | PixelType::F64 => 3,
        }
    }

    /// Inverse of (`sample_format`, `bits_per_sample`).
    pub fn from_tiff(sample_format: u16, bits_per_sample: u16) -> Result<Self, RasterError> {
        match (sample_format, bits_per_sample) {
            (1, 8) => Ok(PixelType::U8),
            (1, 16) => Ok(PixelType::U16),
            (2, 16) => Ok(PixelType::I16),
            (1, 32) => Ok(PixelType::U32),
            (2, 32) => Ok(PixelType::I32),
            (3, 32) => Ok(PixelType::F32),
            (3, 64) => Ok(PixelType::F64),
            (format, bits) => Err(RasterError::UnsupportedPixelType(format!(
                "sample format {} with {} bits",
                format, bits
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PixelType::U8 => "u8",
            PixelType::U16 => "u16",
            PixelType::I16 => "i16",
            PixelType::U32 => "u32",
            PixelType::I32 => "i32",
            PixelType::F32 => "f32",
            PixelType::F64 => "f64",
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PixelType {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "u8" | "byte" => Ok(PixelType::U8),
            "u16" | "uint16" => Ok(PixelType::U16),
            "i16" | "int16" => Ok(PixelType::I16),
            "u32" | "uint32" => Ok(PixelType::U32),
            "i32" | "int32" => Ok(PixelType::I32),
            "f32" | "float32" => Ok(PixelType::F32),
            "f64" | "float64" => Ok(PixelType::F64),
            other => Err(RasterError::UnsupportedPixelType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiff_descriptor_roundtrip() {
        for pixel_type in PixelType::ALL {
            let back =
                PixelType::from_tiff(pixel_type.sample_format(), pixel_type.bits_per_sample())
                    .unwrap();
            assert_eq!(back, pixel_type);
        }
    }

    #[test]
    fn test_unsupported_descriptor() {
        assert!(PixelType::from_tiff(2, 8).is_err());
        assert!(PixelType::from_tiff(3, 16).is_err());
    }
}
