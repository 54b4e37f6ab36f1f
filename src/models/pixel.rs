//! Label pixel types and their on-disk element types

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{DissolveError, Result};

/// Element type of a stored image, named after the MetaImage `ElementType` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElementType {
    /// Unsigned 8-bit
    UChar,
    /// Signed 8-bit
    Char,
    /// Unsigned 16-bit
    UShort,
    /// Signed 16-bit
    Short,
    /// Unsigned 32-bit
    UInt,
    /// Signed 32-bit
    Int,
    /// Unsigned 64-bit
    ULongLong,
    /// Signed 64-bit
    LongLong,
}

impl ElementType {
    /// Get the MetaImage name, e.g. `MET_UCHAR`
    pub fn to_met_name(&self) -> &'static str {
        match self {
            Self::UChar => "MET_UCHAR",
            Self::Char => "MET_CHAR",
            Self::UShort => "MET_USHORT",
            Self::Short => "MET_SHORT",
            Self::UInt => "MET_UINT",
            Self::Int => "MET_INT",
            Self::ULongLong => "MET_ULONG_LONG",
            Self::LongLong => "MET_LONG_LONG",
        }
    }

    /// Size of one element in bytes
    pub fn size(&self) -> usize {
        match self {
            Self::UChar | Self::Char => 1,
            Self::UShort | Self::Short => 2,
            Self::UInt | Self::Int => 4,
            Self::ULongLong | Self::LongLong => 8,
        }
    }

    /// Rust name of the matching pixel type
    pub fn rust_name(&self) -> &'static str {
        match self {
            Self::UChar => "u8",
            Self::Char => "i8",
            Self::UShort => "u16",
            Self::Short => "i16",
            Self::UInt => "u32",
            Self::Int => "i32",
            Self::ULongLong => "u64",
            Self::LongLong => "i64",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_met_name())
    }
}

impl FromStr for ElementType {
    type Err = DissolveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "MET_UCHAR" | "U8" => Ok(Self::UChar),
            "MET_CHAR" | "I8" => Ok(Self::Char),
            "MET_USHORT" | "U16" => Ok(Self::UShort),
            "MET_SHORT" | "I16" => Ok(Self::Short),
            "MET_UINT" | "MET_ULONG" | "U32" => Ok(Self::UInt),
            "MET_INT" | "MET_LONG" | "I32" => Ok(Self::Int),
            "MET_ULONG_LONG" | "U64" => Ok(Self::ULongLong),
            "MET_LONG_LONG" | "I64" => Ok(Self::LongLong),
            other => Err(DissolveError::UnsupportedPixelType(other.to_string())),
        }
    }
}

/// A pixel type usable as a label.
///
/// Labels are integral; zero is the default background.
pub trait LabelPixel:
    Copy + Ord + Default + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// On-disk element type
    const ELEMENT_TYPE: ElementType;

    /// Decode one value from little-endian bytes.
    ///
    /// `bytes` must be exactly `ELEMENT_TYPE.size()` long.
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// Append the little-endian encoding to `out`
    fn extend_le(self, out: &mut Vec<u8>);

    /// Convert from a wide integer, failing when out of range
    fn try_from_i64(value: i64) -> Result<Self>;

    /// Check for the zero value
    fn is_zero(self) -> bool {
        self == Self::default()
    }
}

macro_rules! impl_label_pixel {
    ($($ty:ty => $element:ident),* $(,)?) => {
        $(
            impl LabelPixel for $ty {
                const ELEMENT_TYPE: ElementType = ElementType::$element;

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(buf)
                }

                fn extend_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn try_from_i64(value: i64) -> Result<Self> {
                    <$ty>::try_from(value).map_err(|_| DissolveError::LabelOutOfRange {
                        value,
                        pixel_type: stringify!($ty),
                    })
                }
            }
        )*
    };
}

impl_label_pixel! {
    u8 => UChar,
    i8 => Char,
    u16 => UShort,
    i16 => Short,
    u32 => UInt,
    i32 => Int,
    u64 => ULongLong,
    i64 => LongLong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_names() {
        assert_eq!("MET_UCHAR".parse::<ElementType>().unwrap(), ElementType::UChar);
        assert_eq!("met_short".parse::<ElementType>().unwrap(), ElementType::Short);
        assert_eq!("MET_LONG".parse::<ElementType>().unwrap(), ElementType::Int);
        assert!("MET_FLOAT".parse::<ElementType>().is_err());
        assert_eq!(ElementType::ULongLong.to_met_name(), "MET_ULONG_LONG");
    }

    #[test]
    fn test_le_encoding() {
        let mut out = Vec::new();
        0x1234u16.extend_le(&mut out);
        assert_eq!(out, vec![0x34, 0x12]);
        assert_eq!(u16::from_le_slice(&out), 0x1234);

        let mut out = Vec::new();
        (-2i32).extend_le(&mut out);
        assert_eq!(i32::from_le_slice(&out), -2);
    }

    #[test]
    fn test_label_range() {
        assert_eq!(u8::try_from_i64(255).unwrap(), 255);
        assert!(u8::try_from_i64(256).is_err());
        assert!(u32::try_from_i64(-1).is_err());
        assert_eq!(i16::try_from_i64(-5).unwrap(), -5);
        assert!(0u16.is_zero());
    }
}
