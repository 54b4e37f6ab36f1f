//! Images whose pixel type is only known at runtime

use super::{ElementType, Image, Mask};

/// A label image of any supported pixel type
#[derive(Debug, Clone, PartialEq)]
pub enum AnyImage {
    /// `u8` labels
    U8(Image<u8>),
    /// `i8` labels
    I8(Image<i8>),
    /// `u16` labels
    U16(Image<u16>),
    /// `i16` labels
    I16(Image<i16>),
    /// `u32` labels
    U32(Image<u32>),
    /// `i32` labels
    I32(Image<i32>),
    /// `u64` labels
    U64(Image<u64>),
    /// `i64` labels
    I64(Image<i64>),
}

/// Run `$body` with `$img` bound to the typed image inside an [`AnyImage`]
#[macro_export]
macro_rules! with_any_image {
    ($any:expr, $img:ident => $body:expr) => {
        match $any {
            $crate::models::AnyImage::U8($img) => $body,
            $crate::models::AnyImage::I8($img) => $body,
            $crate::models::AnyImage::U16($img) => $body,
            $crate::models::AnyImage::I16($img) => $body,
            $crate::models::AnyImage::U32($img) => $body,
            $crate::models::AnyImage::I32($img) => $body,
            $crate::models::AnyImage::U64($img) => $body,
            $crate::models::AnyImage::I64($img) => $body,
        }
    };
}

impl AnyImage {
    /// Pixel type of the wrapped image
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::U8(_) => ElementType::UChar,
            Self::I8(_) => ElementType::Char,
            Self::U16(_) => ElementType::UShort,
            Self::I16(_) => ElementType::Short,
            Self::U32(_) => ElementType::UInt,
            Self::I32(_) => ElementType::Int,
            Self::U64(_) => ElementType::ULongLong,
            Self::I64(_) => ElementType::LongLong,
        }
    }

    /// Extent along each axis
    pub fn size(&self) -> &[usize] {
        with_any_image!(self, img => img.size())
    }

    /// Physical spacing
    pub fn spacing(&self) -> &[f64] {
        with_any_image!(self, img => img.spacing())
    }

    /// Physical origin
    pub fn origin(&self) -> &[f64] {
        with_any_image!(self, img => img.origin())
    }

    /// Binarize into a mask
    pub fn to_mask(&self) -> Mask {
        with_any_image!(self, img => Mask::from_image(img))
    }
}

macro_rules! impl_from_image {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Image<$ty>> for AnyImage {
                fn from(image: Image<$ty>) -> Self {
                    AnyImage::$variant(image)
                }
            }
        )*
    };
}

impl_from_image! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch() {
        let image = Image::from_vec(vec![2, 2], vec![0i16, 3, 0, -1]).unwrap();
        let any: AnyImage = image.into();
        assert_eq!(any.element_type(), ElementType::Short);
        assert_eq!(any.size(), &[2, 2]);
        assert_eq!(any.to_mask().count(), 2);

        let total = with_any_image!(&any, img => img.len());
        assert_eq!(total, 4);
    }
}
