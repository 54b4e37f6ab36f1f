//! Binary masks

use rayon::prelude::*;

use crate::error::{DissolveError, Result};

use super::{Image, LabelPixel, Region};

/// A binary mask. Any non-zero source pixel is inside.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    image: Image<bool>,
}

impl Mask {
    /// Binarize a label image
    pub fn from_image<T: LabelPixel>(image: &Image<T>) -> Self {
        Self {
            image: image.map(|p| !p.is_zero()),
        }
    }

    /// Create an empty mask of the given size
    pub fn empty(size: Vec<usize>) -> Self {
        Self {
            image: Image::new(size),
        }
    }

    /// Create a mask that is set inside `region`
    pub fn from_region(size: Vec<usize>, region: &Region) -> Result<Self> {
        let mut image = Image::new(size);
        image.fill_region(region, true)?;
        Ok(Self { image })
    }

    /// Extent along each axis
    pub fn size(&self) -> &[usize] {
        self.image.size()
    }

    /// Check the pixel at buffer position `offset`
    #[inline]
    pub fn contains(&self, offset: usize) -> bool {
        self.image.data()[offset]
    }

    /// Check the pixel at `idx`; out-of-bounds indices are outside
    pub fn contains_index(&self, idx: &[i64]) -> bool {
        self.image.get(idx).unwrap_or(false)
    }

    /// Number of pixels inside the mask
    pub fn count(&self) -> usize {
        self.image.data().par_iter().filter(|&&p| p).count()
    }

    /// Number of mask pixels inside `region`
    pub fn count_in(&self, region: &Region) -> usize {
        if *region == self.image.largest_region() {
            return self.count();
        }
        region
            .indices()
            .filter(|idx| self.contains_index(idx))
            .count()
    }

    /// Check that the mask covers an image of size `size`
    pub fn check_size(&self, size: &[usize]) -> Result<()> {
        if self.size() != size {
            return Err(DissolveError::SizeMismatch {
                image: size.to_vec(),
                mask: self.size().to_vec(),
            });
        }
        Ok(())
    }

    /// Render as a 0/1 label image
    pub fn to_image<T: LabelPixel>(&self, inside: T) -> Image<T> {
        self.image.map(|p| if p { inside } else { T::default() })
    }
}
