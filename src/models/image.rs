//! Dense N-dimensional images

use crate::error::{DissolveError, Result};

use super::Region;

/// A dense image with physical spacing and origin.
///
/// Pixels are stored with the first axis varying fastest, the same layout
/// MetaImage uses on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    size: Vec<usize>,
    spacing: Vec<f64>,
    origin: Vec<f64>,
    data: Vec<T>,
}

impl<T: Copy + Default> Image<T> {
    /// Create an image filled with the default pixel value
    pub fn new(size: Vec<usize>) -> Self {
        let len = size.iter().product();
        Self {
            spacing: vec![1.0; size.len()],
            origin: vec![0.0; size.len()],
            data: vec![T::default(); len],
            size,
        }
    }
}

impl<T: Copy> Image<T> {
    /// Wrap existing pixel data
    pub fn from_vec(size: Vec<usize>, data: Vec<T>) -> Result<Self> {
        let expected: usize = size.iter().product();
        if data.len() != expected {
            return Err(DissolveError::geometry(format!(
                "size {:?} needs {} pixels, got {}",
                size,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            spacing: vec![1.0; size.len()],
            origin: vec![0.0; size.len()],
            size,
            data,
        })
    }

    /// Set the physical spacing between pixel centers
    pub fn with_spacing(mut self, spacing: Vec<f64>) -> Result<Self> {
        if spacing.len() != self.dimension() {
            return Err(DissolveError::geometry(format!(
                "spacing has {} values for a {}-D image",
                spacing.len(),
                self.dimension()
            )));
        }
        if let Some(bad) = spacing.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(DissolveError::geometry(format!(
                "spacing must be positive, got {}",
                bad
            )));
        }
        self.spacing = spacing;
        Ok(self)
    }

    /// Set the physical position of the first pixel
    pub fn with_origin(mut self, origin: Vec<f64>) -> Result<Self> {
        if origin.len() != self.dimension() {
            return Err(DissolveError::geometry(format!(
                "origin has {} values for a {}-D image",
                origin.len(),
                self.dimension()
            )));
        }
        self.origin = origin;
        Ok(self)
    }

    /// Number of axes
    pub fn dimension(&self) -> usize {
        self.size.len()
    }

    /// Extent along each axis
    pub fn size(&self) -> &[usize] {
        &self.size
    }

    /// Physical spacing along each axis
    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    /// Physical origin
    pub fn origin(&self) -> &[f64] {
        &self.origin
    }

    /// Raw pixel buffer
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable raw pixel buffer
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the image has no pixels
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The region covering the whole image
    pub fn largest_region(&self) -> Region {
        Region::from_size(&self.size)
    }

    /// Linear offset of one step along each axis
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = Vec::with_capacity(self.dimension());
        let mut stride = 1;
        for &s in &self.size {
            strides.push(stride);
            stride *= s;
        }
        strides
    }

    /// Buffer position of `idx`, or `None` if it lies outside the image
    pub fn linear_index(&self, idx: &[i64]) -> Option<usize> {
        if idx.len() != self.dimension() {
            return None;
        }
        let mut offset = 0;
        let mut stride = 1;
        for (&i, &s) in idx.iter().zip(&self.size) {
            if i < 0 || i as usize >= s {
                return None;
            }
            offset += i as usize * stride;
            stride *= s;
        }
        Some(offset)
    }

    /// Pixel value at `idx`
    pub fn get(&self, idx: &[i64]) -> Option<T> {
        self.linear_index(idx).map(|i| self.data[i])
    }

    /// Set the pixel at `idx`, returning false when outside the image
    pub fn set(&mut self, idx: &[i64], value: T) -> bool {
        match self.linear_index(idx) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }

    /// Set every pixel
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|p| *p = value);
    }

    /// Set every pixel inside `region`
    pub fn fill_region(&mut self, region: &Region, value: T) -> Result<()> {
        let region = region.crop(&self.largest_region())?;
        for idx in region.indices() {
            self.set(&idx, value);
        }
        Ok(())
    }

    /// Apply `f` to every pixel, keeping the geometry
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Image<U> {
        Image {
            size: self.size.clone(),
            spacing: self.spacing.clone(),
            origin: self.origin.clone(),
            data: self.data.iter().map(|&p| f(p)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_index() {
        let image: Image<u8> = Image::new(vec![4, 3, 2]);
        assert_eq!(image.len(), 24);
        assert_eq!(image.strides(), vec![1, 4, 12]);
        assert_eq!(image.linear_index(&[0, 0, 0]), Some(0));
        assert_eq!(image.linear_index(&[1, 2, 1]), Some(1 + 8 + 12));
        assert_eq!(image.linear_index(&[4, 0, 0]), None);
        assert_eq!(image.linear_index(&[-1, 0, 0]), None);
        assert_eq!(image.linear_index(&[0, 0]), None);
    }

    #[test]
    fn test_get_set_fill() {
        let mut image: Image<u16> = Image::new(vec![5, 5]);
        assert!(image.set(&[2, 3], 7));
        assert!(!image.set(&[5, 0], 7));
        assert_eq!(image.get(&[2, 3]), Some(7));

        let region = Region::new(vec![3, 3], vec![5, 5]).unwrap();
        image.fill_region(&region, 9).unwrap();
        assert_eq!(image.data().iter().filter(|&&p| p == 9).count(), 4);

        image.fill(1);
        assert!(image.data().iter().all(|&p| p == 1));
    }

    #[test]
    fn test_geometry_validation() {
        assert!(Image::from_vec(vec![2, 2], vec![0u8; 3]).is_err());

        let image = Image::from_vec(vec![2, 2], vec![0u8; 4]).unwrap();
        assert!(image.clone().with_spacing(vec![1.0]).is_err());
        assert!(image.clone().with_spacing(vec![1.0, 0.0]).is_err());
        assert!(image.clone().with_spacing(vec![1.0, f64::NAN]).is_err());

        let image = image.with_spacing(vec![0.5, 2.0]).unwrap();
        assert_eq!(image.spacing(), &[0.5, 2.0]);
    }
}
