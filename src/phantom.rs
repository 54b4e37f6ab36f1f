//! Synthetic label/mask pairs for trying the filter without input data

use crate::error::{DissolveError, Result};
use crate::models::{Image, Mask, Region};

/// Parameters for a synthetic phantom
#[derive(Debug, Clone, PartialEq)]
pub struct PhantomSpec {
    /// Image size
    pub size: Vec<usize>,
    /// Label written into the lower half along the last axis
    pub label: u8,
    /// Box covered by the mask
    pub mask_region: Region,
}

impl Default for PhantomSpec {
    fn default() -> Self {
        Self {
            size: vec![128, 128, 128],
            label: 1,
            mask_region: Region {
                index: vec![30, 20, 50],
                size: vec![10, 20, 30],
            },
        }
    }
}

/// Build a label image whose lower half (along the last axis) carries
/// `params.label`, plus a box mask straddling the boundary
pub fn generate(params: &PhantomSpec) -> Result<(Image<u8>, Mask)> {
    if params.size.is_empty() || params.size.iter().any(|&s| s == 0) {
        return Err(DissolveError::geometry(format!(
            "phantom size must be non-empty, got {:?}",
            params.size
        )));
    }

    let mut image = Image::new(params.size.clone());
    let mut lower = image.largest_region();
    let last = lower.dimension() - 1;
    lower.size[last] /= 2;
    if !lower.is_empty() {
        image.fill_region(&lower, params.label)?;
    }

    let mask = Mask::from_region(params.size.clone(), &params.mask_region)?;
    tracing::debug!(
        size = ?params.size,
        mask_pixels = mask.count(),
        "generated phantom"
    );

    Ok((image, mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_phantom() {
        let (image, mask) = generate(&PhantomSpec::default()).unwrap();
        assert_eq!(image.size(), &[128, 128, 128]);
        assert_eq!(image.get(&[0, 0, 63]), Some(1));
        assert_eq!(image.get(&[0, 0, 64]), Some(0));
        assert_eq!(mask.count(), 10 * 20 * 30);
        assert!(mask.contains_index(&[30, 20, 50]));
        assert!(!mask.contains_index(&[40, 20, 50]));
    }

    #[test]
    fn test_small_2d_phantom() {
        let params = PhantomSpec {
            size: vec![8, 6],
            label: 4,
            mask_region: Region::new(vec![2, 1], vec![3, 4]).unwrap(),
        };
        let (image, mask) = generate(&params).unwrap();
        assert_eq!(image.data().iter().filter(|&&p| p == 4).count(), 8 * 3);
        assert_eq!(mask.count(), 12);
    }

    #[test]
    fn test_invalid_size() {
        let params = PhantomSpec {
            size: vec![4, 0],
            ..Default::default()
        };
        assert!(generate(&params).is_err());
    }
}
