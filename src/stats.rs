//! Label statistics

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Image, LabelPixel, Mask};

/// Label histogram of an image, optionally split by a mask
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabelStats {
    /// Total pixel count
    pub total_pixels: usize,
    /// Number of pixels inside the mask
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_pixels: Option<usize>,
    /// Pixel count per label, keyed by the label's decimal form
    pub labels: BTreeMap<String, usize>,
    /// Pixel count per label inside the mask
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_labels: Option<BTreeMap<String, usize>>,
}

impl LabelStats {
    /// Compute the histogram
    pub fn compute<T: LabelPixel>(image: &Image<T>, mask: Option<&Mask>) -> Self {
        let mut counts: BTreeMap<T, usize> = BTreeMap::new();
        let mut masked: BTreeMap<T, usize> = BTreeMap::new();

        for (offset, &label) in image.data().iter().enumerate() {
            *counts.entry(label).or_default() += 1;
            if mask.map_or(false, |m| m.contains(offset)) {
                *masked.entry(label).or_default() += 1;
            }
        }

        let stringify = |map: BTreeMap<T, usize>| {
            map.into_iter()
                .map(|(label, count)| (label.to_string(), count))
                .collect::<BTreeMap<_, _>>()
        };

        Self {
            total_pixels: image.len(),
            mask_pixels: mask.map(Mask::count),
            labels: stringify(counts),
            masked_labels: mask.map(|_| stringify(masked)),
        }
    }

    /// Number of distinct labels
    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram() {
        let image = Image::from_vec(vec![3, 2], vec![0i16, 5, 5, -1, 0, 0]).unwrap();
        let stats = LabelStats::compute(&image, None);
        assert_eq!(stats.total_pixels, 6);
        assert_eq!(stats.num_labels(), 3);
        assert_eq!(stats.labels["0"], 3);
        assert_eq!(stats.labels["5"], 2);
        assert_eq!(stats.labels["-1"], 1);
        assert!(stats.masked_labels.is_none());
    }

    #[test]
    fn test_masked_histogram() {
        let image = Image::from_vec(vec![4], vec![1u8, 2, 2, 3]).unwrap();
        let mask = Mask::from_image(&Image::from_vec(vec![4], vec![0u8, 1, 1, 0]).unwrap());
        let stats = LabelStats::compute(&image, Some(&mask));
        assert_eq!(stats.mask_pixels, Some(2));
        assert_eq!(stats.masked_labels.unwrap()["2"], 2);
    }
}
