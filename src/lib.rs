#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod io;
pub mod models;
pub mod phantom;
pub mod progress;
pub mod stats;

use std::path::Path;
use std::sync::Arc;

// Re-export commonly used types
pub use error::{DissolveError, Result};
pub use filter::{DissolveMaskFilter, DissolveOutput, DissolveSummary};
pub use models::{AnyImage, ElementType, Image, LabelPixel, Mask, Region};
pub use progress::ProgressObserver;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Options for the runtime-typed entry points
#[derive(Clone)]
pub struct DissolveOptions {
    /// Background label; must fit the image's pixel type
    pub background: i64,
    /// Region to process; the whole image when `None`
    pub region: Option<Region>,
    /// Compress written output
    pub compress: bool,
    /// Maximum number of progress updates
    pub progress_updates: usize,
    /// Progress observer
    pub observer: Option<Arc<dyn ProgressObserver>>,
}

impl Default for DissolveOptions {
    fn default() -> Self {
        Self {
            background: 0,
            region: None,
            compress: true,
            progress_updates: progress::ProgressReporter::DEFAULT_UPDATES,
            observer: None,
        }
    }
}

/// Dissolve a runtime-typed image
///
/// # Arguments
///
/// * `image` - Label image of any supported pixel type
/// * `mask` - Mask of the same size
/// * `options` - Filter settings
///
/// # Returns
///
/// The dissolved image, with the input's pixel type, and run counters
pub fn dissolve_image(
    image: &AnyImage,
    mask: &Mask,
    options: &DissolveOptions,
) -> Result<(AnyImage, DissolveSummary)> {
    crate::with_any_image!(image, img => {
        let output = run_typed(img, mask, options)?;
        Ok((output.image.into(), output.summary))
    })
}

fn run_typed<T: LabelPixel>(
    image: &Image<T>,
    mask: &Mask,
    options: &DissolveOptions,
) -> Result<DissolveOutput<T>> {
    let mut filter = DissolveMaskFilter::new()
        .with_background(T::try_from_i64(options.background)?)
        .with_progress_updates(options.progress_updates);
    if let Some(region) = &options.region {
        filter = filter.with_region(region.clone());
    }
    if let Some(observer) = &options.observer {
        filter = filter.with_observer(observer.clone());
    }
    tracing::debug!("{}", filter);
    filter.apply(image, mask)
}

/// Read `input`, dissolve it under `mask` and write the result to `output`
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// let mask = dissolve::io::read_mask(Path::new("mask.mha"))?;
/// let summary = dissolve::dissolve_file(
///     Path::new("labels.mha"),
///     &mask,
///     Path::new("labels_dissolved.mha"),
///     &dissolve::DissolveOptions::default(),
/// )?;
/// println!("{} pixels changed", summary.pixels_changed);
/// # Ok::<(), dissolve::DissolveError>(())
/// ```
pub fn dissolve_file(
    input: &Path,
    mask: &Mask,
    output: &Path,
    options: &DissolveOptions,
) -> Result<DissolveSummary> {
    let image = io::read_image(input)?;
    tracing::info!(
        input = %input.display(),
        size = ?image.size(),
        element_type = %image.element_type(),
        "dissolving"
    );

    let (dissolved, summary) = dissolve_image(&image, mask, options)?;
    io::write_image(output, &dissolved, options.compress)?;

    tracing::info!(
        output = %output.display(),
        changed = summary.pixels_changed,
        "wrote dissolved image"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.split('.').all(|part| part.parse::<u32>().is_ok()));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "dissolve");
    }

    #[test]
    fn test_dissolve_image_keeps_pixel_type() {
        let image = Image::from_vec(vec![5, 3], vec![
            4i32, 4, 4, 8, 8,
            4, -9, -9, -9, 8,
            4, 4, 8, 8, 8,
        ])
        .unwrap();
        let mask = Mask::from_image(&image.map(|p| u8::from(p == -9)));

        let (output, summary) = dissolve_image(&image.into(), &mask, &DissolveOptions::default()).unwrap();
        assert_eq!(summary.pixels_dissolved, 3);
        match output {
            AnyImage::I32(out) => {
                assert_eq!(out.get(&[1, 1]), Some(4));
                assert_eq!(out.get(&[3, 1]), Some(8));
                assert!(out.data().iter().all(|&p| p != -9));
            }
            other => panic!("unexpected pixel type {:?}", other.element_type()),
        }
    }

    #[test]
    fn test_background_out_of_range() {
        let image: AnyImage = Image::<u8>::new(vec![2, 2]).into();
        let mask = Mask::empty(vec![2, 2]);
        let options = DissolveOptions {
            background: 300,
            ..Default::default()
        };
        assert!(matches!(
            dissolve_image(&image, &mask, &options),
            Err(DissolveError::LabelOutOfRange { value: 300, .. })
        ));
    }

    #[test]
    fn test_dissolve_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mhd");
        let output = dir.path().join("out.mha");

        let image = Image::from_vec(vec![4, 1], vec![2u16, 0, 0, 2])
            .unwrap()
            .with_spacing(vec![0.3, 0.3])
            .unwrap();
        io::write_image(&input, &image.clone().into(), false).unwrap();

        let mask = Mask::from_image(&Image::from_vec(vec![4, 1], vec![0u8, 1, 1, 0]).unwrap());
        let summary = dissolve_file(&input, &mask, &output, &DissolveOptions::default()).unwrap();
        assert_eq!(summary.pixels_dissolved, 2);

        match io::read_image(&output).unwrap() {
            AnyImage::U16(out) => {
                assert_eq!(out.spacing(), &[0.3, 0.3]);
                assert_eq!(out.data().len(), 4);
            }
            other => panic!("unexpected pixel type {:?}", other.element_type()),
        }
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let mask = Mask::empty(vec![1, 1]);
        let err = dissolve_file(
            &dir.path().join("missing.mha"),
            &mask,
            &dir.path().join("out.mha"),
            &DissolveOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DissolveError::FileNotFound { .. }));
    }
}
