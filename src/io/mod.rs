//! Image file input and output

pub mod metaimage;

use std::fmt;
use std::path::Path;

use crate::error::{DissolveError, Result};
use crate::models::{AnyImage, Mask};

/// Supported image file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Single-file MetaImage (.mha)
    Mha,
    /// MetaImage header with a separate data file (.mhd)
    Mhd,
}

impl ImageFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "mha" => Ok(Self::Mha),
            "mhd" => Ok(Self::Mhd),
            _ => Err(DissolveError::UnsupportedFormat(format!(
                "'{}' (expected .mha or .mhd)",
                path.display()
            ))),
        }
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mha => "mha",
            Self::Mhd => "mhd",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Read a label image from disk
pub fn read_image(path: &Path) -> Result<AnyImage> {
    if !path.exists() {
        return Err(DissolveError::file_not_found(path));
    }
    match ImageFormat::from_path(path)? {
        ImageFormat::Mha | ImageFormat::Mhd => metaimage::read(path),
    }
}

/// Read an image from disk and binarize it
pub fn read_mask(path: &Path) -> Result<Mask> {
    Ok(read_image(path)?.to_mask())
}

/// Write a label image to disk
pub fn write_image(path: &Path, image: &AnyImage, compress: bool) -> Result<()> {
    match ImageFormat::from_path(path)? {
        ImageFormat::Mha | ImageFormat::Mhd => metaimage::write(path, image, compress),
    }
}
