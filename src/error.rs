//! Error types for dissolve

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dissolve operations
#[derive(Error, Debug)]
pub enum DissolveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid image header: {0}")]
    InvalidHeader(String),

    #[error("Unsupported pixel type: {0}")]
    UnsupportedPixelType(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Image data truncated: expected {expected} bytes, found {found}")]
    TruncatedData { expected: usize, found: usize },

    #[error("Invalid image geometry: {0}")]
    InvalidGeometry(String),

    #[error("Image and mask sizes differ: image {image:?}, mask {mask:?}")]
    SizeMismatch { image: Vec<usize>, mask: Vec<usize> },

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Label value {value} does not fit in {pixel_type}")]
    LabelOutOfRange { value: i64, pixel_type: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for dissolve operations
pub type Result<T> = std::result::Result<T, DissolveError>;

impl DissolveError {
    /// Create a new header error
    pub fn header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }

    /// Create a new geometry error
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// Create a new region error
    pub fn region(msg: impl Into<String>) -> Self {
        Self::InvalidRegion(msg.into())
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}
