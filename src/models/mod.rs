//! Data models for label images

mod any;
mod image;
mod mask;
mod pixel;
mod region;

pub use any::*;
pub use image::*;
pub use mask::*;
pub use pixel::*;
pub use region::*;
