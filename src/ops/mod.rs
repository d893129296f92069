//! Pixel-level image operations.
//!
//! Pure functions over [`image::RgbImage`] buffers. Each operation
//! takes its input by reference and returns a freshly allocated output;
//! callers own caching and parameter validation beyond the documented
//! range checks.

pub mod blur;
pub mod color;
pub mod geometry;
pub mod text;
