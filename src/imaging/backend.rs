//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between the pipeline policy and the
//! pixel library: identify, read_orientation, decode, and encode. Resizing and
//! color conversion are not part of the trait; they operate on decoded
//! buffers in [`resize`](super::resize) and [`colorize`](super::colorize).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the
//! `MockBackend` below, which records every call.

use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel size reported by an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Trait for image codec backends.
pub trait ImageBackend: Sync {
    /// Read pixel dimensions without a full decode.
    fn identify(&self, path: &Path) -> Result<ImageSize, BackendError>;

    /// Raw EXIF orientation tag (1..=8), or `None` when absent.
    fn read_orientation(&self, path: &Path) -> Result<Option<u8>, BackendError>;

    /// Decode the file into a pixel buffer, keeping its channel count and depth.
    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Encode a buffer to `path`; the format follows the extension.
    fn encode(&self, image: &DynamicImage, path: &Path) -> Result<(), BackendError>;
}
