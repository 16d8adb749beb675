//! Shared test utilities for the cellpix test suite.
//!
//! Provides synthetic images, on-disk fixtures in temp directories, and
//! ready-made configs for pipeline tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let path = write_png(tmp.path(), "photo.png", &rgb_gradient(200, 100));
//! let dims = box_dims(100, 100);
//! ```

use crate::config::RenderConfig;
use crate::dimensions::{CellSize, Dimensions};
use crate::types::Scaler;
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

// =========================================================================
// Synthetic images
// =========================================================================

/// RGB image whose channels vary with position, so resampling and
/// reordering bugs show up as value differences.
pub fn rgb_gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
        ])
    }))
}

/// RGBA gradient with alpha varying along the diagonal.
pub fn rgba_gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x * 7 + y * 3) % 256) as u8,
            (128 + (x + y) % 128) as u8,
        ])
    }))
}

// =========================================================================
// Fixtures
// =========================================================================

/// Save `image` as a PNG named `name` inside `dir`.
pub fn write_png(dir: &Path, name: &str, image: &DynamicImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

// =========================================================================
// Config and geometry
// =========================================================================

/// Defaults with the cache disabled, so no test writes to the user's cache dir.
pub fn test_config() -> RenderConfig {
    let mut config = RenderConfig::default();
    config.cache.enabled = false;
    config
}

/// Origin (0, 0), `contain`, 8x16 cells, target box in pixels.
pub fn box_dims(max_width: u32, max_height: u32) -> Dimensions {
    Dimensions::new(
        0,
        0,
        max_width,
        max_height,
        Scaler::Contain,
        CellSize::default(),
    )
}
