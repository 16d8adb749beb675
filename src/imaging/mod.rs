//! Image processing stages.
//!
//! | Stage | Module | Crate / function |
//! |---|---|---|
//! | **Decode / encode** | [`rust_backend`] | `image::ImageReader`, `DynamicImage::save` |
//! | **Orientation** | [`orientation`] | `ImageDecoder::orientation`, `DynamicImage::apply_orientation` |
//! | **Size** | [`calculations`] | pure math |
//! | **Resize** | [`resize`] | `fast_image_resize` box convolution |
//! | **Colorize** | [`colorize`] | pure byte shuffling |
//!
//! The module is split into:
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Transforms**: orientation, resize, and colorize on decoded buffers

pub mod backend;
pub mod calculations;
pub mod colorize;
pub mod orientation;
pub mod resize;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, ImageSize};
pub use calculations::{SizePlan, plan_size, resolve_size, round_up};
pub use colorize::{PixelBuffer, colorize};
pub use orientation::{normalize_orientation, swaps_axes};
pub use resize::{Accelerator, ResizeError, pad_to, resize_area};
pub use rust_backend::{RustBackend, is_supported_image, supported_input_extensions};
