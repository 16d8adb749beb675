//! Area resampling with optional SIMD dispatch.
//!
//! Resizing uses box-filter convolution from `fast_image_resize`, which on a
//! downscale averages every source pixel that falls inside a destination
//! pixel (area interpolation). Alpha is resampled as an ordinary channel;
//! premultiplication happens once, later, in [`colorize`](super::colorize).
//!
//! The [`Accelerator`] is a capability object: it is detected once at
//! startup and passed by reference to every pipeline. When it reports
//! available, the resizer runs with the detected CPU extensions (AVX2,
//! SSE4.1, or NEON). Otherwise it runs the portable scalar code. SIMD works
//! on the same buffers as the scalar path, so no copy to separate storage
//! is involved, and both paths produce the same pixels up to rounding.

use fast_image_resize::{CpuExtensions, FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, ImageBuffer, Pixel, imageops};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("area resize to {width}x{height} failed: {reason}")]
    Failed {
        width: u32,
        height: u32,
        reason: String,
    },
    #[error("cannot resize to an empty size {0}x{1}")]
    EmptyTarget(u32, u32),
}

/// Hardware acceleration available to the resizer.
#[derive(Debug, Clone, Copy)]
pub struct Accelerator {
    extensions: Option<CpuExtensions>,
}

impl Accelerator {
    /// Probe the CPU for the best supported SIMD extension set.
    pub fn detect() -> Self {
        let extensions = best_cpu_extensions();
        match extensions {
            Some(ext) => tracing::debug!(extensions = ?ext, "SIMD resize available"),
            None => tracing::debug!("no SIMD extensions detected"),
        }
        Self { extensions }
    }

    /// An accelerator that always reports unavailable.
    pub fn unavailable() -> Self {
        Self { extensions: None }
    }

    pub fn is_available(&self) -> bool {
        self.extensions.is_some()
    }

    fn cpu_extensions(&self) -> CpuExtensions {
        self.extensions.unwrap_or(CpuExtensions::None)
    }
}

impl Default for Accelerator {
    fn default() -> Self {
        Self::detect()
    }
}

#[allow(unreachable_code)]
fn best_cpu_extensions() -> Option<CpuExtensions> {
    #[cfg(target_arch = "x86_64")]
    {
        return [CpuExtensions::Avx2, CpuExtensions::Sse4_1]
            .into_iter()
            .find(|ext| ext.is_supported());
    }
    #[cfg(target_arch = "aarch64")]
    {
        return CpuExtensions::Neon
            .is_supported()
            .then_some(CpuExtensions::Neon);
    }
    None
}

/// Area-resample `image` to exactly `width`x`height`, keeping its color type.
///
/// With `accelerator` set, the resizer uses that accelerator's CPU
/// extensions; with `None` it runs the scalar path.
pub fn resize_area(
    image: &DynamicImage,
    width: u32,
    height: u32,
    accelerator: Option<&Accelerator>,
) -> Result<DynamicImage, ResizeError> {
    if width == 0 || height == 0 {
        return Err(ResizeError::EmptyTarget(width, height));
    }

    let extensions = accelerator
        .map(Accelerator::cpu_extensions)
        .unwrap_or(CpuExtensions::None);

    let mut resizer = Resizer::new();
    // SAFETY: `extensions` is either `None` or a set confirmed by
    // `CpuExtensions::is_supported` during `Accelerator::detect`.
    unsafe { resizer.set_cpu_extensions(extensions) };

    let options = ResizeOptions::new()
        .resize_alg(ResizeAlg::Convolution(FilterType::Box))
        .use_alpha(false);

    let mut dst = DynamicImage::new(width, height, image.color());
    resizer
        .resize(image, &mut dst, Some(&options))
        .map_err(|e| ResizeError::Failed {
            width,
            height,
            reason: e.to_string(),
        })?;
    Ok(dst)
}

/// Extend the canvas to `width`x`height`, keeping existing pixels at the
/// top-left and filling new pixels with zero. No resampling takes place.
pub fn pad_to(image: DynamicImage, width: u32, height: u32) -> DynamicImage {
    fn pad<P: Pixel>(
        src: &ImageBuffer<P, Vec<P::Subpixel>>,
        width: u32,
        height: u32,
    ) -> ImageBuffer<P, Vec<P::Subpixel>> {
        let mut canvas = ImageBuffer::new(width, height);
        imageops::replace(&mut canvas, src, 0, 0);
        canvas
    }

    match image {
        DynamicImage::ImageLuma8(b) => DynamicImage::ImageLuma8(pad(&b, width, height)),
        DynamicImage::ImageLumaA8(b) => DynamicImage::ImageLumaA8(pad(&b, width, height)),
        DynamicImage::ImageRgb8(b) => DynamicImage::ImageRgb8(pad(&b, width, height)),
        DynamicImage::ImageRgba8(b) => DynamicImage::ImageRgba8(pad(&b, width, height)),
        DynamicImage::ImageLuma16(b) => DynamicImage::ImageLuma16(pad(&b, width, height)),
        DynamicImage::ImageLumaA16(b) => DynamicImage::ImageLumaA16(pad(&b, width, height)),
        DynamicImage::ImageRgb16(b) => DynamicImage::ImageRgb16(pad(&b, width, height)),
        DynamicImage::ImageRgba16(b) => DynamicImage::ImageRgba16(pad(&b, width, height)),
        other => DynamicImage::ImageRgba8(pad(&other.to_rgba8(), width, height)),
    }
}
