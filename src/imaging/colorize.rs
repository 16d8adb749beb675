//! Final pixel-format normalization for a display backend.
//!
//! Every decoded buffer ends up as 8-bit interleaved samples in the channel
//! order its backend expects:
//!
//! 1. Reduce to 8 bits per channel (16-bit samples keep their high byte).
//! 2. Premultiply color by alpha on 4-channel data.
//! 3. Expand single-channel gray to 4 channels.
//! 4. Reorder or drop channels for the backend's [`PixelLayout`].
//!
//! | Layout | 3-channel input | 4-channel input |
//! |---|---|---|
//! | `OverlayBgra` | BGRA, alpha 255 | BGRA |
//! | `Kitty` | RGB | RGBA |
//! | `Sixel` | RGB | RGB (alpha dropped) |

use crate::types::PixelLayout;
use image::DynamicImage;
use std::fmt;

/// 8-bit interleaved pixel data ready to hand to a display backend.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Byte length of the pixel data: `width * height * channels`.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Convert `image` into the 8-bit layout expected by `layout`.
pub fn colorize(image: DynamicImage, layout: PixelLayout) -> PixelBuffer {
    let mut buf = to_eight_bit(image);
    if buf.channels == 4 {
        premultiply_alpha(&mut buf.data);
    }
    if buf.channels == 1 {
        buf = expand_gray(buf);
    }
    apply_layout(buf, layout)
}

/// Reduce samples to 8 bits, keeping the channel count where possible.
///
/// Gray+alpha becomes RGBA since no backend accepts two channels.
fn to_eight_bit(image: DynamicImage) -> PixelBuffer {
    fn high_byte(samples: &[u16]) -> Vec<u8> {
        samples.iter().map(|v| (v >> 8) as u8).collect()
    }

    let (width, height) = (image.width(), image.height());

    let (channels, data) = match image {
        DynamicImage::ImageLuma8(b) => (1, b.into_raw()),
        DynamicImage::ImageRgb8(b) => (3, b.into_raw()),
        DynamicImage::ImageRgba8(b) => (4, b.into_raw()),
        DynamicImage::ImageLuma16(b) => (1, high_byte(b.as_raw())),
        DynamicImage::ImageRgb16(b) => (3, high_byte(b.as_raw())),
        DynamicImage::ImageRgba16(b) => (4, high_byte(b.as_raw())),
        other @ DynamicImage::ImageLumaA16(_) => (4, high_byte(other.to_rgba16().as_raw())),
        other if other.color().has_alpha() => (4, other.to_rgba8().into_raw()),
        other => (3, other.to_rgb8().into_raw()),
    };

    PixelBuffer {
        width,
        height,
        channels,
        data,
    }
}

/// Multiply the first three channels of every 4-channel pixel by its alpha.
///
/// Not idempotent: applying it twice darkens partially transparent pixels again.
pub fn premultiply_alpha(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        let alpha = px[3] as u16;
        for c in &mut px[..3] {
            *c = (*c as u16 * alpha / 255) as u8;
        }
    }
}

fn expand_gray(buf: PixelBuffer) -> PixelBuffer {
    let data = buf.data.iter().flat_map(|&g| [g, g, g, 255]).collect();
    PixelBuffer {
        channels: 4,
        data,
        ..buf
    }
}

fn apply_layout(mut buf: PixelBuffer, layout: PixelLayout) -> PixelBuffer {
    match (layout, buf.channels) {
        (PixelLayout::OverlayBgra, 4) => {
            for px in buf.data.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
            buf
        }
        (PixelLayout::OverlayBgra, _) => {
            let data = buf
                .data
                .chunks_exact(3)
                .flat_map(|px| [px[2], px[1], px[0], 255])
                .collect();
            PixelBuffer {
                channels: 4,
                data,
                ..buf
            }
        }
        (PixelLayout::Sixel, 4) => {
            let data = buf
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            PixelBuffer {
                channels: 3,
                data,
                ..buf
            }
        }
        (PixelLayout::Kitty, _) | (PixelLayout::Sixel, _) => buf,
    }
}
