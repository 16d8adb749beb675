//! Closed enumerations shared by the pipeline, the config, and the CLI.
//!
//! Backends are named by string everywhere a user sees them (config file,
//! `--backend` flag), but inside the crate they are a closed enum so the
//! channel-layout table in [`colorize`](crate::imaging::colorize) is a total
//! function with no string matching at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown backend '{0}' (expected one of: x11, wayland, chafa, kitty, sixel)")]
    Backend(String),
    #[error(
        "unknown scaler '{0}' (expected one of: crop, distort, fit_contain, contain, forced_cover, cover)"
    )]
    Scaler(String),
}

/// Terminal graphics transport that will consume the prepared pixels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Child window drawn through the X server.
    #[default]
    X11,
    /// Compositor surface.
    Wayland,
    /// Character-art renderer.
    Chafa,
    /// Kitty graphics protocol.
    Kitty,
    /// DEC sixel graphics.
    Sixel,
}

impl Backend {
    pub const ALL: [Backend; 5] = [
        Backend::X11,
        Backend::Wayland,
        Backend::Chafa,
        Backend::Kitty,
        Backend::Sixel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Backend::X11 => "x11",
            Backend::Wayland => "wayland",
            Backend::Chafa => "chafa",
            Backend::Kitty => "kitty",
            Backend::Sixel => "sixel",
        }
    }

    /// Pixel layout this backend expects in the final buffer.
    pub fn layout(self) -> PixelLayout {
        match self {
            Backend::X11 | Backend::Wayland | Backend::Chafa => PixelLayout::OverlayBgra,
            Backend::Kitty => PixelLayout::Kitty,
            Backend::Sixel => PixelLayout::Sixel,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::Backend(s.to_string()))
    }
}

/// Channel order/count family a backend requires.
///
/// | Layout | 3-channel input | 4-channel input |
/// |---|---|---|
/// | `OverlayBgra` | BGRA (opaque alpha added) | BGRA |
/// | `Kitty` | RGB | RGBA |
/// | `Sixel` | RGB | RGB (alpha dropped) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    OverlayBgra,
    Kitty,
    Sixel,
}

impl PixelLayout {
    pub fn name(self) -> &'static str {
        match self {
            PixelLayout::OverlayBgra => "bgra",
            PixelLayout::Kitty => "kitty",
            PixelLayout::Sixel => "sixel",
        }
    }
}

/// How an image is fitted into the target box.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Scaler {
    /// Never resized; the consumer crops.
    Crop,
    /// Stretched to exactly the box, aspect ratio ignored.
    Distort,
    /// Like `contain`, but also upscales images smaller than the box.
    #[value(name = "fit_contain")]
    FitContain,
    /// Downscaled to fit inside the box, aspect ratio preserved.
    #[default]
    Contain,
    /// Like `cover`, but also applies to images smaller than the box.
    #[value(name = "forced_cover")]
    ForcedCover,
    /// Scaled until the box is covered, aspect ratio preserved.
    Cover,
}

impl Scaler {
    pub const ALL: [Scaler; 6] = [
        Scaler::Crop,
        Scaler::Distort,
        Scaler::FitContain,
        Scaler::Contain,
        Scaler::ForcedCover,
        Scaler::Cover,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scaler::Crop => "crop",
            Scaler::Distort => "distort",
            Scaler::FitContain => "fit_contain",
            Scaler::Contain => "contain",
            Scaler::ForcedCover => "forced_cover",
            Scaler::Cover => "cover",
        }
    }

    /// Scalers that resize even when the image already fits the box.
    pub fn always_scales(self) -> bool {
        matches!(self, Scaler::FitContain | Scaler::ForcedCover)
    }
}

impl fmt::Display for Scaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scaler {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scaler::ALL
            .into_iter()
            .find(|sc| sc.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::Scaler(s.to_string()))
    }
}
