//! # cellpix
//!
//! Prepares images for terminal graphics backends. A source file of any
//! common format becomes an upright, fitted, 8-bit pixel buffer in exactly
//! the channel layout the target backend consumes.
//!
//! # Architecture: One Pipeline per Image
//!
//! ```text
//! decode → orientation → size plan → area resize → cache write
//!        → origin centering → colorize
//! ```
//!
//! Each stage is a plain function over an owned `image::DynamicImage`, so
//! unit tests exercise the policy without touching the filesystem. The
//! [`pipeline`] module sequences them and decides which stages to skip.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Orchestrator: [`Pipeline`](pipeline::Pipeline), [`PreparedImage`](pipeline::PreparedImage), [`LoadError`](pipeline::LoadError) |
//! | [`imaging`] | Stages: codec backend, orientation, size math, resize, colorize |
//! | [`cache`] | Resized-image cache keyed by a hash of the source path |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`dimensions`] | Target box, fitting strategy, cell size, origin |
//! | [`types`] | `Backend`, `PixelLayout`, `Scaler` |
//! | [`sources`] | Input discovery: directory walking, canonical paths |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Closed Backend Set
//!
//! Backends are an enum, and each maps to one of three
//! [`PixelLayout`](types::PixelLayout)s. The colorize step matches on the
//! layout, so adding a backend is a compile error until its layout is chosen.
//!
//! ## Accelerator as a Value
//!
//! SIMD support is probed once into an
//! [`Accelerator`](imaging::Accelerator) and passed by reference to every
//! pipeline. Tests construct `Accelerator::unavailable()` to force the
//! scalar path. Both paths produce the same pixels.
//!
//! ## Cache Without an Index
//!
//! A cached resize lives at a path derived from the source path. Lookup is a
//! file-existence check plus a size check; there is no manifest to corrupt.

pub mod cache;
pub mod config;
pub mod dimensions;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod sources;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
