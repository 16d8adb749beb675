//! CLI output formatting for prepared images.
//!
//! # Output Format
//!
//! ## Text
//!
//! ```text
//! 001 dawn.jpg
//!     Source: photos/dawn.jpg
//!     Pixels: 100x50, 4 channels, 20000 bytes (x11, bgra)
//!     Origin: 3,2
//!     Cache: ~/.cache/cellpix/5f0c….png
//! 002 broken.png
//!     Error: cannot decode photos/broken.png: Decode failed: …
//!
//! 1 prepared, 1 failed. Cache: 1 cached, 0 processed (1 total)
//! ```
//!
//! ## JSON
//!
//! One [`PreparedSummary`] object per line with `--json`.
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::cache::CacheStats;
use crate::pipeline::PreparedImage;
use crate::types::Backend;
use serde::Serialize;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Text lines for one successfully prepared image.
pub fn format_prepared(index: usize, image: &PreparedImage, backend: Backend) -> Vec<String> {
    let dims = image.dimensions();
    let mut lines = vec![
        format!("{} {}", format_index(index), file_name(image.source())),
        format!("{}Source: {}", indent(1), image.source().display()),
        format!(
            "{}Pixels: {}x{}, {} channels, {} bytes ({}, {})",
            indent(1),
            image.width(),
            image.height(),
            image.channels(),
            image.size(),
            backend,
            backend.layout().name()
        ),
        format!("{}Origin: {},{}", indent(1), dims.x, dims.y),
    ];
    if image.from_cache() {
        lines.push(format!("{}Cache: {}", indent(1), image.path().display()));
    }
    lines
}

/// Text lines for an image that could not be prepared.
pub fn format_failure(index: usize, source: &Path, error: &dyn std::error::Error) -> Vec<String> {
    vec![
        format!("{} {}", format_index(index), file_name(source)),
        format!("{}Error: {}", indent(1), error),
    ]
}

/// Closing line of a batch.
pub fn format_totals(prepared: usize, failed: usize, stats: &CacheStats) -> String {
    let mut line = format!("{} prepared", prepared);
    if failed > 0 {
        line.push_str(&format!(", {} failed", failed));
    }
    line.push_str(&format!(". Cache: {}", stats));
    line
}

/// Machine-readable description of a prepared image, emitted with `--json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedSummary {
    pub source: String,
    pub loaded_from: String,
    pub from_cache: bool,
    pub backend: Backend,
    pub layout: &'static str,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub size: usize,
    pub x: i32,
    pub y: i32,
}

impl PreparedSummary {
    pub fn new(image: &PreparedImage, backend: Backend) -> Self {
        Self {
            source: image.source().display().to_string(),
            loaded_from: image.path().display().to_string(),
            from_cache: image.from_cache(),
            backend,
            layout: backend.layout().name(),
            width: image.width(),
            height: image.height(),
            channels: image.channels(),
            size: image.size(),
            x: image.dimensions().x,
            y: image.dimensions().y,
        }
    }
}

/// Single-line JSON for one prepared image.
pub fn format_json(image: &PreparedImage, backend: Backend) -> Result<String, serde_json::Error> {
    serde_json::to_string(&PreparedSummary::new(image, backend))
}

pub fn print_prepared(index: usize, image: &PreparedImage, backend: Backend) {
    for line in format_prepared(index, image, backend) {
        println!("{}", line);
    }
}

pub fn print_failure(index: usize, source: &Path, error: &dyn std::error::Error) {
    for line in format_failure(index, source, error) {
        println!("{}", line);
    }
}
