//! Render configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user config file overrides any subset of keys.
//!
//! ## Config File Location
//!
//! 1. `--config FILE` on the command line
//! 2. `$XDG_CONFIG_HOME/cellpix/config.toml`
//! 3. `~/.config/cellpix/config.toml`
//!
//! A missing file means stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! backend = "x11"               # x11 | wayland | chafa | kitty | sixel
//! scale_factor = 1              # resize targets are rounded up to multiples of this
//! needs_even_dimensions = false # round odd sizes up to even
//! origin_center = false         # center the image on its origin
//! accelerator = true            # allow SIMD resize dispatch
//!
//! [cache]
//! enabled = true
//! # dir = "/path/to/cache"      # default: $XDG_CACHE_HOME/cellpix
//!
//! [terminal]
//! font_width = 8                # cell width in pixels
//! font_height = 16              # cell height in pixels
//! scaler = "contain"            # crop | distort | fit_contain | contain | forced_cover | cover
//!
//! [processing]
//! max_threads = 4               # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::dimensions::CellSize;
use crate::types::{Backend, Scaler};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file inside a config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings that drive image preparation.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Display backend that consumes the prepared pixels.
    pub backend: Backend,
    /// Resize targets are rounded up to a multiple of this.
    pub scale_factor: u32,
    /// Force even width and height (chroma-subsampling consumers).
    pub needs_even_dimensions: bool,
    /// Move the origin so the image is centered on it.
    pub origin_center: bool,
    /// Allow SIMD resize dispatch when the CPU supports it.
    pub accelerator: bool,
    pub cache: CacheConfig,
    pub terminal: TerminalConfig,
    pub processing: ProcessingConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            scale_factor: 1,
            needs_even_dimensions: false,
            origin_center: false,
            accelerator: true,
            cache: CacheConfig::default(),
            terminal: TerminalConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scale_factor == 0 {
            return Err(ConfigError::Validation(
                "scale_factor must be at least 1".into(),
            ));
        }
        if self.terminal.font_width == 0 || self.terminal.font_height == 0 {
            return Err(ConfigError::Validation(
                "terminal.font_width and terminal.font_height must be non-zero".into(),
            ));
        }
        if self.processing.max_threads == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Resize cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Cache directory. `None` uses [`default_cache_dir`](crate::cache::default_cache_dir).
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl CacheConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(crate::cache::default_cache_dir)
    }
}

/// Terminal geometry defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerminalConfig {
    pub font_width: u32,
    pub font_height: u32,
    pub scaler: Scaler,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        let cell = CellSize::default();
        Self {
            font_width: cell.width,
            font_height: cell.height,
            scaler: Scaler::default(),
        }
    }
}

impl TerminalConfig {
    pub fn cell(&self) -> CellSize {
        CellSize::new(self.font_width, self.font_height)
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_threads.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(RenderConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<RenderConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: RenderConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a config file. A missing file yields stock defaults; invalid TOML,
/// unknown keys, and out-of-range values are errors.
pub fn load_config_file(path: &Path) -> Result<RenderConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Load `config.toml` from the given directory.
pub fn load_config(dir: &Path) -> Result<RenderConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILENAME))
}

/// Default config directory: `$XDG_CONFIG_HOME/cellpix`, else `~/.config/cellpix`.
pub fn default_config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .filter(|v| !v.is_empty())
                .map(|home| PathBuf::from(home).join(".config"))
        })
        .map(|base| base.join("cellpix"))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# cellpix configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Location: $XDG_CONFIG_HOME/cellpix/config.toml (or pass --config FILE).
# Unknown keys will cause an error.

# Display backend that consumes the prepared pixels.
#   x11, wayland, chafa -> BGRA with premultiplied alpha
#   kitty               -> RGB or RGBA
#   sixel               -> RGB
backend = "x11"

# Resize targets are rounded up to a multiple of this (HiDPI output).
scale_factor = 1

# Round odd widths and heights up to even values. Needed by consumers that
# subsample chroma in 2x2 blocks.
needs_even_dimensions = false

# Move the origin so the image is centered on it instead of anchored at
# its top-left corner.
origin_center = false

# Use SIMD (AVX2, SSE4.1, NEON) for resizing when the CPU supports it.
# Output is the same either way.
accelerator = true

# ---------------------------------------------------------------------------
# Resize cache
# ---------------------------------------------------------------------------
[cache]
# Keep resized images so the next display skips the resize.
enabled = true

# Where cached images live. Default: $XDG_CACHE_HOME/cellpix
# dir = "/home/me/.cache/cellpix"

# ---------------------------------------------------------------------------
# Terminal geometry
# ---------------------------------------------------------------------------
[terminal]
# Size of one character cell in pixels.
font_width = 8
font_height = 16

# How images are fitted into the target box:
#   crop         - never resized
#   distort      - stretched to the box
#   fit_contain  - fit inside the box, upscaling small images
#   contain      - fit inside the box, only downscaling
#   forced_cover - cover the box, upscaling small images
#   cover        - cover the box, only downscaling
scaler = "contain"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers when preparing several images.
# Omit to use all CPU cores. Values above the core count are clamped.
# max_threads = 4
"##
}
