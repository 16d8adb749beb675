//! Image preparation pipeline.
//!
//! Turns a source file into the pixel buffer a display backend consumes:
//!
//! ```text
//! decode ─→ orientation ─→ [cached? skip : size plan ─→ resize ─→ cache write]
//!        ─→ origin centering ─→ colorize
//! ```
//!
//! Decoding the source is the only stage that can fail the whole run
//! ([`LoadError`]). Every other stage degrades instead: an unreadable
//! orientation tag is ignored, an undecodable cache entry sends the source
//! through the full pipeline, a failed resize keeps the original size, and
//! a failed cache write is logged while the in-memory result is kept.
//!
//! A [`Pipeline`] holds only shared references and the cache location, so
//! one pipeline can prepare many images, and several threads can each run
//! their own.

use crate::cache::ResizeCache;
use crate::config::RenderConfig;
use crate::dimensions::Dimensions;
use crate::imaging::{
    Accelerator, BackendError, ImageBackend, ImageSize, PixelBuffer, SizePlan, colorize,
    normalize_orientation, pad_to, plan_size, resize_area, swaps_axes,
};
use image::{DynamicImage, GenericImageView};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("{} decoded to an empty image", .0.display())]
    Empty(PathBuf),
}

/// Prepares images for one backend configuration.
pub struct Pipeline<'a, B: ImageBackend> {
    backend: &'a B,
    config: &'a RenderConfig,
    accelerator: &'a Accelerator,
    cache: Option<ResizeCache>,
}

impl<'a, B: ImageBackend> Pipeline<'a, B> {
    /// The cache is enabled and located according to `config.cache`.
    pub fn new(backend: &'a B, config: &'a RenderConfig, accelerator: &'a Accelerator) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| ResizeCache::new(config.cache.resolved_dir()));
        Self {
            backend,
            config,
            accelerator,
            cache,
        }
    }

    /// Replace the cache chosen from the config; `None` disables caching.
    pub fn with_cache(mut self, cache: Option<ResizeCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> Option<&ResizeCache> {
        self.cache.as_ref()
    }

    /// Prepare `source`, loading its cached resize instead when one is valid.
    ///
    /// A cache entry that fails to decode is skipped, and the source is
    /// prepared from scratch, which rewrites the entry.
    pub fn open(&self, source: &Path, dims: Dimensions) -> Result<PreparedImage, LoadError> {
        let tag = self.orientation(source);
        if let Some(cached) = self.cached_artifact(source, tag, &dims) {
            // Cache entries are stored upright
            match self.prepare(&cached, source, dims.clone(), None, true) {
                Ok(mut prepared) => {
                    prepared.from_cache = true;
                    return Ok(prepared);
                }
                Err(e) => {
                    tracing::warn!(
                        cache = %cached.display(),
                        error = %e,
                        "cached image unreadable, reprocessing source"
                    );
                }
            }
        }
        self.prepare(source, source, dims, tag, false)
    }

    /// Prepare the image at `path`.
    ///
    /// With `in_cache` set, `path` is taken to be an already-resized cache
    /// artifact and the resize stage is skipped.
    pub fn load(
        &self,
        path: &Path,
        dims: Dimensions,
        in_cache: bool,
    ) -> Result<PreparedImage, LoadError> {
        let tag = self.orientation(path);
        self.prepare(path, path, dims, tag, in_cache)
    }

    /// Orientation tag of `path`; unreadable metadata counts as absent.
    fn orientation(&self, path: &Path) -> Option<u8> {
        self.backend
            .read_orientation(path)
            .inspect_err(|e| {
                tracing::debug!(path = %path.display(), error = %e, "no orientation info");
            })
            .ok()
            .flatten()
    }

    /// Cache file for `source` whose size matches what a fresh resize would produce.
    fn cached_artifact(
        &self,
        source: &Path,
        tag: Option<u8>,
        dims: &Dimensions,
    ) -> Option<PathBuf> {
        let cache = self.cache.as_ref()?;
        let size = self.backend.identify(source).ok()?;
        let upright = if swaps_axes(tag) {
            size.transposed()
        } else {
            size
        };
        match self.plan(upright.as_tuple(), dims) {
            SizePlan::Resize { width, height } => {
                cache.lookup(self.backend, source, ImageSize::new(width, height))
            }
            SizePlan::Keep | SizePlan::Pad { .. } => None,
        }
    }

    fn prepare(
        &self,
        path: &Path,
        source: &Path,
        mut dims: Dimensions,
        tag: Option<u8>,
        in_cache: bool,
    ) -> Result<PreparedImage, LoadError> {
        tracing::info!(path = %path.display(), "loading file");
        let image = self.backend.decode(path).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "could not load image");
            LoadError::Decode {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        if image.width() == 0 || image.height() == 0 {
            tracing::warn!(path = %path.display(), "image is empty");
            return Err(LoadError::Empty(path.to_path_buf()));
        }

        let image = normalize_orientation(image, tag);

        let image = if in_cache {
            tracing::debug!(path = %path.display(), "cached artifact, skipping resize");
            image
        } else {
            self.resize_stage(image, source, &dims)
        };

        let (width, height) = image.dimensions();
        if self.config.origin_center {
            dims.center_on_origin(width, height);
        }

        let pixels = colorize(image, self.config.backend.layout());
        tracing::debug!(
            path = %path.display(),
            width,
            height,
            channels = pixels.channels(),
            backend = %self.config.backend,
            "image prepared"
        );

        Ok(PreparedImage {
            path: path.to_path_buf(),
            source: source.to_path_buf(),
            from_cache: false,
            dimensions: dims,
            pixels,
        })
    }

    fn plan(&self, current: (u32, u32), dims: &Dimensions) -> SizePlan {
        plan_size(
            current,
            dims.max_box(),
            dims.scaler,
            self.config.scale_factor,
            self.config.needs_even_dimensions,
        )
    }

    fn resize_stage(&self, image: DynamicImage, source: &Path, dims: &Dimensions) -> DynamicImage {
        match self.plan(image.dimensions(), dims) {
            SizePlan::Keep => image,
            SizePlan::Pad { width, height } => {
                tracing::debug!(width, height, "padding to even dimensions");
                pad_to(image, width, height)
            }
            SizePlan::Resize { width, height } => {
                debug_assert!(
                    !self.config.needs_even_dimensions || (width % 2 == 0 && height % 2 == 0),
                    "resize target {width}x{height} must be even"
                );
                let Some(resized) = self.resize(&image, width, height) else {
                    return image;
                };
                if let Some(cache) = &self.cache
                    && let Err(e) = cache.store(self.backend, &resized, source)
                {
                    tracing::warn!(source = %source.display(), error = %e, "could not save image to cache");
                }
                resized
            }
        }
    }

    /// Area resize, accelerated when allowed and available. `None` when the
    /// resize failed; the caller keeps the original buffer.
    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> Option<DynamicImage> {
        let accelerator = (self.config.accelerator && self.accelerator.is_available())
            .then_some(self.accelerator);
        tracing::debug!(
            width,
            height,
            accelerated = accelerator.is_some(),
            "resizing"
        );

        resize_area(image, width, height, accelerator)
            .inspect_err(|e| tracing::warn!(error = %e, "resize failed, keeping original size"))
            .ok()
    }
}

/// Pixels ready for a display backend, plus where they came from.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    path: PathBuf,
    source: PathBuf,
    from_cache: bool,
    dimensions: Dimensions,
    pixels: PixelBuffer,
}

impl PreparedImage {
    /// File the pixels were decoded from (the cache file on a cache hit).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File the caller asked for.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    /// Placement, with the origin moved when centering is enabled.
    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn channels(&self) -> u8 {
        self.pixels.channels()
    }

    /// Byte length of [`data`](Self::data).
    pub fn size(&self) -> usize {
        self.pixels.size()
    }

    pub fn data(&self) -> &[u8] {
        self.pixels.data()
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }
}
