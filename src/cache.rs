//! On-disk cache of resized images.
//!
//! Decoding and area-resampling a large photo for every display is the
//! expensive part of preparing an image. This module keeps the resized
//! result so that the next display of the same source only decodes a small
//! file.
//!
//! # Design
//!
//! There is no index. The cache file's existence at a path derived from the
//! source path is the lookup:
//!
//! ```text
//! <cache_dir>/<sha256-hex(source path)>.png
//! ```
//!
//! - **Path derivation** is pure: [`ResizeCache::path_for`] hashes the path
//!   string and touches no filesystem. Distinct source paths map to
//!   distinct files.
//! - **PNG** is used for every source format, so a cached artifact decodes
//!   to exactly the pixels that were written.
//! - **Validation**: a hit also requires the cached file's pixel size to
//!   match the size the caller would resize to now. When the terminal
//!   geometry changes, the old entry is ignored and overwritten.
//!
//! Writes are best-effort. A failed write is reported to the caller, which
//! logs it and carries on with the in-memory result.
//!
//! An entry is encoded into a temporary file in the cache directory and
//! renamed over its final path, so readers never see a partly written file.
//! Two processes preparing the same source with the same settings write the
//! same bytes; whichever rename lands last wins.

use crate::imaging::{BackendError, ImageBackend, ImageSize};
use image::DynamicImage;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extension of every cache file.
const CACHE_EXTENSION: &str = "png";

#[derive(Error, Debug)]
pub enum CacheWriteError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot write cache file: {0}")]
    Encode(#[from] BackendError),
}

/// Resized-image cache rooted at a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeCache {
    dir: PathBuf,
}

impl ResizeCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache file location for `source`. Deterministic, no filesystem access.
    pub fn path_for(&self, source: &Path) -> PathBuf {
        self.dir
            .join(format!("{}.{}", hash_path(source), CACHE_EXTENSION))
    }

    /// Cache file for `source` if it exists and holds an image of `expected` size.
    pub fn lookup<B: ImageBackend>(
        &self,
        backend: &B,
        source: &Path,
        expected: ImageSize,
    ) -> Option<PathBuf> {
        let path = self.path_for(source);
        if !path.is_file() {
            return None;
        }
        match backend.identify(&path) {
            Ok(size) if size == expected => {
                tracing::debug!(cache = %path.display(), "cache hit");
                Some(path)
            }
            Ok(size) => {
                tracing::debug!(
                    cache = %path.display(),
                    cached = ?size.as_tuple(),
                    expected = ?expected.as_tuple(),
                    "stale cache entry"
                );
                None
            }
            Err(e) => {
                tracing::debug!(cache = %path.display(), error = %e, "unreadable cache entry");
                None
            }
        }
    }

    /// Write `image` as the cache entry for `source`.
    pub fn store<B: ImageBackend>(
        &self,
        backend: &B,
        image: &DynamicImage,
        source: &Path,
    ) -> Result<PathBuf, CacheWriteError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(source);
        // Same directory as the entry, so the rename never crosses filesystems
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .suffix(&format!(".{CACHE_EXTENSION}"))
            .tempfile_in(&self.dir)?;
        backend.encode(image, staging.path())?;
        staging.persist(&path).map_err(|e| e.error)?;
        tracing::debug!(cache = %path.display(), "cache written");
        Ok(path)
    }
}

/// SHA-256 of a path's string form, returned as a hex string.
pub fn hash_path(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    format!("{:x}", digest)
}

/// Default cache directory: `$XDG_CACHE_HOME/cellpix`, then
/// `~/.cache/cellpix`, then a directory under the system temp dir.
pub fn default_cache_dir() -> PathBuf {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .filter(|v| !v.is_empty())
                .map(|home| PathBuf::from(home).join(".cache"))
        })
        .unwrap_or_else(std::env::temp_dir);
    base.join("cellpix")
}

/// Summary of cache use over a batch of images.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} processed ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} processed", self.misses)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // Path derivation
    // =========================================================================

    #[test]
    fn path_for_is_deterministic() {
        let cache = ResizeCache::new("/cache");
        let a = cache.path_for(Path::new("/photos/a.jpg"));
        assert_eq!(a, cache.path_for(Path::new("/photos/a.jpg")));
        assert_eq!(a.parent(), Some(Path::new("/cache")));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("png"));
    }

    #[test]
    fn distinct_sources_get_distinct_paths() {
        let cache = ResizeCache::new("/cache");
        assert_ne!(
            cache.path_for(Path::new("/photos/a.jpg")),
            cache.path_for(Path::new("/photos/b.jpg"))
        );
    }

    #[test]
    fn path_for_does_not_touch_filesystem() {
        let tmp = TempDir::new().unwrap();
        let cache = ResizeCache::new(tmp.path().join("not-yet"));
        let _ = cache.path_for(Path::new("/x.png"));
        assert!(!tmp.path().join("not-yet").exists());
    }

    #[test]
    fn hash_path_is_sha256_hex() {
        let h = hash_path(Path::new("abc"));
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    #[test]
    fn lookup_missing_file_is_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = ResizeCache::new(tmp.path());
        let backend = MockBackend::new();

        assert_eq!(
            cache.lookup(&backend, Path::new("/a.jpg"), ImageSize::new(10, 10)),
            None
        );
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn lookup_matching_size_is_hit() {
        let tmp = TempDir::new().unwrap();
        let cache = ResizeCache::new(tmp.path());
        let source = Path::new("/a.jpg");
        fs::write(cache.path_for(source), "png").unwrap();
        let backend = MockBackend::new().with_sizes(vec![ImageSize::new(10, 8)]);

        assert_eq!(
            cache.lookup(&backend, source, ImageSize::new(10, 8)),
            Some(cache.path_for(source))
        );
    }

    #[test]
    fn lookup_wrong_size_is_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = ResizeCache::new(tmp.path());
        let source = Path::new("/a.jpg");
        fs::write(cache.path_for(source), "png").unwrap();
        let backend = MockBackend::new().with_sizes(vec![ImageSize::new(10, 8)]);

        assert_eq!(cache.lookup(&backend, source, ImageSize::new(20, 16)), None);
    }

    #[test]
    fn lookup_unreadable_entry_is_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = ResizeCache::new(tmp.path());
        let source = Path::new("/a.jpg");
        fs::write(cache.path_for(source), "png").unwrap();
        // No sizes queued: identify fails
        let backend = MockBackend::new();

        assert_eq!(cache.lookup(&backend, source, ImageSize::new(10, 8)), None);
    }

    // =========================================================================
    // Store
    // =========================================================================

    #[test]
    fn store_creates_directory_and_renames_into_place() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested/cache");
        let cache = ResizeCache::new(&dir);
        let backend = MockBackend::new();
        let source = Path::new("/a.jpg");

        let path = cache
            .store(&backend, &DynamicImage::new_rgb8(6, 4), source)
            .unwrap();

        assert_eq!(path, cache.path_for(source));
        assert!(path.is_file());
        // Encoded into a sibling PNG, never straight onto the entry
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        let RecordedOp::Encode {
            path: staged,
            width,
            height,
        } = &ops[0]
        else {
            panic!("expected encode, got {:?}", ops[0]);
        };
        let staged = Path::new(staged);
        assert_eq!((*width, *height), (6, 4));
        assert_ne!(staged, path);
        assert_eq!(staged.parent(), Some(dir.as_path()));
        assert_eq!(staged.extension().and_then(|e| e.to_str()), Some("png"));
        // Only the entry remains
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
    }

    #[test]
    fn store_reports_encode_failure() {
        let tmp = TempDir::new().unwrap();
        let cache = ResizeCache::new(tmp.path());
        let backend = MockBackend::new().failing_encode();

        let result = cache.store(&backend, &DynamicImage::new_rgb8(2, 2), Path::new("/a.jpg"));
        assert!(matches!(result, Err(CacheWriteError::Encode(_))));
    }

    #[test]
    fn failed_store_leaves_no_files_behind() {
        let tmp = TempDir::new().unwrap();
        let cache = ResizeCache::new(tmp.path());
        let backend = MockBackend::new().failing_encode();

        let _ = cache.store(&backend, &DynamicImage::new_rgb8(2, 2), Path::new("/a.jpg"));
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn failed_store_keeps_previous_entry() {
        let tmp = TempDir::new().unwrap();
        let cache = ResizeCache::new(tmp.path());
        let source = Path::new("/a.jpg");
        fs::write(cache.path_for(source), "previous").unwrap();
        let backend = MockBackend::new().failing_encode();

        let _ = cache.store(&backend, &DynamicImage::new_rgb8(2, 2), source);
        assert_eq!(fs::read(cache.path_for(source)).unwrap(), b"previous");
    }

    #[test]
    fn store_reports_directory_failure() {
        let tmp = TempDir::new().unwrap();
        // A file where the cache directory should be
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let cache = ResizeCache::new(blocker.join("cache"));

        let result = cache.store(
            &MockBackend::new(),
            &DynamicImage::new_rgb8(2, 2),
            Path::new("/a.jpg"),
        );
        assert!(matches!(result, Err(CacheWriteError::Io(_))));
    }

    // =========================================================================
    // Defaults and stats
    // =========================================================================

    #[test]
    fn default_cache_dir_ends_with_crate_name() {
        assert!(default_cache_dir().ends_with("cellpix"));
    }

    #[test]
    fn cache_stats_display() {
        let mut stats = CacheStats::default();
        stats.miss();
        stats.miss();
        assert_eq!(stats.to_string(), "2 processed");
        stats.hit();
        assert_eq!(stats.to_string(), "1 cached, 2 processed (3 total)");
    }
}
