//! Input discovery for the `prepare` command.
//!
//! Files named on the command line are taken as given. Directories are
//! walked recursively and contribute every file with a supported image
//! extension, in file-name order. Paths are canonicalized so the cache key
//! for an image does not depend on the working directory.

use crate::imaging::is_supported_image;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Expand `paths` into the list of image files to prepare.
///
/// Duplicates are dropped, keeping the first occurrence.
pub fn collect_sources(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    for path in paths {
        if path.is_dir() {
            let walker = WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping unreadable entry");
                        None
                    }
                });
            for entry in walker {
                if entry.file_type().is_file() && is_supported_image(entry.path()) {
                    sources.push(canonical(entry.path()));
                }
            }
        } else {
            sources.push(canonical(path));
        }
    }

    let mut seen = std::collections::HashSet::new();
    sources.retain(|p| seen.insert(p.clone()));
    sources
}

/// Canonical form of `path`, or `path` itself when it cannot be resolved.
fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
