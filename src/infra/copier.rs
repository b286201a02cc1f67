//! File copier used by package steps
//!
//! Stages files matching a pattern from a set of source roots (recipe sources,
//! build outputs) into a single destination root. Per-architecture scratch
//! folders are never descended into.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::defaults::ARCH_FOLDER;
use crate::core::package_filter::{self, WildcardPattern};
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Copies files from source roots into a destination root
#[derive(Debug, Clone)]
pub struct FileCopier {
    sources: Vec<PathBuf>,
    dest: PathBuf,
    excludes: Vec<WildcardPattern>,
}

impl FileCopier {
    /// Copier from `sources` into `dest`
    pub fn new(sources: Vec<PathBuf>, dest: PathBuf) -> Self {
        let mut unique: Vec<PathBuf> = Vec::with_capacity(sources.len());
        for source in sources {
            if !unique.contains(&source) {
                unique.push(source);
            }
        }
        Self {
            sources: unique,
            dest,
            excludes: Vec::new(),
        }
    }

    /// Also skip files matching any of `patterns`
    #[must_use]
    pub fn with_excludes(mut self, patterns: &[String]) -> Self {
        self.excludes.extend(package_filter::compile_all(patterns));
        self
    }

    /// Source roots in lookup order
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Destination root
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Copy files matching `pattern` found under `<source>/<src>` into `<dest>/<dst>`
    ///
    /// With `keep_path` the path below `<source>/<src>` is kept; otherwise files
    /// land flat in `<dest>/<dst>`. Returns the destination paths written.
    pub fn copy(
        &self,
        pattern: &str,
        src: &str,
        dst: &str,
        keep_path: bool,
    ) -> Result<Vec<PathBuf>, FilesystemError> {
        let pattern = WildcardPattern::new(pattern).map_err(|e| FilesystemError::Copy {
            src: PathBuf::from(src),
            dst: self.dest.join(dst),
            error: format!("invalid pattern '{pattern}': {e}"),
        })?;
        let dest_root = self.dest.join(dst);
        let mut written = Vec::new();

        for source in &self.sources {
            let root = source.join(src);
            if !root.is_dir() {
                continue;
            }

            let walker = WalkDir::new(&root)
                .follow_links(false)
                .min_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| {
                    // Folders holding the destination, or any arch's scratch
                    !(e.file_type().is_dir()
                        && (e.file_name() == ARCH_FOLDER
                            || (e.depth() > 0 && self.dest.starts_with(e.path()))))
                });

            for entry in walker {
                let entry = entry.map_err(|e| FilesystemError::Copy {
                    src: root.clone(),
                    dst: dest_root.clone(),
                    error: e.to_string(),
                })?;
                if entry.file_type().is_dir() {
                    continue;
                }

                let Ok(rel) = entry.path().strip_prefix(&root) else {
                    continue;
                };
                let rel_str = rel.to_string_lossy().replace('\\', "/");
                if !pattern.matches(&rel_str)
                    || package_filter::is_excluded(&self.excludes, &rel_str)
                {
                    continue;
                }

                let target = if keep_path {
                    dest_root.join(rel)
                } else {
                    dest_root.join(entry.file_name())
                };
                if let Some(parent) = target.parent() {
                    filesystem::create_dir_all(parent)?;
                }

                let result = if entry.file_type().is_symlink() {
                    if target.symlink_metadata().is_ok() {
                        std::fs::remove_file(&target).and_then(|()| {
                            filesystem::copy_symlink(entry.path(), &target)
                        })
                    } else {
                        filesystem::copy_symlink(entry.path(), &target)
                    }
                } else {
                    filesystem::copy_file_preserving(entry.path(), &target)
                };
                result.map_err(|e| FilesystemError::Copy {
                    src: entry.path().to_path_buf(),
                    dst: target.clone(),
                    error: e.to_string(),
                })?;
                written.push(target);
            }
        }

        tracing::debug!(
            "Copied {} file(s) matching '{}' into {}",
            written.len(),
            pattern.as_str(),
            dest_root.display()
        );
        Ok(written)
    }
}
