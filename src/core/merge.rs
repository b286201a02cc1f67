//! Directory tree merging
//!
//! Grafts one directory tree onto another that may already be partially
//! populated. Existing destination entries are never overwritten unless a
//! per-file merge function takes over, symlinks are recreated rather than
//! followed, and I/O failures are collected so a merge goes as far as it can
//! before reporting everything that went wrong at once.

use std::path::Path;

use crate::error::{CombineError, MergeError, MergeFailure};
use crate::infra::filesystem;

/// Per-file merge hook: `(src, dst)`
pub type MergeFileFn<'a> = dyn FnMut(&Path, &Path) -> Result<(), MergeError> + 'a;

/// Counters reported after a merge
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    /// Files and symlinks copied verbatim
    pub copied: usize,
    /// Entries left alone because the destination already had them
    pub skipped: usize,
    /// Files handed to the merge function
    pub delegated: usize,
}

/// Merges a source tree into a destination tree
pub struct TreeMerger<'a> {
    merge_file: Option<Box<MergeFileFn<'a>>>,
    failures: Vec<MergeFailure>,
    stats: MergeStats,
}

impl Default for TreeMerger<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TreeMerger<'a> {
    /// Merger that copies files verbatim and skips existing ones
    pub fn new() -> Self {
        Self {
            merge_file: None,
            failures: Vec::new(),
            stats: MergeStats::default(),
        }
    }

    /// Merger that routes every regular file through `merge_file`
    #[must_use]
    pub fn with_merge_fn(
        mut self,
        merge_file: impl FnMut(&Path, &Path) -> Result<(), MergeError> + 'a,
    ) -> Self {
        self.merge_file = Some(Box::new(merge_file));
        self
    }

    /// Merge `src` into `dst`
    ///
    /// Per-entry I/O errors are collected into [`MergeError::Aggregate`].
    /// A [`MergeError::Combine`] from the merge function aborts immediately.
    pub fn merge(mut self, src: &Path, dst: &Path) -> Result<MergeStats, MergeError> {
        self.merge_dir(src, dst)?;
        if self.failures.is_empty() {
            Ok(self.stats)
        } else {
            Err(MergeError::Aggregate {
                failures: self.failures,
            })
        }
    }

    fn fail(&mut self, src: &Path, dst: &Path, error: impl ToString) {
        self.failures.push(MergeFailure {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            error: error.to_string(),
        });
    }

    fn merge_dir(&mut self, src: &Path, dst: &Path) -> Result<(), CombineError> {
        if let Err(e) = filesystem::create_dir_all(dst) {
            self.fail(src, dst, e);
            return Ok(());
        }

        let mut entries = match std::fs::read_dir(src) {
            Ok(iter) => match iter.collect::<Result<Vec<_>, _>>() {
                Ok(entries) => entries,
                Err(e) => {
                    self.fail(src, dst, e);
                    return Ok(());
                }
            },
            Err(e) => {
                self.fail(src, dst, e);
                return Ok(());
            }
        };
        entries.sort_by_key(std::fs::DirEntry::file_name);

        for entry in entries {
            let src_path = entry.path();
            let dst_path = dst.join(entry.file_name());
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(e) => {
                    self.fail(&src_path, &dst_path, e);
                    continue;
                }
            };
            let dst_exists = dst_path.symlink_metadata().is_ok();

            if file_type.is_symlink() {
                if dst_exists {
                    self.stats.skipped += 1;
                } else if let Err(e) = filesystem::copy_symlink(&src_path, &dst_path) {
                    self.fail(&src_path, &dst_path, e);
                } else {
                    self.stats.copied += 1;
                }
            } else if file_type.is_dir() {
                if dst_exists && !dst_path.is_dir() {
                    tracing::debug!(
                        "Keeping existing {} over directory {}",
                        dst_path.display(),
                        src_path.display()
                    );
                    self.stats.skipped += 1;
                } else {
                    self.merge_dir(&src_path, &dst_path)?;
                }
            } else if let Some(merge_file) = self.merge_file.as_mut() {
                self.stats.delegated += 1;
                match merge_file(&src_path, &dst_path) {
                    Ok(()) => {}
                    Err(MergeError::Aggregate { failures }) => self.failures.extend(failures),
                    Err(MergeError::Combine(e)) => return Err(e),
                }
            } else if dst_exists {
                self.stats.skipped += 1;
            } else if let Err(e) = filesystem::copy_file_preserving(&src_path, &dst_path) {
                self.fail(&src_path, &dst_path, e);
            } else {
                self.stats.copied += 1;
            }
        }

        if let Err(e) = filesystem::copy_dir_metadata(src, dst) {
            self.fail(src, dst, e);
        }
        Ok(())
    }
}

/// Merge `src` into `dst` without a merge function
pub fn merge_tree(src: &Path, dst: &Path) -> Result<MergeStats, MergeError> {
    TreeMerger::new().merge(src, dst)
}
