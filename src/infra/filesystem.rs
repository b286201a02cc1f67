//! Filesystem operations
//!
//! Handles file and directory operations, including the metadata-preserving
//! copies used when staging and merging architecture trees.

use std::io;
use std::path::Path;

use filetime::FileTime;
use walkdir::WalkDir;

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Write content to a file
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Copy a regular file, keeping permissions and timestamps
pub fn copy_file_preserving(src: &Path, dst: &Path) -> io::Result<()> {
    std::fs::copy(src, dst)?;
    let meta = std::fs::metadata(src)?;
    filetime::set_file_times(
        dst,
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    )
}

/// Recreate a symlink at `dst` pointing where `src` points
pub fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let target = std::fs::read_link(src)?;
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, dst)
    }
    #[cfg(windows)]
    {
        if src.is_dir() {
            std::os::windows::fs::symlink_dir(&target, dst)
        } else {
            std::os::windows::fs::symlink_file(&target, dst)
        }
    }
}

/// Copy directory permissions and timestamps
///
/// Platforms that refuse to set timestamps on directories are tolerated.
pub fn copy_dir_metadata(src: &Path, dst: &Path) -> io::Result<()> {
    let meta = std::fs::metadata(src)?;
    std::fs::set_permissions(dst, meta.permissions())?;
    if let Err(e) = filetime::set_file_times(
        dst,
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    ) {
        tracing::debug!("Could not set times on {}: {}", dst.display(), e);
    }
    Ok(())
}

/// Copy a directory tree, keeping symlinks as links
///
/// Entries for which `skip` returns true are not copied (nor descended into).
/// Returns the number of regular files copied.
pub fn copy_tree_filtered(
    src: &Path,
    dst: &Path,
    skip: impl Fn(&Path) -> bool,
) -> Result<usize, FilesystemError> {
    let copy_err = |from: &Path, to: &Path, error: String| FilesystemError::Copy {
        src: from.to_path_buf(),
        dst: to.to_path_buf(),
        error,
    };

    create_dir_all(dst)?;
    let mut copied = 0;

    for entry in WalkDir::new(src)
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !skip(e.path()))
    {
        let entry = entry.map_err(|e| copy_err(src, dst, e.to_string()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| copy_err(entry.path(), dst, e.to_string()))?;
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)
                .map_err(|e| copy_err(entry.path(), &target, e.to_string()))?;
        } else if file_type.is_dir() {
            create_dir_all(&target)?;
        } else {
            copy_file_preserving(entry.path(), &target)
                .map_err(|e| copy_err(entry.path(), &target, e.to_string()))?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Compare two files byte for byte
pub fn same_content(a: &Path, b: &Path) -> io::Result<bool> {
    let (meta_a, meta_b) = (std::fs::metadata(a)?, std::fs::metadata(b)?);
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }
    Ok(std::fs::read(a)? == std::fs::read(b)?)
}
