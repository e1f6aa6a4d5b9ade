//! File-system resource helpers.
use anyhow::{Context as _, Result};
use std::path::Path;

/// Recursively copy a directory tree, recreating symlinks as symlinks.
///
/// Unlike a plain copy, links inside `src` are not followed: each one is
/// re-created at the destination with the same (possibly relative) target,
/// so the copy is a faithful snapshot of the original.
///
/// # Errors
///
/// Returns an error if a directory cannot be created, an entry cannot be
/// read, or a file or link cannot be copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)
        .with_context(|| format!("creating directory {}", dst.display()))?;
    for entry in
        std::fs::read_dir(src).with_context(|| format!("reading directory {}", src.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry in {}", src.display()))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .with_context(|| format!("reading file type of {}", src_path.display()))?;
        if file_type.is_symlink() {
            copy_link(&src_path, &dst_path)?;
        } else if file_type.is_dir() {
            copy_tree(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path).with_context(|| {
                format!("copying {} to {}", src_path.display(), dst_path.display())
            })?;
        }
    }
    Ok(())
}

/// Re-create the symlink at `src` as a new symlink at `dst`.
fn copy_link(src: &Path, dst: &Path) -> Result<()> {
    let target =
        std::fs::read_link(src).with_context(|| format!("reading link {}", src.display()))?;
    std::os::unix::fs::symlink(&target, dst)
        .with_context(|| format!("creating link {} -> {}", dst.display(), target.display()))
}

/// Remove whatever is at `path`: a symlink (without touching its target),
/// a file, or a whole directory tree. Does nothing if `path` does not exist.
///
/// # Errors
///
/// Returns an error if the path exists but cannot be removed.
pub fn remove_path(path: &Path) -> Result<()> {
    let Ok(meta) = path.symlink_metadata() else {
        return Ok(());
    };
    let removed = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    removed.with_context(|| format!("removing {}", path.display()))
}

/// Whether `path` itself is a symlink (dangling links included).
#[must_use]
pub fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata().is_ok_and(|m| m.is_symlink())
}

/// Whether anything exists at `path`, counting dangling symlinks.
#[must_use]
pub fn exists_or_dangling(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
