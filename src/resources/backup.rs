//! Timestamped backups of existing configuration.
use anyhow::{Context as _, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::fs::{copy_tree, exists_or_dangling, is_symlink};

/// Local time formatted for backup suffixes (`YYYYmmdd_HHMMSS`).
#[must_use]
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// First free sibling path `<target>.backup.<timestamp>`, with `-1`, `-2`,
/// ... appended when the name is already taken.
#[must_use]
pub fn backup_path_for(target: &Path, timestamp: &str) -> PathBuf {
    let base = sibling_with_suffix(target, &format!(".backup.{timestamp}"));
    if !exists_or_dangling(&base) {
        return base;
    }
    (1u32..)
        .map(|n| sibling_with_suffix(target, &format!(".backup.{timestamp}-{n}")))
        .find(|candidate| !exists_or_dangling(candidate))
        .unwrap_or(base)
}

fn sibling_with_suffix(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target
        .file_name()
        .map_or_else(OsString::new, ToOwned::to_owned);
    name.push(suffix);
    target.with_file_name(name)
}

/// Copy `target` aside before it gets replaced.
///
/// Real directories are copied recursively (links inside are kept as links)
/// and regular files are copied as-is. Returns the backup location, or
/// `None` when there is nothing to preserve: the target is absent or is
/// already a symlink from a previous install.
///
/// # Errors
///
/// Returns an error if the copy fails; a partially written backup is left
/// in place for inspection.
pub fn create_backup(target: &Path, timestamp: &str) -> Result<Option<PathBuf>> {
    if !exists_or_dangling(target) || is_symlink(target) {
        return Ok(None);
    }

    let destination = backup_path_for(target, timestamp);
    let copied = if target.is_dir() {
        copy_tree(target, &destination)
    } else {
        std::fs::copy(target, &destination)
            .map(|_| ())
            .map_err(Into::into)
    };
    copied.with_context(|| {
        format!(
            "backing up {} to {}",
            target.display(),
            destination.display()
        )
    })?;

    Ok(Some(destination))
}
