//! GNU Stow package resource.
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::fs::{exists_or_dangling, is_symlink};
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::{SetupError, StateConflictError};
use crate::exec::Executor;

/// Marker stow prints in verbose mode for every link it creates.
const LINK_MARKER: &str = "LINK";

/// A stow package linked from `stow_dir` into `target_dir`.
///
/// `link` is the home-relative entry the package provides (the
/// configuration directory) and `source` is where it must resolve.
#[derive(Debug)]
pub struct StowResource<'a> {
    /// Directory holding the package (`stow -d`).
    pub stow_dir: PathBuf,
    /// Directory the links are created in (`stow -t`).
    pub target_dir: PathBuf,
    /// Package name.
    pub package: String,
    /// Path that should end up linked.
    pub link: PathBuf,
    /// Tree inside the package that `link` should resolve into.
    pub source: PathBuf,
    executor: &'a dyn Executor,
}

impl<'a> StowResource<'a> {
    /// Create a new stow resource.
    #[must_use]
    pub const fn new(
        stow_dir: PathBuf,
        target_dir: PathBuf,
        package: String,
        link: PathBuf,
        source: PathBuf,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            stow_dir,
            target_dir,
            package,
            link,
            source,
            executor,
        }
    }

    /// Arguments passed to `stow`.
    #[must_use]
    pub fn stow_args(&self) -> Vec<String> {
        vec![
            "-v".to_string(),
            "-d".to_string(),
            self.stow_dir.display().to_string(),
            "-t".to_string(),
            self.target_dir.display().to_string(),
            self.package.clone(),
        ]
    }

    /// Whether `link` currently resolves somewhere inside `source`.
    fn resolves_into_source(&self) -> bool {
        let (Ok(resolved), Ok(source)) = (
            dunce::canonicalize(&self.link),
            dunce::canonicalize(&self.source),
        ) else {
            return false;
        };
        resolved.starts_with(source)
    }

    /// Check the post-install condition: `link` is a symlink into the source
    /// tree, or an ordinary directory (stow unfolded the tree into it).
    ///
    /// # Errors
    ///
    /// Returns [`StateConflictError::UnexpectedTarget`] describing what was
    /// found instead.
    pub fn verify(&self) -> Result<(), SetupError> {
        let unexpected = |reason: &str| StateConflictError::UnexpectedTarget {
            path: self.link.clone(),
            reason: reason.to_string(),
        };
        if is_symlink(&self.link) {
            if self.resolves_into_source() {
                return Ok(());
            }
            return Err(unexpected(&format!(
                "symlink does not resolve into {}",
                self.source.display()
            ))
            .into());
        }
        if self.link.is_dir() {
            return Ok(());
        }
        if exists_or_dangling(&self.link) {
            return Err(unexpected("not a directory or symlink").into());
        }
        Err(unexpected("missing after stow").into())
    }
}

impl Applicable for StowResource<'_> {
    fn description(&self) -> String {
        format!("{} -> {}", self.link.display(), self.source.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        let args = self.stow_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let result = self
            .executor
            .run("stow", &args)
            .with_context(|| format!("stowing package '{}'", self.package))?;

        if result.combined_output().contains(LINK_MARKER) {
            Ok(ResourceChange::Applied)
        } else if is_symlink(&self.link) && self.resolves_into_source() {
            // Some stow builds stay quiet when the link is already in place.
            Ok(ResourceChange::AlreadyCorrect)
        } else {
            Ok(ResourceChange::Skipped {
                reason: "stow reported no new links".to_string(),
            })
        }
    }
}

impl Resource for StowResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.source.is_dir() {
            return Ok(ResourceState::Invalid {
                reason: format!("source tree does not exist: {}", self.source.display()),
            });
        }
        if is_symlink(&self.link) {
            if self.resolves_into_source() {
                return Ok(ResourceState::Correct);
            }
            let current = std::fs::read_link(&self.link)
                .map_or_else(|_| "unreadable link".to_string(), |t| t.display().to_string());
            return Ok(ResourceState::Incorrect { current });
        }
        if exists_or_dangling(&self.link) {
            return Ok(ResourceState::Invalid {
                reason: if self.link.is_dir() {
                    "target is a real directory".to_string()
                } else {
                    "target is a regular file".to_string()
                },
            });
        }
        Ok(ResourceState::Missing)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;
    use std::os::unix::fs::symlink;

    struct Layout {
        _dir: tempfile::TempDir,
        root: PathBuf,
        home: PathBuf,
        source: PathBuf,
        link: PathBuf,
    }

    fn layout() -> Layout {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("repo");
        let home = dir.path().join("home");
        let source = root.join("claude/.claude");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::create_dir_all(&home).unwrap();
        let link = home.join(".claude");
        Layout {
            _dir: dir,
            root,
            home,
            source,
            link,
        }
    }

    fn resource<'a>(l: &Layout, executor: &'a MockExecutor) -> StowResource<'a> {
        StowResource::new(
            l.root.clone(),
            l.home.clone(),
            "claude".to_string(),
            l.link.clone(),
            l.source.clone(),
            executor,
        )
    }

    #[test]
    fn missing_link() {
        let l = layout();
        let executor = MockExecutor::new();
        assert_eq!(
            resource(&l, &executor).current_state().unwrap(),
            ResourceState::Missing
        );
    }

    #[test]
    fn relative_link_into_source_is_correct() {
        let l = layout();
        symlink("../repo/claude/.claude", &l.link).unwrap();
        let executor = MockExecutor::new();
        let r = resource(&l, &executor);
        assert_eq!(r.current_state().unwrap(), ResourceState::Correct);
        assert!(r.verify().is_ok());
    }

    #[test]
    fn link_elsewhere_is_incorrect() {
        let l = layout();
        let other = l.home.join("elsewhere");
        std::fs::create_dir(&other).unwrap();
        symlink(&other, &l.link).unwrap();
        let executor = MockExecutor::new();
        let r = resource(&l, &executor);
        assert!(matches!(
            r.current_state().unwrap(),
            ResourceState::Incorrect { .. }
        ));
        assert!(r.verify().is_err());
    }

    #[test]
    fn real_directory_is_invalid_but_verifies() {
        let l = layout();
        std::fs::create_dir(&l.link).unwrap();
        let executor = MockExecutor::new();
        let r = resource(&l, &executor);
        assert!(matches!(
            r.current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
        assert!(r.verify().is_ok(), "ordinary directory satisfies post-condition");
    }

    #[test]
    fn regular_file_fails_verification() {
        let l = layout();
        std::fs::write(&l.link, b"x").unwrap();
        let executor = MockExecutor::new();
        let err = resource(&l, &executor).verify().unwrap_err();
        assert!(err.to_string().contains("not a directory or symlink"));
    }

    #[test]
    fn missing_source_tree_is_invalid() {
        let l = layout();
        std::fs::remove_dir_all(&l.source).unwrap();
        let executor = MockExecutor::new();
        assert!(matches!(
            resource(&l, &executor).current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
    }

    #[test]
    fn apply_runs_stow_verbose() {
        let l = layout();
        let executor = MockExecutor::ok("LINK: .claude => repo/claude/.claude\n");
        let change = resource(&l, &executor).apply().unwrap();
        assert_eq!(change, ResourceChange::Applied);
        assert_eq!(
            executor.calls(),
            vec![format!(
                "stow -v -d {} -t {} claude",
                l.root.display(),
                l.home.display()
            )]
        );
    }

    #[test]
    fn apply_without_link_output_is_skipped() {
        let l = layout();
        let executor = MockExecutor::ok("");
        let change = resource(&l, &executor).apply().unwrap();
        assert!(matches!(change, ResourceChange::Skipped { .. }));
    }

    #[test]
    fn quiet_stow_over_existing_link_is_already_correct() {
        let l = layout();
        symlink("../repo/claude/.claude", &l.link).unwrap();
        let executor = MockExecutor::ok("");
        let change = resource(&l, &executor).apply().unwrap();
        assert_eq!(change, ResourceChange::AlreadyCorrect);
        assert_eq!(executor.call_count(), 1);
    }

    #[test]
    fn quiet_stow_over_foreign_link_is_skipped() {
        let l = layout();
        let other = l.home.join("elsewhere");
        std::fs::create_dir(&other).unwrap();
        symlink(&other, &l.link).unwrap();
        let executor = MockExecutor::ok("");
        let change = resource(&l, &executor).apply().unwrap();
        assert!(matches!(change, ResourceChange::Skipped { .. }));
    }

    #[test]
    fn apply_failure_is_error() {
        let l = layout();
        let executor = MockExecutor::fail();
        assert!(resource(&l, &executor).apply().is_err());
    }
}
