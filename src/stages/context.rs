use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::config::{Paths, Settings};
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::Platform;
use crate::prompt::Confirm;

/// Options parsed once from the command line; never mutated afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Do not invoke any package manager; only assert required tools exist.
    pub skip_deps: bool,
    /// Do not back up existing configuration; allow replacing it.
    pub no_backup: bool,
    /// Log intended changes without performing them.
    pub dry_run: bool,
}

/// Shared context for stage execution.
pub struct Context {
    /// Loaded settings.
    pub settings: Arc<Settings>,
    /// Resolved filesystem locations.
    pub paths: Arc<Paths>,
    /// Detected platform information.
    pub platform: Arc<Platform>,
    /// Immutable run options.
    pub options: InstallOptions,
    /// Logger for output and stage recording.
    pub log: Arc<dyn Log>,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Confirmation provider for interactive prompts.
    pub confirm: Arc<dyn Confirm>,
    /// Backup created during this run, set at most once by the backup stage
    /// and read by the symlink stage.
    backup: Arc<OnceLock<PathBuf>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.settings)
            .field("paths", &self.paths)
            .field("platform", &self.platform)
            .field("options", &self.options)
            .field("log", &"<dyn Log>")
            .field("executor", &self.executor)
            .field("confirm", &"<dyn Confirm>")
            .field("backup", &self.backup.get())
            .finish()
    }
}

impl Context {
    /// Creates a new context for stage execution.
    #[must_use]
    pub fn new(
        settings: Arc<Settings>,
        paths: Arc<Paths>,
        platform: Arc<Platform>,
        options: InstallOptions,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self {
            settings,
            paths,
            platform,
            options,
            log,
            executor,
            confirm,
            backup: Arc::new(OnceLock::new()),
        }
    }

    /// Whether changes are only being previewed.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Remember the backup created in this run.
    ///
    /// Returns `false` if a backup was already recorded; the first one wins.
    pub fn record_backup(&self, path: PathBuf) -> bool {
        self.backup.set(path).is_ok()
    }

    /// Backup created earlier in this run, if any.
    #[must_use]
    pub fn backup(&self) -> Option<&Path> {
        self.backup.get().map(PathBuf::as_path)
    }

    /// Ask the confirmation provider, logging the answer.
    pub fn confirm(&self, prompt: &str) -> bool {
        let answer = self.confirm.confirm(prompt);
        self.log
            .debug(&format!("{prompt} -> {}", if answer { "yes" } else { "no" }));
        answer
    }
}
