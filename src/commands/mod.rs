//! Top-level command orchestration (`install`, `validate`).
pub mod install;
pub mod validate;

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::config::paths::{home_dir, resolve_root};
use crate::config::{Paths, Settings};
use crate::error::SetupError;
use crate::logging::Logger;
use crate::platform::Platform;

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Detected platform.
    pub platform: Platform,
    /// Loaded settings.
    pub settings: Settings,
    /// Resolved paths.
    pub paths: Paths,
}

impl CommandSetup {
    /// Resolve the repository root, load settings, and resolve all paths.
    ///
    /// The platform is detected by the caller beforehand so an unsupported
    /// OS is rejected before anything is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be determined, the settings file
    /// is invalid, or `$HOME` is unset.
    pub fn init(global: &GlobalOpts, platform: Platform, log: &Logger) -> Result<Self> {
        let root = resolve_root(global.root.as_deref(), &Settings::default().stow_package)?;
        let settings = Settings::load(&root).map_err(SetupError::from)?;
        let home = home_dir()?;
        let paths = Paths::resolve(&settings, &home, &root);

        log.debug(&format!("platform: {}", platform.os));
        log.debug(&format!("root: {}", paths.root.display()));
        log.debug(&format!("home: {}", paths.home.display()));

        Ok(Self {
            platform,
            settings,
            paths,
        })
    }

    /// Build directly from parts (tests, embedding).
    #[must_use]
    pub const fn new(platform: Platform, settings: Settings, paths: Paths) -> Self {
        Self {
            platform,
            settings,
            paths,
        }
    }
}
