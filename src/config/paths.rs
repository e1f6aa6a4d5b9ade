//! Concrete filesystem locations derived from settings, `$HOME`, and the
//! repository root.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::Settings;
use crate::error::{EnvironmentError, SetupError};

/// Every path the installer reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// User home directory; the Stow target.
    pub home: PathBuf,
    /// Repository root; the Stow directory.
    pub root: PathBuf,
    /// Installed configuration directory (`$HOME/<config_dir>`).
    pub config_dir: PathBuf,
    /// Source tree the configuration directory links into.
    pub source_tree: PathBuf,
    /// Rendered MCP configuration file.
    pub mcp_config: PathBuf,
    /// MCP template inside the repository.
    pub mcp_template: PathBuf,
    /// Secondary setup script inside the repository.
    pub mcp_setup_script: PathBuf,
}

impl Paths {
    /// Resolve all paths for `settings` against `home` and `root`.
    #[must_use]
    pub fn resolve(settings: &Settings, home: &Path, root: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
            root: root.to_path_buf(),
            config_dir: home.join(&settings.config_dir),
            source_tree: root.join(&settings.stow_package).join(&settings.config_dir),
            mcp_config: home.join(&settings.mcp_config),
            mcp_template: root.join(&settings.mcp_template),
            mcp_setup_script: root.join(&settings.mcp_setup_script),
        }
    }

    /// Directory holding the Stow package (the repository root).
    #[must_use]
    pub fn stow_dir(&self) -> &Path {
        &self.root
    }
}

/// Read `$HOME`.
///
/// # Errors
///
/// Returns [`EnvironmentError::HomeNotSet`] when the variable is unset or empty.
pub fn home_dir() -> Result<PathBuf, SetupError> {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(home)),
        _ => Err(EnvironmentError::HomeNotSet.into()),
    }
}

/// Resolve the repository root from an explicit override or auto-detection.
///
/// Order: `explicit`, `AGENT_SETUP_ROOT`, the directory layout around the
/// running binary, then the current directory. The result is always
/// absolute, so later stages can change directory without re-resolving it.
///
/// # Errors
///
/// Returns an error if an override does not exist, or if no candidate
/// contains the settings file or a Stow package directory.
pub fn resolve_root(explicit: Option<&Path>, stow_package: &str) -> Result<PathBuf> {
    let from_env = std::env::var_os("AGENT_SETUP_ROOT").map(PathBuf::from);
    let exe = std::env::current_exe().ok();
    let cwd = std::env::current_dir().context("reading the current directory")?;
    find_root(
        explicit,
        from_env.as_deref(),
        exe.as_deref(),
        &cwd,
        stow_package,
    )
}

fn find_root(
    explicit: Option<&Path>,
    from_env: Option<&Path>,
    exe: Option<&Path>,
    cwd: &Path,
    stow_package: &str,
) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return absolute_root(root, cwd).context("resolving --root");
    }

    if let Some(root) = from_env.filter(|r| !r.as_os_str().is_empty()) {
        return absolute_root(root, cwd).context("resolving AGENT_SETUP_ROOT");
    }

    if let Some(parent) = exe.and_then(Path::parent) {
        let candidates = [
            parent.join("../.."), // target/release/ → repo root
            parent.join(".."),    // bin/ → repo root
        ];
        for candidate in &candidates {
            if looks_like_root(candidate, stow_package) {
                return Ok(dunce::canonicalize(candidate)?);
            }
        }
    }

    if looks_like_root(cwd, stow_package) {
        return absolute_root(cwd, cwd);
    }

    anyhow::bail!("cannot determine repository root. Use --root or set AGENT_SETUP_ROOT");
}

/// `root` interpreted against `cwd` and canonicalised.
fn absolute_root(root: &Path, cwd: &Path) -> Result<PathBuf> {
    let joined = cwd.join(root);
    dunce::canonicalize(&joined)
        .with_context(|| format!("repository root {} does not exist", joined.display()))
}

fn looks_like_root(dir: &Path, stow_package: &str) -> bool {
    dir.join(super::SETTINGS_FILE).is_file() || dir.join(stow_package).is_dir()
}
