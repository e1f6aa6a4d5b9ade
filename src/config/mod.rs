//! Installer settings loaded from `agent-setup.toml` at the repository root.
pub mod paths;
pub mod toml_loader;

use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

use crate::error::ConfigError;

pub use paths::Paths;

/// File name of the optional settings file at the repository root.
pub const SETTINGS_FILE: &str = "agent-setup.toml";

/// All installer settings. Every field has a default, so a missing or empty
/// settings file yields a working configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Configuration directory, relative to `$HOME`.
    pub config_dir: PathBuf,
    /// Stow package (directory under the repository root) holding the tree.
    pub stow_package: String,
    /// MCP configuration file, relative to `$HOME`.
    pub mcp_config: PathBuf,
    /// MCP template, relative to the repository root.
    pub mcp_template: PathBuf,
    /// Secondary setup script, relative to the repository root.
    pub mcp_setup_script: PathBuf,
    /// Assistant CLI installation channels.
    pub cli: CliSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from(".claude"),
            stow_package: "claude".to_string(),
            mcp_config: PathBuf::from(".mcp.json"),
            mcp_template: PathBuf::from("mcp/mcp.json.template"),
            mcp_setup_script: PathBuf::from("scripts/setup-mcp.sh"),
            cli: CliSettings::default(),
        }
    }
}

/// Where and how the assistant CLI is installed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliSettings {
    /// Executable name looked up on `PATH`.
    pub binary: String,
    /// Package for `npm install -g` (Linux).
    pub npm_package: String,
    /// Homebrew formula (macOS).
    pub brew_formula: String,
    /// Homebrew tap added before installing, if any.
    pub brew_tap: Option<String>,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            binary: "claude".to_string(),
            npm_package: "@anthropic-ai/claude-code".to_string(),
            brew_formula: "claude-code".to_string(),
            brew_tap: None,
        }
    }
}

impl Settings {
    /// Load `agent-setup.toml` from `root`, falling back to defaults when
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, does not parse, or
    /// contains an unusable value.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let settings: Self = toml_loader::load_config(&root.join(SETTINGS_FILE))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject absolute paths, parent traversal, and empty names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_relative("config_dir", &self.config_dir)?;
        check_relative("mcp_config", &self.mcp_config)?;
        check_relative("mcp_template", &self.mcp_template)?;
        check_relative("mcp_setup_script", &self.mcp_setup_script)?;
        check_relative("stow_package", Path::new(&self.stow_package))?;
        if self.stow_package.contains(['/', '\\']) {
            return Err(invalid("stow_package", "must be a single directory name"));
        }
        if self.cli.binary.trim().is_empty() {
            return Err(invalid("cli.binary", "must not be empty"));
        }
        Ok(())
    }
}

fn check_relative(field: &str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    if path.is_absolute() || path.has_root() {
        return Err(invalid(field, "must be a relative path"));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(invalid(field, "must not contain '..'"));
    }
    Ok(())
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
