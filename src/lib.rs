//! Workstation installer for an AI coding assistant's configuration.
//!
//! Brings a macOS or Linux machine to a state where the assistant is usable:
//! the configuration directory is symlinked from this repository with GNU
//! Stow, the assistant CLI is installed, and the MCP server configuration is
//! rendered into the home directory.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: load `agent-setup.toml` and resolve paths
//! - **[`resources`]**: `check + apply` primitives (packages, backups, stow)
//! - **[`stages`]**: the ordered, fail-fast install pipeline
//! - **[`commands`]**: top-level subcommand orchestration (`install`, `validate`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod prompt;
pub mod resources;
pub mod stages;

/// Version reported by `--version` and the `version` subcommand.
pub const VERSION: &str = match option_env!("AGENT_SETUP_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
