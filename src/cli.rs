//! Command-line interface.
use clap::{Parser, Subcommand};

use crate::stages::InstallOptions;

/// Top-level CLI entry point. Without a subcommand the full install runs.
#[derive(Parser, Debug)]
#[command(
    name = "agent-setup",
    about = "Install an AI coding assistant's configuration, CLI and MCP servers",
    version = crate::VERSION
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(flatten)]
    pub install: InstallOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Override the repository root directory
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<std::path::PathBuf>,
}

/// Options for the install workflow.
#[derive(Parser, Debug, Clone, Copy)]
pub struct InstallOpts {
    /// Skip dependency installation (required tools must already exist)
    #[arg(long)]
    pub skip_deps: bool,

    /// Do not back up existing configuration; replace it
    #[arg(long)]
    pub no_backup: bool,

    /// Answer yes to every confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Preview changes without applying
    #[arg(short = 'd', long)]
    pub dry_run: bool,
}

impl InstallOpts {
    /// The immutable options handed to every stage.
    #[must_use]
    pub const fn options(&self) -> InstallOptions {
        InstallOptions {
            skip_deps: self.skip_deps,
            no_backup: self.no_backup,
            dry_run: self.dry_run,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Check the installed state without changing anything
    Validate,
    /// Print version information
    Version,
}
