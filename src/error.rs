//! Domain-specific error types for the installer.
//!
//! Stages raise fatal conditions as [`SetupError`] values wrapped in
//! [`anyhow::Error`]; the binary walks the error chain at exit to pick the
//! process exit code and the label printed next to the message.
//!
//! # Error hierarchy
//!
//! ```text
//! SetupError
//! ├── Environment(EnvironmentError)      unsupported OS, no package manager
//! ├── Dependency(DependencyError)        required tool absent or not installed
//! ├── StateConflict(StateConflictError)  unsafe to replace existing config
//! ├── Config(ConfigError)                agent-setup.toml problems
//! └── ValidationFailed                   post-install checks did not hold
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The host cannot run the installer at all.
    Environment,
    /// A required external tool is missing.
    MissingDependency,
    /// Existing files on disk would be destroyed unsafely.
    StateConflict,
    /// The settings file is unreadable or invalid.
    Config,
    /// Final state verification failed.
    Validation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Environment => write!(f, "environment"),
            Self::MissingDependency => write!(f, "dependency"),
            Self::StateConflict => write!(f, "state conflict"),
            Self::Config => write!(f, "config"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

/// Top-level error type for the installer.
#[derive(Error, Debug)]
pub enum SetupError {
    /// The host environment is unsupported.
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// A required dependency is unavailable.
    #[error(transparent)]
    Dependency(#[from] DependencyError),

    /// Existing configuration blocks the install.
    #[error(transparent)]
    StateConflict(#[from] StateConflictError),

    /// The settings file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// One or more required post-install checks failed.
    #[error("validation failed: {failed} of {total} required check(s) did not pass")]
    ValidationFailed {
        /// Number of required checks that failed.
        failed: usize,
        /// Number of required checks that ran.
        total: usize,
    },
}

impl SetupError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Environment(_) => ErrorKind::Environment,
            Self::Dependency(_) => ErrorKind::MissingDependency,
            Self::StateConflict(_) => ErrorKind::StateConflict,
            Self::Config(_) => ErrorKind::Config,
            Self::ValidationFailed { .. } => ErrorKind::Validation,
        }
    }

    /// Process exit code for this error. Every fatal condition exits 1.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        1
    }
}

/// Errors about the machine the installer runs on.
#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// Only macOS and Linux are supported.
    #[error("unsupported operating system '{os}': only macOS and Linux are supported")]
    UnsupportedOs {
        /// OS identifier as reported by the toolchain.
        os: String,
    },

    /// No known package manager is available to install a missing tool.
    #[error("cannot install {tool}: no supported package manager found (brew, apt-get, dnf, pacman)")]
    NoPackageManager {
        /// Tool that could not be installed.
        tool: String,
    },

    /// `$HOME` is not set.
    #[error("HOME environment variable is not set")]
    HomeNotSet,
}

/// Errors about external tools the installer depends on.
#[derive(Error, Debug)]
pub enum DependencyError {
    /// A required tool is absent and installation was skipped.
    #[error("required tool '{tool}' is not installed (rerun without --skip-deps or install it manually)")]
    Missing {
        /// Binary name of the missing tool.
        tool: String,
    },

    /// The user declined to install a required tool.
    #[error("required tool '{tool}' was not installed: installation declined")]
    Declined {
        /// Binary name of the declined tool.
        tool: String,
    },

    /// The package manager failed to install a tool.
    #[error("failed to install '{tool}' with {manager}")]
    InstallFailed {
        /// Binary name of the tool.
        tool: String,
        /// Package manager that was used.
        manager: String,
        /// Underlying failure.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Errors raised when existing filesystem state cannot be replaced safely.
#[derive(Error, Debug)]
pub enum StateConflictError {
    /// A real configuration directory exists but was not backed up.
    #[error(
        "{} exists and was not backed up; move it aside manually or rerun with --no-backup to replace it",
        path.display()
    )]
    UnbackedConfiguration {
        /// Path of the existing configuration.
        path: PathBuf,
    },

    /// After linking, the target is neither a link into the source tree nor a directory.
    #[error("unexpected state at {}: {reason}", path.display())]
    UnexpectedTarget {
        /// Path that was checked.
        path: PathBuf,
        /// What was found instead.
        reason: String,
    },
}

/// Errors that arise from loading `agent-setup.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("IO error reading config file {}: {source}", path.display())]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for the expected schema.
    #[error("invalid TOML in {}: {message}", path.display())]
    Parse {
        /// Path to the offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A setting has a value the installer refuses to use.
    #[error("invalid setting '{field}': {reason}")]
    Invalid {
        /// Name of the setting.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Find the first [`SetupError`] in an error chain.
#[must_use]
pub fn find_setup_error(err: &anyhow::Error) -> Option<&SetupError> {
    err.chain().find_map(|e| e.downcast_ref::<SetupError>())
}

/// Render a fatal error for the terminal: the full chain, prefixed with the
/// [`ErrorKind`] label when a [`SetupError`] is part of it.
#[must_use]
pub fn describe(err: &anyhow::Error) -> String {
    match find_setup_error(err) {
        Some(setup) => format!("{} error: {err:#}", setup.kind()),
        None => format!("{err:#}"),
    }
}
