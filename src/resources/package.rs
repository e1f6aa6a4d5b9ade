//! Package installation resource.
use anyhow::Result;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::Executor;
use crate::platform::Platform;

/// Supported package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// Homebrew (macOS).
    Homebrew,
    /// Debian/Ubuntu (apt-get).
    Apt,
    /// Fedora/RHEL (dnf).
    Dnf,
    /// Arch Linux (pacman).
    Pacman,
}

/// Linux package managers in detection order.
const LINUX_MANAGERS: [PackageManager; 3] = [
    PackageManager::Apt,
    PackageManager::Dnf,
    PackageManager::Pacman,
];

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Homebrew => write!(f, "brew"),
            Self::Apt => write!(f, "apt"),
            Self::Dnf => write!(f, "dnf"),
            Self::Pacman => write!(f, "pacman"),
        }
    }
}

impl PackageManager {
    /// Executable looked up on `PATH` to decide whether the manager exists.
    #[must_use]
    pub const fn binary(self) -> &'static str {
        match self {
            Self::Homebrew => "brew",
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
        }
    }

    /// Pick the package manager for `platform`.
    ///
    /// macOS uses Homebrew; Linux uses the first of apt-get, dnf, pacman
    /// found on `PATH`. Returns `None` when nothing usable is installed.
    #[must_use]
    pub fn detect(platform: &Platform, executor: &dyn Executor) -> Option<Self> {
        if platform.is_macos() {
            return executor
                .which(Self::Homebrew.binary())
                .then_some(Self::Homebrew);
        }
        LINUX_MANAGERS
            .into_iter()
            .find(|m| executor.which(m.binary()))
    }

    /// Program and arguments that install `packages`.
    #[must_use]
    pub fn install_command<'a>(self, packages: &[&'a str]) -> (&'static str, Vec<&'a str>) {
        let (program, mut args) = match self {
            Self::Homebrew => ("brew", vec!["install"]),
            Self::Apt => ("sudo", vec!["apt-get", "install", "-y"]),
            Self::Dnf => ("sudo", vec!["dnf", "install", "-y"]),
            Self::Pacman => ("sudo", vec!["pacman", "-S", "--needed", "--noconfirm"]),
        };
        args.extend_from_slice(packages);
        (program, args)
    }
}

/// A tool that is provided by one or more system packages.
///
/// The tool is present when its binary resolves on `PATH`; applying the
/// resource installs its packages with the chosen manager.
#[derive(Debug)]
pub struct PackageResource<'a> {
    /// Binary that proves the tool is installed.
    pub tool: String,
    /// Packages that provide the tool for `manager`.
    pub packages: Vec<String>,
    /// Package manager to use.
    pub manager: PackageManager,
    /// Executor for running package manager commands.
    executor: &'a dyn Executor,
}

impl<'a> PackageResource<'a> {
    /// Create a new package resource.
    #[must_use]
    pub const fn new(
        tool: String,
        packages: Vec<String>,
        manager: PackageManager,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            tool,
            packages,
            manager,
            executor,
        }
    }

    /// The full install command line, for logs and dry runs.
    #[must_use]
    pub fn command_line(&self) -> String {
        let packages: Vec<&str> = self.packages.iter().map(String::as_str).collect();
        let (program, args) = self.manager.install_command(&packages);
        format!("{program} {}", args.join(" "))
    }
}

impl Applicable for PackageResource<'_> {
    fn description(&self) -> String {
        format!("{} ({})", self.tool, self.manager)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let packages: Vec<&str> = self.packages.iter().map(String::as_str).collect();
        let (program, args) = self.manager.install_command(&packages);
        self.executor.run(program, &args)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for PackageResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        if self.executor.which(&self.tool) {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Missing)
        }
    }
}
