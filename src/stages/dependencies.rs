use anyhow::Result;

use super::{Context, Stage, StageResult};
use crate::error::{DependencyError, EnvironmentError, SetupError};
use crate::resources::package::{PackageManager, PackageResource};
use crate::resources::{Applicable as _, Resource as _};

/// External tools the installer relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// GNU Stow, the symlink manager.
    Stow,
    /// `envsubst` from gettext, used for template substitution.
    Envsubst,
    /// Node.js, which also provides `npm`.
    Node,
}

impl Tool {
    /// Every tool, in install order.
    pub const ALL: [Self; 3] = [Self::Stow, Self::Envsubst, Self::Node];

    /// Binary looked up on `PATH`.
    #[must_use]
    pub const fn binary(self) -> &'static str {
        match self {
            Self::Stow => "stow",
            Self::Envsubst => "envsubst",
            Self::Node => "node",
        }
    }

    /// Whether the install cannot proceed without this tool.
    #[must_use]
    pub const fn required(self) -> bool {
        !matches!(self, Self::Node)
    }

    /// Packages that provide the tool under `manager`.
    #[must_use]
    pub const fn packages(self, manager: PackageManager) -> &'static [&'static str] {
        match (self, manager) {
            (Self::Stow, _) => &["stow"],
            (Self::Envsubst, PackageManager::Apt) => &["gettext-base"],
            (Self::Envsubst, _) => &["gettext"],
            (Self::Node, PackageManager::Homebrew) => &["node"],
            (Self::Node, PackageManager::Apt | PackageManager::Pacman) => &["nodejs", "npm"],
            (Self::Node, PackageManager::Dnf) => &["nodejs"],
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary())
    }
}

/// Check for and install stow, gettext and Node.js.
#[derive(Debug)]
pub struct InstallDependencies;

impl Stage for InstallDependencies {
    fn name(&self) -> &'static str {
        "Install dependencies"
    }

    fn run(&self, ctx: &Context) -> Result<StageResult> {
        if ctx.options.skip_deps {
            ctx.log.info("--skip-deps: checking required tools only");
            check_present(ctx)?;
            return Ok(StageResult::Ok);
        }

        let manager = PackageManager::detect(&ctx.platform, ctx.executor.as_ref());
        if let Some(manager) = manager {
            ctx.log.debug(&format!("package manager: {manager}"));
        }

        let mut deferred = Vec::new();
        for tool in Tool::ALL {
            if !install_tool(ctx, tool, manager)? {
                deferred.push(tool.binary());
            }
        }

        if deferred.is_empty() {
            Ok(StageResult::done(ctx))
        } else {
            Ok(StageResult::Skipped(format!(
                "{} not installed",
                deferred.join(", ")
            )))
        }
    }
}

/// Make sure `tool` is present. Returns `false` when an optional tool was
/// left uninstalled because the user declined.
fn install_tool(ctx: &Context, tool: Tool, manager: Option<PackageManager>) -> Result<bool> {
    let Some(manager) = manager else {
        if ctx.executor.which(tool.binary()) {
            ctx.log.success(&format!("{tool} is installed"));
            return Ok(true);
        }
        return Err(SetupError::from(EnvironmentError::NoPackageManager {
            tool: tool.binary().to_string(),
        })
        .into());
    };

    let resource = PackageResource::new(
        tool.binary().to_string(),
        tool.packages(manager).iter().map(|p| (*p).to_string()).collect(),
        manager,
        ctx.executor.as_ref(),
    );

    if !resource.needs_change()? {
        ctx.log.success(&format!("{tool} is installed"));
        return Ok(true);
    }

    if ctx.dry_run() {
        ctx.log.dry_run(&format!(
            "would install {tool}: {}",
            resource.command_line()
        ));
        return Ok(true);
    }

    if !ctx.confirm(&format!("Install {tool} with {manager}?")) {
        if tool.required() {
            return Err(SetupError::from(DependencyError::Declined {
                tool: tool.binary().to_string(),
            })
            .into());
        }
        ctx.log
            .warn(&format!("{tool} not installed; some features may be unavailable"));
        return Ok(false);
    }

    ctx.log.info(&format!("installing {}", resource.description()));
    resource.apply().map_err(|e| {
        SetupError::from(DependencyError::InstallFailed {
            tool: tool.binary().to_string(),
            manager: manager.to_string(),
            source: e.into(),
        })
    })?;
    ctx.log.success(&format!("{tool} installed"));
    Ok(true)
}

/// `--skip-deps`: assert required tools exist without installing anything.
fn check_present(ctx: &Context) -> Result<()> {
    for tool in Tool::ALL {
        if ctx.executor.which(tool.binary()) {
            ctx.log.success(&format!("{tool} is installed"));
        } else if tool.required() {
            return Err(SetupError::from(DependencyError::Missing {
                tool: tool.binary().to_string(),
            })
            .into());
        } else {
            ctx.log
                .warn(&format!("optional tool {tool} is not installed"));
        }
    }
    Ok(())
}
