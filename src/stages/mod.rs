//! Ordered installer stages and the fail-fast driver that runs them.
pub mod backup;
pub mod cli_tool;
mod context;
pub mod dependencies;
pub mod mcp;
pub mod symlinks;
pub mod validate;

pub use context::{Context, InstallOptions};

use anyhow::Result;

use crate::logging::StageStatus;

/// Result of a single stage execution.
///
/// # Examples
///
/// ```
/// use agent_setup::stages::StageResult;
///
/// let ok = StageResult::Ok;
/// let deferred = StageResult::Skipped("update declined".into());
/// let dry = StageResult::DryRun;
///
/// assert!(matches!(ok, StageResult::Ok));
/// assert!(matches!(deferred, StageResult::Skipped(_)));
/// assert!(matches!(dry, StageResult::DryRun));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageResult {
    /// Stage completed successfully.
    Ok,
    /// Stage deferred its work (declined prompt, unavailable channel).
    Skipped(String),
    /// Stage ran in dry-run mode.
    DryRun,
}

impl StageResult {
    /// `DryRun` when previewing, `Ok` otherwise.
    #[must_use]
    pub const fn done(ctx: &Context) -> Self {
        if ctx.dry_run() { Self::DryRun } else { Self::Ok }
    }
}

/// A named installer stage.
pub trait Stage: Send + Sync {
    /// Human-readable stage name.
    fn name(&self) -> &'static str;

    /// Whether this stage applies to the current options.
    fn should_run(&self, ctx: &Context) -> bool {
        let _ = ctx;
        true
    }

    /// Execute the stage.
    ///
    /// # Errors
    ///
    /// Returns an error for any fatal condition; the driver stops at the
    /// first one.
    fn run(&self, ctx: &Context) -> Result<StageResult>;
}

/// The install workflow, in execution order.
#[must_use]
pub fn all_install_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(dependencies::InstallDependencies),
        Box::new(backup::BackupConfiguration),
        Box::new(symlinks::InstallConfiguration),
        Box::new(cli_tool::InstallCli),
        Box::new(mcp::DeployMcpConfig),
        Box::new(validate::ValidateInstallation),
    ]
}

/// Execute a stage, recording the result in the logger.
///
/// # Errors
///
/// Returns the stage's error, wrapped with the stage name, after recording
/// it as failed.
pub fn execute(stage: &dyn Stage, ctx: &Context) -> Result<()> {
    if !stage.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping stage: {} (not applicable)", stage.name()));
        ctx.log
            .record_stage(stage.name(), StageStatus::NotApplicable, None);
        return Ok(());
    }

    ctx.log.stage(stage.name());

    match stage.run(ctx) {
        Ok(StageResult::Ok) => {
            ctx.log.record_stage(stage.name(), StageStatus::Ok, None);
        }
        Ok(StageResult::Skipped(reason)) => {
            ctx.log.info(&format!("deferred: {reason}"));
            ctx.log
                .record_stage(stage.name(), StageStatus::Skipped, Some(&reason));
        }
        Ok(StageResult::DryRun) => {
            ctx.log.record_stage(stage.name(), StageStatus::DryRun, None);
        }
        Err(e) => {
            // Reported once by the binary together with the exit code.
            ctx.log
                .record_stage(stage.name(), StageStatus::Failed, Some(&format!("{e}")));
            return Err(e.context(format!("{} failed", stage.name())));
        }
    }
    Ok(())
}

/// Run `stages` in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the error of the first failed stage; later stages do not run.
pub fn run_all<'a>(
    stages: impl IntoIterator<Item = &'a dyn Stage>,
    ctx: &Context,
) -> Result<()> {
    for stage in stages {
        execute(stage, ctx)?;
    }
    Ok(())
}
