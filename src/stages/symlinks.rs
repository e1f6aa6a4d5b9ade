use anyhow::{Result, bail};

use super::{Context, Stage, StageResult};
use crate::error::{DependencyError, SetupError, StateConflictError};
use crate::resources::fs::{exists_or_dangling, is_symlink, remove_path};
use crate::resources::stow::StowResource;
use crate::resources::{Applicable as _, Resource as _, ResourceChange, ResourceState};

/// Link the repository's configuration tree into `$HOME` with stow.
#[derive(Debug)]
pub struct InstallConfiguration;

impl Stage for InstallConfiguration {
    fn name(&self) -> &'static str {
        "Install configuration"
    }

    fn run(&self, ctx: &Context) -> Result<StageResult> {
        let paths = &ctx.paths;
        let resource = StowResource::new(
            paths.stow_dir().to_path_buf(),
            paths.home.clone(),
            ctx.settings.stow_package.clone(),
            paths.config_dir.clone(),
            paths.source_tree.clone(),
            ctx.executor.as_ref(),
        );

        if !paths.source_tree.is_dir() {
            bail!(
                "configuration source {} does not exist",
                paths.source_tree.display()
            );
        }
        if !ctx.executor.which("stow") {
            if ctx.dry_run() {
                ctx.log.warn("stow is not installed yet");
            } else {
                return Err(SetupError::from(DependencyError::Missing {
                    tool: "stow".to_string(),
                })
                .into());
            }
        }

        match resource.current_state()? {
            ResourceState::Correct => ctx.log.debug("configuration already linked; relinking"),
            state => ctx.log.debug(&format!("{}: {state:?}", paths.config_dir.display())),
        }

        clear_target(ctx)?;

        if ctx.dry_run() {
            ctx.log
                .dry_run(&format!("would run: stow {}", resource.stow_args().join(" ")));
            return Ok(StageResult::DryRun);
        }

        match resource.apply()? {
            ResourceChange::Skipped { reason } => ctx.log.warn(&reason),
            ResourceChange::AlreadyCorrect => {
                ctx.log
                    .success(&format!("already linked {}", resource.description()));
            }
            ResourceChange::Applied => {
                ctx.log.success(&format!("linked {}", resource.description()));
            }
        }

        resource.verify()?;
        Ok(StageResult::Ok)
    }
}

/// Remove whatever occupies the configuration path so stow can link it.
///
/// Symlinks are always removed. A real directory or file is removed only when
/// it was backed up earlier in this run or backups were waived.
fn clear_target(ctx: &Context) -> Result<()> {
    let target = &ctx.paths.config_dir;

    if is_symlink(target) {
        if ctx.dry_run() {
            ctx.log
                .dry_run(&format!("would remove symlink {}", target.display()));
        } else {
            remove_path(target)?;
            ctx.log
                .debug(&format!("removed symlink {}", target.display()));
        }
        return Ok(());
    }

    if !exists_or_dangling(target) {
        return Ok(());
    }

    // A dry run never backs anything up, so only the flags matter there.
    let backed_up = ctx.backup().is_some() || (ctx.dry_run() && !ctx.options.no_backup);
    if !backed_up && !ctx.options.no_backup {
        return Err(SetupError::from(StateConflictError::UnbackedConfiguration {
            path: target.clone(),
        })
        .into());
    }

    if ctx.dry_run() {
        ctx.log
            .dry_run(&format!("would remove {}", target.display()));
        return Ok(());
    }

    if ctx.options.no_backup {
        ctx.log
            .warn(&format!("removing {} without a backup", target.display()));
    }
    remove_path(target)?;
    ctx.log.debug(&format!("removed {}", target.display()));
    Ok(())
}
