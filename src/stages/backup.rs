use anyhow::Result;

use super::{Context, Stage, StageResult};
use crate::resources::backup::{backup_path_for, create_backup, timestamp_now};
use crate::resources::fs::{exists_or_dangling, is_symlink};

/// Copy an existing configuration directory aside before it is replaced.
#[derive(Debug)]
pub struct BackupConfiguration;

impl Stage for BackupConfiguration {
    fn name(&self) -> &'static str {
        "Back up configuration"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.options.no_backup
    }

    fn run(&self, ctx: &Context) -> Result<StageResult> {
        let target = &ctx.paths.config_dir;

        if !exists_or_dangling(target) {
            ctx.log
                .info(&format!("{} does not exist, nothing to back up", target.display()));
            return Ok(StageResult::Ok);
        }
        if is_symlink(target) {
            ctx.log.info(&format!(
                "{} is already a symlink, keeping it",
                target.display()
            ));
            return Ok(StageResult::Ok);
        }

        let timestamp = timestamp_now();
        if ctx.dry_run() {
            ctx.log.dry_run(&format!(
                "would back up {} to {}",
                target.display(),
                backup_path_for(target, &timestamp).display()
            ));
            return Ok(StageResult::DryRun);
        }

        if let Some(backup) = create_backup(target, &timestamp)? {
            ctx.log.success(&format!("backed up to {}", backup.display()));
            ctx.record_backup(backup);
        }
        Ok(StageResult::Ok)
    }
}
