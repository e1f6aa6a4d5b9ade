use anyhow::Result;
use std::sync::Arc;

use super::CommandSetup;
use crate::cli::InstallOpts;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger};
use crate::prompt::{Confirm, FixedAnswer, TerminalConfirm};
use crate::stages::{self, Context, InstallOptions};

/// Run the install command.
///
/// # Errors
///
/// Returns the error of the first stage that fails.
pub fn run(setup: CommandSetup, opts: &InstallOpts, log: Arc<Logger>) -> Result<()> {
    let confirm: Arc<dyn Confirm> = if opts.yes {
        Arc::new(FixedAnswer(true))
    } else {
        Arc::new(TerminalConfirm)
    };
    run_with(setup, opts.options(), log, Arc::new(SystemExecutor), confirm)
}

/// Run every install stage in order with explicit capabilities, then print
/// the summary.
///
/// # Errors
///
/// Returns the error of the first stage that fails; later stages do not run.
pub fn run_with(
    setup: CommandSetup,
    options: InstallOptions,
    log: Arc<Logger>,
    executor: Arc<dyn Executor>,
    confirm: Arc<dyn Confirm>,
) -> Result<()> {
    log.info(&format!(
        "agent-setup {} on {}",
        crate::VERSION,
        setup.platform.os
    ));
    if options.dry_run {
        log.info("dry run: no changes will be made");
    }

    let ctx = Context::new(
        Arc::new(setup.settings),
        Arc::new(setup.paths),
        Arc::new(setup.platform),
        options,
        Arc::clone(&log) as Arc<dyn Log>,
        executor,
        confirm,
    );

    let all = stages::all_install_stages();
    let result = stages::run_all(all.iter().map(AsRef::as_ref), &ctx);
    log.print_summary();
    result
}
