use anyhow::Result;

use super::CommandSetup;
use crate::exec::Executor;
use crate::logging::Logger;
use crate::stages::validate::run_checks;

/// Run the validate command: report on the installed state without changing it.
///
/// # Errors
///
/// Returns [`SetupError::ValidationFailed`](crate::error::SetupError::ValidationFailed)
/// if any required check fails.
pub fn run(setup: &CommandSetup, log: &Logger, executor: &dyn Executor) -> Result<()> {
    log.stage("Validate installation");
    let report = run_checks(&setup.paths, &setup.settings, executor);
    report.log(log);
    report.into_result()?;
    Ok(())
}
