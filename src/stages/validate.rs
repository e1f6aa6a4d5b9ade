//! Post-install verification. Checks are read-only and never remediate.
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

use super::{Context, Stage, StageResult};
use crate::config::{Paths, Settings};
use crate::error::SetupError;
use crate::exec::Executor;
use crate::logging::Log;

/// `${NAME}` left behind by template substitution.
static PLACEHOLDER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\$\{[A-Za-z_][A-Za-z0-9_]*\}"));

/// How much a failed check matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Failure fails the run.
    Required,
    /// Failure is reported as a warning only.
    Advisory,
}

/// Outcome of one validation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// What was verified.
    pub name: String,
    /// Whether a failure is fatal.
    pub severity: Severity,
    /// Whether the condition held.
    pub passed: bool,
    /// Extra context for a failure.
    pub detail: Option<String>,
}

impl Check {
    fn new(name: impl Into<String>, severity: Severity, passed: bool) -> Self {
        Self {
            name: name.into(),
            severity,
            passed,
            detail: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// All checks from one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Checks in the order they ran.
    pub checks: Vec<Check>,
}

impl ValidationReport {
    /// Number of checks that passed.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Required checks that failed.
    pub fn required_failures(&self) -> impl Iterator<Item = &Check> {
        self.checks
            .iter()
            .filter(|c| c.severity == Severity::Required && !c.passed)
    }

    /// Whether every required check passed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.required_failures().next().is_none()
    }

    /// Convert into the run's outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::ValidationFailed`] when a required check failed.
    pub fn into_result(self) -> Result<(), SetupError> {
        let failed = self.required_failures().count();
        if failed == 0 {
            return Ok(());
        }
        let total = self
            .checks
            .iter()
            .filter(|c| c.severity == Severity::Required)
            .count();
        Err(SetupError::ValidationFailed { failed, total })
    }

    /// Log every check and the `N/M checks passed` line.
    pub fn log(&self, log: &dyn Log) {
        for check in &self.checks {
            let detail = check
                .detail
                .as_ref()
                .map_or_else(String::new, |d| format!(": {d}"));
            match (check.passed, check.severity) {
                (true, _) => log.success(&check.name),
                (false, Severity::Advisory) => log.warn(&format!("{}{detail}", check.name)),
                (false, Severity::Required) => log.error(&format!("{}{detail}", check.name)),
            }
        }
        log.info(&format!(
            "{}/{} checks passed",
            self.passed(),
            self.checks.len()
        ));
    }
}

/// Distinct unresolved `${VAR}` placeholders in `text`, in order of appearance.
#[must_use]
pub fn unresolved_placeholders(text: &str) -> Vec<String> {
    let Ok(re) = PLACEHOLDER.as_ref() else {
        return Vec::new();
    };
    let mut found: Vec<String> = Vec::new();
    for m in re.find_iter(text) {
        if !found.iter().any(|f| f == m.as_str()) {
            found.push(m.as_str().to_string());
        }
    }
    found
}

/// Examine the installed state.
#[must_use]
pub fn run_checks(paths: &Paths, settings: &Settings, executor: &dyn Executor) -> ValidationReport {
    let mut checks = Vec::new();

    let config_dir = paths.config_dir.display();
    checks.push(Check::new(
        format!("configuration directory {config_dir} exists"),
        Severity::Required,
        paths.config_dir.is_dir(),
    ));

    let mcp = paths.mcp_config.display();
    let contents = std::fs::read_to_string(&paths.mcp_config);
    checks.push(Check::new(
        format!("MCP configuration {mcp} exists"),
        Severity::Required,
        paths.mcp_config.is_file(),
    ));

    match &contents {
        Ok(text) => {
            let leftover = unresolved_placeholders(text);
            let check = Check::new(
                "MCP configuration has no unresolved placeholders",
                Severity::Required,
                leftover.is_empty(),
            );
            checks.push(if leftover.is_empty() {
                check
            } else {
                check.with_detail(leftover.join(", "))
            });

            let parsed = serde_json::from_str::<serde_json::Value>(text);
            let check = Check::new(
                "MCP configuration is valid JSON",
                Severity::Required,
                parsed.is_ok(),
            );
            checks.push(match parsed {
                Ok(_) => check,
                Err(e) => check.with_detail(e.to_string()),
            });
        }
        Err(e) => {
            for name in [
                "MCP configuration has no unresolved placeholders",
                "MCP configuration is valid JSON",
            ] {
                checks.push(
                    Check::new(name, Severity::Required, false)
                        .with_detail(format!("cannot read {mcp}: {e}")),
                );
            }
        }
    }

    let binary = &settings.cli.binary;
    let cli = Check::new(
        format!("{binary} is on PATH"),
        Severity::Advisory,
        executor.which(binary),
    );
    checks.push(if cli.passed {
        cli
    } else {
        cli.with_detail("run the installer again or install it manually")
    });

    checks.push(Check::new(
        "stow is on PATH",
        Severity::Required,
        executor.which("stow"),
    ));

    ValidationReport { checks }
}

/// Re-check the final state and fail the run if a required check fails.
#[derive(Debug)]
pub struct ValidateInstallation;

impl Stage for ValidateInstallation {
    fn name(&self) -> &'static str {
        "Validate installation"
    }

    fn run(&self, ctx: &Context) -> Result<StageResult> {
        let report = run_checks(&ctx.paths, &ctx.settings, ctx.executor.as_ref());
        report.log(ctx.log.as_ref());

        if ctx.dry_run() {
            if !report.is_ok() {
                ctx.log
                    .info("dry run: checks reflect the current, unchanged state");
            }
            return Ok(StageResult::DryRun);
        }

        report.into_result()?;
        Ok(StageResult::Ok)
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::error::find_setup_error;
    use crate::resources::test_helpers::MockExecutor;
    use crate::stages::InstallOptions;
    use crate::stages::test_helpers::TestEnv;

    fn installed(env: &TestEnv, mcp: &str) {
        std::os::unix::fs::symlink(
            env.root.join("claude/.claude"),
            env.home.join(".claude"),
        )
        .unwrap();
        std::fs::write(env.home.join(".mcp.json"), mcp).unwrap();
    }

    fn tools(which: &[&str]) -> TestEnv {
        TestEnv::new().with_executor(MockExecutor::new().with_which(which))
    }

    #[test]
    fn placeholders_are_found_once_each() {
        let found = unresolved_placeholders(
            r#"{"a": "${GITHUB_TOKEN}", "b": "${HOME}", "c": "${GITHUB_TOKEN}", "d": "$PLAIN"}"#,
        );
        assert_eq!(found, vec!["${GITHUB_TOKEN}", "${HOME}"]);
    }

    #[test]
    fn no_placeholders_in_rendered_json() {
        assert!(unresolved_placeholders(r#"{"home": "/home/u", "cost": "$5"}"#).is_empty());
    }

    #[test]
    fn successful_install_passes_everything() {
        let env = tools(&["stow", "claude"]);
        installed(&env, r#"{"mcpServers": {}}"#);

        let report = run_checks(&env.paths(), &env.settings, &*env.executor);
        assert_eq!(report.checks.len(), 6);
        assert_eq!(report.passed(), 6);
        assert!(report.is_ok());
    }

    #[test]
    fn missing_cli_is_only_advisory() {
        let env = tools(&["stow"]);
        installed(&env, "{}");

        let report = run_checks(&env.paths(), &env.settings, &*env.executor);
        assert_eq!(report.passed(), 5);
        assert!(report.is_ok());
    }

    #[test]
    fn unresolved_placeholder_fails() {
        let env = tools(&["stow"]);
        installed(&env, r#"{"token": "${API_KEY}"}"#);

        let report = run_checks(&env.paths(), &env.settings, &*env.executor);
        let failures: Vec<_> = report.required_failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].detail.as_deref(), Some("${API_KEY}"));
    }

    #[test]
    fn invalid_json_fails() {
        let env = tools(&["stow"]);
        installed(&env, "{ not json");

        let report = run_checks(&env.paths(), &env.settings, &*env.executor);
        assert!(!report.is_ok());
        assert!(
            report
                .required_failures()
                .any(|c| c.name == "MCP configuration is valid JSON")
        );
    }

    #[test]
    fn empty_home_fails_required_checks() {
        let env = tools(&[]);
        let report = run_checks(&env.paths(), &env.settings, &*env.executor);
        assert_eq!(report.passed(), 0);
        assert_eq!(report.required_failures().count(), 5);

        match report.into_result() {
            Err(SetupError::ValidationFailed { failed, total }) => {
                assert_eq!((failed, total), (5, 5));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn stage_fails_with_validation_error() {
        let env = tools(&["stow"]);
        let err = ValidateInstallation.run(&env.context()).unwrap_err();
        assert!(matches!(
            find_setup_error(&err),
            Some(SetupError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn stage_in_dry_run_only_reports() {
        let env = tools(&[]).with_options(InstallOptions {
            dry_run: true,
            ..InstallOptions::default()
        });
        assert_eq!(
            ValidateInstallation.run(&env.context()).unwrap(),
            StageResult::DryRun
        );
    }
}
