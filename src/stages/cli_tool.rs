use anyhow::{Context as _, Result};
use std::os::unix::fs::MetadataExt as _;
use std::path::Path;

use super::{Context, Stage, StageResult};

/// Install or upgrade the assistant CLI (Homebrew on macOS, npm on Linux).
#[derive(Debug)]
pub struct InstallCli;

impl Stage for InstallCli {
    fn name(&self) -> &'static str {
        "Install CLI"
    }

    fn run(&self, ctx: &Context) -> Result<StageResult> {
        let binary = &ctx.settings.cli.binary;
        let present = ctx.executor.which(binary);
        if present {
            ctx.log.info(&format!("{binary} is installed"));
        } else {
            ctx.log.info(&format!("{binary} is not installed"));
        }

        if ctx.platform.is_macos() {
            install_with_brew(ctx, present)
        } else {
            install_with_npm(ctx, present)
        }
    }
}

fn install_with_brew(ctx: &Context, present: bool) -> Result<StageResult> {
    let cli = &ctx.settings.cli;
    if !ctx.executor.which("brew") {
        ctx.log.warn(&format!(
            "Homebrew not found; install {} manually",
            cli.brew_formula
        ));
        return Ok(StageResult::Skipped("brew not available".to_string()));
    }

    let mut steps: Vec<Vec<&str>> = Vec::new();
    if present {
        steps.push(vec!["upgrade", cli.brew_formula.as_str()]);
    } else {
        if let Some(tap) = &cli.brew_tap {
            steps.push(vec!["tap", tap.as_str()]);
        }
        steps.push(vec!["install", cli.brew_formula.as_str()]);
    }

    if ctx.dry_run() {
        for args in &steps {
            ctx.log
                .dry_run(&format!("would run: brew {}", args.join(" ")));
        }
        return Ok(StageResult::DryRun);
    }

    if let Some(declined) = ask(ctx, present) {
        return Ok(declined);
    }
    for args in &steps {
        run_step(ctx, None, "brew", args)?;
    }
    ctx.log.success(&format!(
        "{} {}",
        cli.binary,
        if present { "upgraded" } else { "installed" }
    ));
    Ok(StageResult::Ok)
}

fn install_with_npm(ctx: &Context, present: bool) -> Result<StageResult> {
    let cli = &ctx.settings.cli;
    if !ctx.executor.which("npm") {
        ctx.log.warn(&format!(
            "npm not found; install Node.js, then run: npm install -g {}",
            cli.npm_package
        ));
        return Ok(StageResult::Skipped("npm not available".to_string()));
    }

    let verb = if present { "update" } else { "install" };
    let args = [verb, "-g", cli.npm_package.as_str()];

    if ctx.dry_run() {
        ctx.log
            .dry_run(&format!("would run: npm {}", args.join(" ")));
        return Ok(StageResult::DryRun);
    }

    if let Some(declined) = ask(ctx, present) {
        return Ok(declined);
    }

    let mut elevate = None;
    if ctx.executor.is_root() {
        ctx.log.debug("running as root; npm needs no elevation");
    } else if let Some(prefix) = root_owned_npm_prefix(ctx) {
        if !ctx.confirm(&format!(
            "The global npm prefix {prefix} is owned by root. Run npm with sudo?"
        )) {
            ctx.log.warn(&format!(
                "skipping; run manually: sudo npm {}",
                args.join(" ")
            ));
            return Ok(StageResult::Skipped("elevation declined".to_string()));
        }
        elevate = Some("sudo");
    }

    run_step(ctx, elevate, "npm", &args)?;
    ctx.log.success(&format!(
        "{} {}",
        cli.binary,
        if present { "updated" } else { "installed" }
    ));
    Ok(StageResult::Ok)
}

/// Prompt to install or update. Returns the deferred result on decline.
fn ask(ctx: &Context, present: bool) -> Option<StageResult> {
    let binary = &ctx.settings.cli.binary;
    let (prompt, reason) = if present {
        (format!("Update {binary}?"), "update declined")
    } else {
        (format!("Install {binary}?"), "install declined")
    };
    if ctx.confirm(&prompt) {
        None
    } else {
        ctx.log.info(&format!("{binary}: {reason}"));
        Some(StageResult::Skipped(reason.to_string()))
    }
}

/// The global npm prefix, if it exists and belongs to root.
fn root_owned_npm_prefix(ctx: &Context) -> Option<String> {
    let result = ctx.executor.run_unchecked("npm", &["prefix", "-g"]).ok()?;
    if !result.success {
        return None;
    }
    let prefix = result.stdout.trim().to_string();
    if prefix.is_empty() {
        return None;
    }
    let owned_by_root = std::fs::metadata(Path::new(&prefix)).is_ok_and(|m| m.uid() == 0);
    owned_by_root.then_some(prefix)
}

fn run_step(ctx: &Context, elevate: Option<&str>, program: &str, args: &[&str]) -> Result<()> {
    let line = format!("{program} {}", args.join(" "));
    ctx.log.info(&format!(
        "running: {}{line}",
        elevate.map_or_else(String::new, |e| format!("{e} "))
    ));
    let result = match elevate {
        Some(wrapper) => {
            let mut full = vec![program];
            full.extend_from_slice(args);
            ctx.executor.run(wrapper, &full)
        }
        None => ctx.executor.run(program, args),
    };
    result.with_context(|| format!("{line} failed"))?;
    Ok(())
}
