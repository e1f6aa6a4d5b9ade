use anyhow::{Context as _, Result, bail};

use super::{Context, Stage, StageResult};

/// Render the MCP configuration by running the repository's setup script.
#[derive(Debug)]
pub struct DeployMcpConfig;

impl Stage for DeployMcpConfig {
    fn name(&self) -> &'static str {
        "Deploy MCP configuration"
    }

    fn run(&self, ctx: &Context) -> Result<StageResult> {
        let paths = &ctx.paths;
        let script = &paths.mcp_setup_script;
        if !script.is_file() {
            bail!("MCP setup script {} not found", script.display());
        }
        if !paths.mcp_template.is_file() {
            ctx.log.warn(&format!(
                "MCP template {} not found",
                paths.mcp_template.display()
            ));
        }

        let script_arg = script.display().to_string();
        if ctx.dry_run() {
            ctx.log.dry_run(&format!(
                "would run: bash {script_arg} (writing {})",
                paths.mcp_config.display()
            ));
            return Ok(StageResult::DryRun);
        }

        let home = paths.home.display().to_string();
        let config = paths.mcp_config.display().to_string();
        let template = paths.mcp_template.display().to_string();
        let env = [
            ("HOME", home.as_str()),
            ("MCP_CONFIG_PATH", config.as_str()),
            ("MCP_TEMPLATE_PATH", template.as_str()),
        ];

        ctx.log.info(&format!("running {script_arg}"));
        let result = ctx
            .executor
            .run_in_with_env(&paths.root, "bash", &[&script_arg], &env)
            .context("MCP setup script failed")?;
        for line in result.stdout.lines().filter(|l| !l.trim().is_empty()) {
            ctx.log.debug(line);
        }

        if paths.mcp_config.is_file() {
            ctx.log
                .success(&format!("wrote {}", paths.mcp_config.display()));
        } else {
            ctx.log.warn(&format!(
                "setup script finished but {} is missing",
                paths.mcp_config.display()
            ));
        }
        Ok(StageResult::Ok)
    }
}
