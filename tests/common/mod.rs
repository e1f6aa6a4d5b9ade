// Shared helpers for integration tests.
//
// Provides a temporary repository and home directory plus a fake system
// executor that simulates stow, package managers, npm and the MCP setup
// script on the filesystem, so the full install pipeline can run without
// touching the host.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};

use agent_setup::commands::{CommandSetup, install};
use agent_setup::config::{Paths, Settings};
use agent_setup::exec::{ExecResult, Executor};
use agent_setup::logging::Logger;
use agent_setup::platform::{Os, Platform};
use agent_setup::prompt::Confirm;
use agent_setup::stages::InstallOptions;

/// MCP template shipped in the test repository.
pub const MCP_TEMPLATE: &str = r#"{"mcpServers": {"files": {"command": "npx", "args": ["${HOME}"]}}}"#;

/// Binary each simulated package installs.
fn binary_for_package(package: &str) -> &str {
    match package {
        "gettext-base" | "gettext" => "envsubst",
        "nodejs" => "node",
        other => other,
    }
}

fn ok(stdout: &str, stderr: &str) -> ExecResult {
    ExecResult {
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        success: true,
        code: Some(0),
    }
}

/// Simulated host: tools on `PATH`, stow, package managers, npm, and the MCP
/// setup script all act on the real temporary filesystem.
#[derive(Debug)]
pub struct FakeSystem {
    available: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    failing: HashSet<String>,
    npm_prefix: PathBuf,
    cli_binary: String,
}

impl FakeSystem {
    /// A host where `tools` are already on `PATH`.
    pub fn with_tools(tools: &[&str], npm_prefix: &Path) -> Self {
        Self {
            available: Mutex::new(tools.iter().map(|t| (*t).to_string()).collect()),
            calls: Mutex::new(Vec::new()),
            failing: HashSet::new(),
            npm_prefix: npm_prefix.to_path_buf(),
            cli_binary: Settings::default().cli.binary,
        }
    }

    /// Make every invocation of `program` exit non-zero.
    pub fn failing(mut self, program: &str) -> Self {
        self.failing.insert(program.to_string());
        self
    }

    /// Every command line run so far, as `program arg1 arg2`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Whether any command line started with `prefix`.
    pub fn ran(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    fn record(&self, program: &str, args: &[&str]) {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().expect("calls lock").push(line);
    }

    fn provide(&self, binary: &str) {
        self.available
            .lock()
            .expect("available lock")
            .insert(binary.to_string());
    }

    fn dispatch(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        if self.failing.contains(program) {
            bail!("{program} failed (exit 1): simulated failure");
        }
        match program {
            "sudo" => match args.split_first() {
                Some((inner, rest)) => self.dispatch(inner, rest),
                None => bail!("sudo: no command"),
            },
            "stow" => self.stow(args),
            "apt-get" | "dnf" | "pacman" | "brew" => {
                let packages = args
                    .iter()
                    .filter(|a| !a.starts_with('-') && !matches!(**a, "install" | "upgrade"));
                for package in packages {
                    self.provide(binary_for_package(package));
                }
                Ok(ok("", ""))
            }
            "npm" => {
                self.provide(&self.cli_binary);
                Ok(ok("added 1 package\n", ""))
            }
            _ => Ok(ok("", "")),
        }
    }

    /// `stow -v -d <dir> -t <target> <package>`: link each top-level entry
    /// of the package into the target, refusing to overwrite real files.
    fn stow(&self, args: &[&str]) -> Result<ExecResult> {
        let value = |flag: &str| {
            args.iter()
                .position(|a| *a == flag)
                .and_then(|i| args.get(i + 1))
                .map(PathBuf::from)
        };
        let (Some(dir), Some(target), Some(package)) = (value("-d"), value("-t"), args.last())
        else {
            bail!("stow: bad arguments {args:?}");
        };

        let mut report = String::new();
        for entry in std::fs::read_dir(dir.join(package))? {
            let entry = entry?;
            let link = target.join(entry.file_name());
            if link.is_symlink() {
                continue;
            }
            if link.exists() {
                bail!(
                    "stow failed (exit 1): existing target is not owned by stow: {}",
                    link.display()
                );
            }
            std::os::unix::fs::symlink(entry.path(), &link)?;
            report.push_str(&format!("LINK: {} => {}\n", link.display(), entry.path().display()));
        }
        Ok(ok("", &report))
    }
}

impl Executor for FakeSystem {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        self.record(program, args);
        self.dispatch(program, args)
    }

    /// The MCP setup script: render the template into `MCP_CONFIG_PATH`,
    /// substituting `${HOME}` only.
    fn run_in_with_env(
        &self,
        _dir: &Path,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<ExecResult> {
        self.record(program, args);
        if self.failing.contains(program) {
            bail!("{program} failed (exit 1): simulated failure");
        }
        let var = |name: &str| {
            env.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_string())
        };
        let (Some(home), Some(config), Some(template)) = (
            var("HOME"),
            var("MCP_CONFIG_PATH"),
            var("MCP_TEMPLATE_PATH"),
        ) else {
            bail!("setup script: missing environment");
        };
        let rendered = std::fs::read_to_string(template)?.replace("${HOME}", &home);
        std::fs::write(&config, rendered)?;
        Ok(ok(&format!("wrote {config}\n"), ""))
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        self.record(program, args);
        if program == "npm" && args == ["prefix", "-g"] {
            return Ok(ok(&format!("{}\n", self.npm_prefix.display()), ""));
        }
        Ok(ok("", ""))
    }

    fn which(&self, program: &str) -> bool {
        self.available
            .lock()
            .expect("available lock")
            .contains(program)
    }

    fn is_root(&self) -> bool {
        false
    }
}

/// Confirmation double that remembers every prompt.
#[derive(Debug)]
pub struct RecordingConfirm {
    answer: bool,
    asked: Mutex<Vec<String>>,
}

impl RecordingConfirm {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().expect("asked lock").clone()
    }
}

impl Confirm for RecordingConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        self.asked.lock().expect("asked lock").push(prompt.to_string());
        self.answer
    }
}

/// An isolated repository and home directory backed by a [`tempfile::TempDir`].
pub struct TestRepo {
    dir: tempfile::TempDir,
    /// Repository root (Stow directory).
    pub root: PathBuf,
    /// Home directory (Stow target).
    pub home: PathBuf,
}

impl TestRepo {
    /// Repository with a configuration tree, an MCP template, a setup script,
    /// and an empty home directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = dir.path().join("repo");
        let home = dir.path().join("home");

        let tree = root.join("claude/.claude");
        std::fs::create_dir_all(tree.join("commands")).expect("create config tree");
        std::fs::write(tree.join("settings.json"), "{}\n").expect("write settings.json");
        std::fs::create_dir_all(root.join("mcp")).expect("create mcp dir");
        std::fs::write(root.join("mcp/mcp.json.template"), MCP_TEMPLATE).expect("write template");
        std::fs::create_dir_all(root.join("scripts")).expect("create scripts dir");
        std::fs::write(root.join("scripts/setup-mcp.sh"), "#!/usr/bin/env bash\n")
            .expect("write setup script");
        std::fs::create_dir_all(&home).expect("create home");
        std::fs::create_dir_all(dir.path().join("npm-prefix")).expect("create npm prefix");

        Self { dir, root, home }
    }

    /// Every tool the installer looks for, already present.
    pub fn complete_system(&self) -> FakeSystem {
        FakeSystem::with_tools(
            &["apt-get", "stow", "envsubst", "node", "npm", "claude"],
            &self.npm_prefix(),
        )
    }

    /// A directory standing in for `npm prefix -g`.
    pub fn npm_prefix(&self) -> PathBuf {
        self.dir.path().join("npm-prefix")
    }

    /// Installed configuration directory.
    pub fn config_dir(&self) -> PathBuf {
        self.home.join(".claude")
    }

    /// Rendered MCP configuration.
    pub fn mcp_config(&self) -> PathBuf {
        self.home.join(".mcp.json")
    }

    /// Source tree the configuration directory should link into.
    pub fn source_tree(&self) -> PathBuf {
        self.root.join("claude/.claude")
    }

    /// Put a real, user-authored configuration directory in `$HOME`.
    pub fn seed_existing_config(&self) {
        std::fs::create_dir_all(self.config_dir()).expect("create existing config");
        std::fs::write(self.config_dir().join("notes.md"), "keep me\n")
            .expect("write existing file");
    }

    /// Backup copies sitting next to the configuration directory.
    pub fn backups(&self) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = std::fs::read_dir(&self.home)
            .expect("read home")
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(".claude.backup."))
            })
            .collect();
        found.sort();
        found
    }

    /// Command setup for a Linux host rooted at this repository.
    pub fn setup(&self) -> CommandSetup {
        let settings = Settings::default();
        let paths = Paths::resolve(&settings, &self.home, &self.root);
        CommandSetup::new(Platform::new(Os::Linux), settings, paths)
    }

    /// Run the whole install pipeline against `system`.
    pub fn install(
        &self,
        options: InstallOptions,
        system: &Arc<FakeSystem>,
        confirm: Arc<dyn Confirm>,
    ) -> (Result<()>, Arc<Logger>) {
        let log = Arc::new(Logger::console_only());
        let result = install::run_with(
            self.setup(),
            options,
            Arc::clone(&log),
            Arc::clone(system) as Arc<dyn Executor>,
            confirm,
        );
        (result, log)
    }
}
