use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use agent_setup::cli::{Cli, Command};
use agent_setup::commands::{self, CommandSetup};
use agent_setup::error::{self, SetupError, find_setup_error};
use agent_setup::exec::SystemExecutor;
use agent_setup::logging::{self, Logger};
use agent_setup::platform::Platform;

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();

    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help and version go to stdout and are not failures.
            let code = u8::from(e.use_stderr());
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    if args.command == Some(Command::Version) {
        println!("agent-setup {}", agent_setup::VERSION);
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", error::describe(&e));
            ExitCode::from(find_setup_error(&e).map_or(1, SetupError::exit_code))
        }
    }
}

fn run(args: &Cli) -> Result<()> {
    let command = match args.command {
        Some(Command::Validate) => "validate",
        _ => "install",
    };

    let platform = match Platform::detect() {
        Ok(platform) => platform,
        Err(e) => {
            logging::init_subscriber(args.verbose, None);
            return Err(SetupError::from(e).into());
        }
    };

    logging::init_subscriber(args.verbose, Some(command));
    let log = Arc::new(Logger::new(command));
    let setup = CommandSetup::init(&args.global, platform, &log)?;

    match args.command {
        Some(Command::Validate) => commands::validate::run(&setup, &log, &SystemExecutor),
        _ => commands::install::run(setup, &args.install, log),
    }
}
