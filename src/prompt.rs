//! Confirmation prompts behind an injectable [`Confirm`] capability.
use std::io::{self, IsTerminal as _, Write as _};

/// Answers yes/no questions on behalf of the user.
#[cfg_attr(test, mockall::automock)]
pub trait Confirm: Send + Sync {
    /// Ask `prompt`; `true` means the user agreed.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Interactive prompt on the controlling terminal.
///
/// When stdin or stderr is not a terminal the prompt is answered "no"
/// without blocking.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
            tracing::warn!("non-interactive session, declining: {prompt}");
            return false;
        }
        ask(prompt).unwrap_or(false)
    }
}

fn ask(prompt: &str) -> io::Result<bool> {
    let mut stderr = io::stderr();
    write!(stderr, "\x1b[1;36m?\x1b[0m {prompt} [y/N] ")?;
    stderr.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(parse_answer(&input))
}

/// Interpret a typed answer. Anything other than `y`/`yes` is a refusal.
fn parse_answer(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Deterministic answer for every prompt (`--yes`, tests, CI).
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!("auto-answering {} to: {prompt}", if self.0 { "yes" } else { "no" });
        self.0
    }
}
