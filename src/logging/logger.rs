//! Structured logger with dry-run awareness and summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET, SUCCESS_TARGET};
use super::types::{Log, StageEntry, StageStatus};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness and summary collection.
///
/// Output goes through [`tracing`]; the subscriber installed by
/// [`init_subscriber`](super::subscriber::init_subscriber) decides where it
/// lands.
#[derive(Debug)]
pub struct Logger {
    stages: Mutex<Vec<StageEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger for `command`.
    ///
    /// Only remembers the log file path for the summary; the file itself is
    /// created by the subscriber.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            stages: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Create a logger that does not mention a log file in its summary.
    #[must_use]
    pub const fn console_only() -> Self {
        Self {
            stages: Mutex::new(Vec::new()),
            log_file: None,
        }
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a success message.
    pub fn success(&self, msg: &str) {
        tracing::info!(target: SUCCESS_TARGET, "{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record a stage result for the summary.
    pub fn record_stage(&self, name: &str, status: StageStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.stages.lock() {
            guard.push(StageEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Snapshot of all recorded stage entries.
    #[must_use]
    pub fn stage_entries(&self) -> Vec<StageEntry> {
        self.stages.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Count the number of failed stages.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.stages.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|t| t.status == StageStatus::Failed)
                .count()
        })
    }

    /// Print the summary of all recorded stages.
    pub fn print_summary(&self) {
        let stages = self.stage_entries();
        if stages.is_empty() {
            return;
        }

        self.stage("Summary");

        let mut ok = 0u32;
        let mut not_applicable = 0u32;
        let mut skipped = 0u32;
        let mut dry_run = 0u32;
        let mut failed = 0u32;

        for entry in &stages {
            let (icon, color) = match entry.status {
                StageStatus::Ok => {
                    ok += 1;
                    ("✓", "\x1b[32m")
                }
                StageStatus::NotApplicable => {
                    not_applicable += 1;
                    ("·", "\x1b[2m")
                }
                StageStatus::Skipped => {
                    skipped += 1;
                    ("○", "\x1b[33m")
                }
                StageStatus::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
                StageStatus::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
            };

            let suffix = entry
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", entry.name));
        }

        let total = ok + not_applicable + skipped + dry_run + failed;
        self.info(&format!(
            "{total} stages: \x1b[32m{ok} ok\x1b[0m, \x1b[2m{not_applicable} n/a\x1b[0m, \x1b[33m{skipped} skipped\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m, \x1b[31m{failed} failed\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, success, debug, warn, error, dry_run);

    fn record_stage(&self, name: &str, status: StageStatus, message: Option<&str>) {
        self.record_stage(name, status, message);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn logger_starts_empty() {
        let log = Logger::console_only();
        assert!(log.stage_entries().is_empty());
        assert_eq!(log.failure_count(), 0);
    }

    #[test]
    fn record_stage_ok() {
        let log = Logger::console_only();
        log.record_stage("Install configuration", StageStatus::Ok, None);
        let entries = log.stage_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Install configuration");
        assert_eq!(entries[0].status, StageStatus::Ok);
    }

    #[test]
    fn record_stage_with_message() {
        let log = Logger::console_only();
        log.record_stage("Install CLI", StageStatus::Skipped, Some("declined"));
        assert_eq!(
            log.stage_entries()[0].message,
            Some("declined".to_string())
        );
    }

    #[test]
    fn failure_count_counts_only_failed() {
        let log = Logger::console_only();
        log.record_stage("a", StageStatus::Ok, None);
        log.record_stage("b", StageStatus::Failed, Some("error"));
        log.record_stage("c", StageStatus::DryRun, None);
        assert_eq!(log.failure_count(), 1);
    }

    #[test]
    fn print_summary_with_no_stages_is_noop() {
        let log = Logger::console_only();
        log.print_summary();
        assert!(log.stage_entries().is_empty());
    }

    #[test]
    fn trait_object_records_through_forwarding() {
        let log = Arc::new(Logger::console_only());
        let dyn_log: Arc<dyn Log> = Arc::clone(&log) as Arc<dyn Log>;
        dyn_log.success("linked");
        dyn_log.record_stage("Validate installation", StageStatus::Ok, None);
        assert_eq!(log.stage_entries().len(), 1);
    }

    #[test]
    fn log_file_path_uses_command_name() {
        let log = Logger::new("install");
        if let Some(path) = &log.log_file {
            assert!(path.ends_with("agent-setup/install.log"));
        }
    }
}
