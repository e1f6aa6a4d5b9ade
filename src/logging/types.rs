//! Core logging types: stage entries, status, and the [`Log`] trait.

/// Stage execution result for summary reporting.
#[derive(Debug, Clone)]
pub struct StageEntry {
    /// Human-readable stage name.
    pub name: String,
    /// Final status of the stage.
    pub status: StageStatus,
    /// Optional detail message (e.g., skip reason or error description).
    pub message: Option<String>,
}

/// Status of a completed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Stage completed successfully.
    Ok,
    /// Stage was not applicable (e.g. disabled by a flag).
    NotApplicable,
    /// Stage ran but deferred its work (declined prompt, missing channel).
    Skipped,
    /// Stage ran in dry-run mode; no changes were applied.
    DryRun,
    /// Stage encountered a fatal error.
    Failed,
}

/// Abstraction over logging backends.
///
/// Stages log through this trait so tests can capture output without a
/// global subscriber.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a success message.
    fn success(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a stage result for the summary.
    fn record_stage(&self, name: &str, status: StageStatus, message: Option<&str>);
}
