//! Logging infrastructure: structured console output and run summaries.
//!
//! All output flows through the [`Log`] trait so core modules never print
//! directly. [`Logger`] emits via [`tracing`] and records per-step results
//! for the end-of-run summary, mirroring the per-task accounting that drives
//! the exit status: structural failures abort early, but best-effort
//! failures (manifest capture, individual bundle apply steps) are recorded
//! here and reported together at the end, never silently dropped.

use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Status of a completed step, recorded for the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Step completed successfully.
    Ok,
    /// Step was skipped (not applicable, declined, or nothing to do).
    Skipped,
    /// Step ran in dry-run mode; no changes were applied.
    DryRun,
    /// Step encountered an error and could not complete.
    Failed,
}

/// Step execution result for summary reporting.
#[derive(Debug, Clone)]
pub struct StepEntry {
    /// Human-readable step name (e.g. a bundle id or `"snapshot"`).
    pub name: String,
    /// Final status of the step.
    pub status: StepStatus,
    /// Optional detail (skip reason or error description).
    pub message: Option<String>,
}

/// Abstraction over logging backends.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (suppressed on console unless verbose).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a step result for the summary.
    fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>);
}

/// [`Log`] implementation emitting through `tracing` with summary collection.
#[derive(Debug, Default)]
pub struct Logger {
    steps: Mutex<Vec<StepEntry>>,
}

impl Logger {
    /// Create a new logger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            steps: Mutex::new(Vec::new()),
        }
    }

    /// Number of recorded steps that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.steps
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|e| e.status == StepStatus::Failed)
            .count()
    }

    /// Whether any recorded step failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    /// Return a clone of all recorded step entries.
    #[must_use]
    pub fn entries(&self) -> Vec<StepEntry> {
        self.steps
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Print the end-of-run summary: one line per recorded step, then
    /// failure totals. Best-effort failures surface here even though they
    /// did not abort the run.
    pub fn print_summary(&self) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }
        self.stage("Summary");
        for entry in &entries {
            let status = match entry.status {
                StepStatus::Ok => "ok",
                StepStatus::Skipped => "skipped",
                StepStatus::DryRun => "dry-run",
                StepStatus::Failed => "FAILED",
            };
            match &entry.message {
                Some(msg) => println!("  {:<24} {status} ({msg})", entry.name),
                None => println!("  {:<24} {status}", entry.name),
            }
        }
        let failures = self.failure_count();
        if failures > 0 {
            self.warn(&format!("{failures} step(s) failed"));
        }
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        tracing::info!(target: "bundles::stage", "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn dry_run(&self, msg: &str) {
        tracing::info!("[dry-run] {msg}");
    }

    fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>) {
        self.steps
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(StepEntry {
                name: name.to_string(),
                status,
                message: message.map(str::to_string),
            });
    }
}

/// Install the global tracing subscriber for console output.
///
/// Honours `RUST_LOG` when set; otherwise `debug` level with `--verbose`,
/// `info` without.
pub fn init_subscriber(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
