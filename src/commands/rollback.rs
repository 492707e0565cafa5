use std::io::IsTerminal as _;

use anyhow::Result;

use crate::cli::{GlobalOpts, RollbackOpts};
use crate::commands::{finish, resolve_root};
use crate::error::TransactionError;
use crate::exec::SystemExecutor;
use crate::lock::{LOCK_FILE, Lock};
use crate::logging::{Log as _, Logger, StepStatus};
use crate::prompt::TerminalConfirm;
use crate::snapshot::{
    PackageOutcome, RestoreOptions, SNAPSHOT_DIR, SnapshotManager,
};

/// Run the rollback command: restore the working tree (and optionally the
/// package set) to a snapshot.
///
/// # Errors
///
/// Returns an error if the target does not resolve, the lock is held,
/// confirmation is impossible, or the restore fails.
pub fn run(global: &GlobalOpts, opts: &RollbackOpts, log: &Logger) -> Result<()> {
    let root = resolve_root(global)?;

    // The package-sync prompt comes after the tree reset; refuse to start
    // a restore whose confirmation can never be answered.
    if opts.with_packages
        && !global.yes
        && !global.dry_run
        && !std::io::stdin().is_terminal()
    {
        return Err(TransactionError::NotInteractive.into());
    }

    let _lock = if global.dry_run {
        None
    } else {
        Some(Lock::acquire(&root.join(SNAPSHOT_DIR).join(LOCK_FILE))?)
    };

    let executor = SystemExecutor;
    let confirm = TerminalConfirm {
        assume_yes: global.yes,
    };
    let manager = SnapshotManager::new(&root, &executor, log);
    let outcome = manager.restore(
        &opts.target,
        RestoreOptions {
            with_packages: opts.with_packages,
            dry_run: global.dry_run,
        },
        &confirm,
    )?;

    if outcome.dry_run {
        log.record_step("rollback", StepStatus::DryRun, Some(&outcome.tag));
        return Ok(());
    }

    log.record_step("rollback", StepStatus::Ok, Some(&outcome.tag));
    match &outcome.packages {
        PackageOutcome::NotRequested => {}
        PackageOutcome::Synced { removed, installed } => {
            log.record_step(
                "packages",
                StepStatus::Ok,
                Some(&format!("{removed} removed, {installed} ensured")),
            );
        }
        PackageOutcome::Declined => {
            log.record_step("packages", StepStatus::Skipped, Some("declined"));
        }
        PackageOutcome::NoManifest => {
            log.record_step("packages", StepStatus::Skipped, Some("no manifest captured"));
        }
        PackageOutcome::Failed(message) => {
            log.record_step("packages", StepStatus::Failed, Some(message));
        }
        PackageOutcome::WouldSync { .. } => {}
    }

    finish(log)
}
