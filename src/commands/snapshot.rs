use anyhow::Result;

use crate::cli::{GlobalOpts, SnapshotOpts};
use crate::commands::{finish, resolve_root};
use crate::exec::SystemExecutor;
use crate::lock::{LOCK_FILE, Lock};
use crate::logging::{Log as _, Logger, StepStatus};
use crate::snapshot::{SNAPSHOT_DIR, SnapshotKind, SnapshotManager};

/// Run the snapshot command: create a checkpoint of the current state.
///
/// # Errors
///
/// Returns an error if the kind label is unknown, the lock is held, or
/// snapshot creation fails.
pub fn run_create(global: &GlobalOpts, opts: &SnapshotOpts, log: &Logger) -> Result<()> {
    let root = resolve_root(global)?;
    let kind: SnapshotKind = opts
        .kind
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    if global.dry_run {
        log.dry_run(&format!("would create a {kind} snapshot"));
        return Ok(());
    }

    let _lock = Lock::acquire(&root.join(SNAPSHOT_DIR).join(LOCK_FILE))?;
    let executor = SystemExecutor;
    let manager = SnapshotManager::new(&root, &executor, log);
    let created = manager.create(kind)?;
    log.record_step("snapshot", StepStatus::Ok, Some(&created.tag));

    finish(log)
}

/// Run the snapshots command: list every checkpoint, newest first.
///
/// # Errors
///
/// Returns an error if the tag listing fails.
pub fn run_list(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let root = resolve_root(global)?;
    let executor = SystemExecutor;
    let manager = SnapshotManager::new(&root, &executor, log);

    let infos = manager.list()?;
    if infos.is_empty() {
        log.info("no snapshots");
        return Ok(());
    }

    for info in &infos {
        let mut captures = Vec::new();
        if info.has_manifest {
            captures.push("packages");
        }
        if info.has_selection {
            captures.push("selection");
        }
        let captures = if captures.is_empty() {
            String::new()
        } else {
            format!("  [{}]", captures.join(", "))
        };
        println!(
            "{:<40} {:<9} {}{captures}",
            info.tag, info.short_hash, info.human_time
        );
    }
    Ok(())
}
