use anyhow::Result;

use crate::cli::{GlobalOpts, InstallOpts, VERSION};
use crate::commands::{CommandSetup, finish};
use crate::exec::SystemExecutor;
use crate::logging::{Log as _, Logger};
use crate::prompt::TerminalConfirm;
use crate::selection::{SELECTION_FILE, SelectionStore};
use crate::snapshot::SnapshotKind;
use crate::transaction::{Change, ScriptApplier, TransactionRunner};

/// Run the install command: replace the selection with the requested
/// bundles, or reapply the current selection when none are given.
///
/// # Errors
///
/// Returns an error if setup, resolution, snapshotting or persistence
/// fails, or if any bundle's apply step failed.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    log.info(&format!("bundles {VERSION}"));

    let requested = if opts.bundles.is_empty() {
        let Some(current) = SelectionStore::new(&setup.root).load()? else {
            anyhow::bail!("no bundles requested and no selection to reinstall");
        };
        log.info("reapplying the current selection");
        current.ids().to_vec()
    } else {
        opts.bundles.clone()
    };

    // A missing selection file means there is no prior state to protect.
    let kind = if setup.root.join(SELECTION_FILE).exists() {
        SnapshotKind::PreUpdate
    } else {
        SnapshotKind::PreBootstrap
    };

    let executor = SystemExecutor;
    let confirm = TerminalConfirm {
        assume_yes: global.yes,
    };
    let applier = ScriptApplier::new(&executor);
    let runner = TransactionRunner::new(
        &setup.registry,
        &setup.root,
        &executor,
        log,
        &confirm,
        &applier,
        global.dry_run,
    );

    let outcome = runner.run(Change::Replace(requested), kind)?;
    log.info(&format!(
        "{} bundle(s) in selection",
        outcome.selection.len()
    ));

    finish(log)
}
