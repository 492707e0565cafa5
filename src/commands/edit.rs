use anyhow::Result;

use crate::cli::{EditOpts, GlobalOpts};
use crate::commands::{CommandSetup, finish};
use crate::exec::SystemExecutor;
use crate::logging::Logger;
use crate::prompt::TerminalConfirm;
use crate::snapshot::SnapshotKind;
use crate::transaction::{Change, ScriptApplier, TransactionRunner};

/// Run the add command: extend the current selection.
///
/// # Errors
///
/// Returns an error if the transaction fails or any apply step failed.
pub fn run_add(global: &GlobalOpts, opts: &EditOpts, log: &Logger) -> Result<()> {
    run_edit(global, &opts.bundles, &[], log)
}

/// Run the remove command: shrink the current selection. Removing a bundle
/// that another selected bundle still requires is rejected.
///
/// # Errors
///
/// Returns an error if the transaction fails or any apply step failed.
pub fn run_remove(global: &GlobalOpts, opts: &EditOpts, log: &Logger) -> Result<()> {
    run_edit(global, &[], &opts.bundles, log)
}

fn run_edit(
    global: &GlobalOpts,
    add: &[String],
    remove: &[String],
    log: &Logger,
) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;

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

    runner.run(
        Change::Edit {
            add: add.to_vec(),
            remove: remove.to_vec(),
        },
        SnapshotKind::PreBundleChange,
    )?;

    finish(log)
}
