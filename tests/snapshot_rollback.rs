#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
//! Integration tests for the snapshot/rollback lifecycle: a selection
//! change protected by a snapshot, then rolled back, must return the
//! bundle root byte-for-byte to its pre-change state.

mod common;

use bundles_cli::exec::SystemExecutor;
use bundles_cli::logging::Logger;
use bundles_cli::prompt::StaticConfirm;
use bundles_cli::registry::BundleRegistry;
use bundles_cli::selection::SelectionStore;
use bundles_cli::snapshot::{
    RestoreOptions, SELECTION_COPY, SnapshotKind, SnapshotManager,
};
use bundles_cli::transaction::{Change, ScriptApplier, TransactionRunner};

use common::TestRoot;

fn ids(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Full cycle: add a bundle (snapshot taken), then restore the snapshot.
/// The selection file and working tree return to the pre-change state, and
/// a `pre-rollback` safety net records the discarded state.
#[test]
fn rollback_undoes_a_selection_change() {
    let root = TestRoot::new();
    root.add_bundle("core", "order=10\n")
        .add_bundle("extra", "order=50\n")
        .write_selection(&["core"])
        .commit("installed core");

    let registry = BundleRegistry::discover(root.path()).unwrap();
    let exec = SystemExecutor;
    let log = Logger::new();
    let confirm = StaticConfirm { answer: true };
    let applier = ScriptApplier::new(&exec);
    let runner = TransactionRunner::new(
        &registry,
        root.path(),
        &exec,
        &log,
        &confirm,
        &applier,
        false,
    );

    let outcome = runner
        .run(
            Change::Edit {
                add: ids(&["extra"]),
                remove: vec![],
            },
            SnapshotKind::PreBundleChange,
        )
        .unwrap();
    let created = outcome.snapshot.expect("snapshot expected");
    assert_eq!(
        SelectionStore::new(root.path()).load().unwrap().unwrap().ids(),
        ids(&["core", "extra"]).as_slice()
    );

    // The snapshot captured the pre-change selection.
    let manager = SnapshotManager::new(root.path(), &exec, &log);
    let copy = manager.capture_dir(&created.timestamp).join(SELECTION_COPY);
    assert_eq!(std::fs::read_to_string(copy).unwrap(), "core\n");

    // Roll back; the modified selection is preserved in the safety net,
    // then the tree is reset.
    let restored = manager
        .restore(
            &created.timestamp,
            RestoreOptions::default(),
            &StaticConfirm { answer: true },
        )
        .unwrap();
    assert_eq!(restored.tag, created.tag);
    assert_eq!(
        SelectionStore::new(root.path()).load().unwrap().unwrap().ids(),
        ids(&["core"]).as_slice()
    );

    let infos = manager.list().unwrap();
    let kinds: Vec<&str> = infos.iter().map(|i| i.kind.as_str()).collect();
    assert!(kinds.contains(&"pre-bundle-change"));
    assert!(kinds.contains(&"pre-rollback"));
}

/// Snapshots remain immutable and enumerable after later activity; listing
/// is newest first across kind prefixes.
#[test]
fn snapshots_accumulate_and_list_newest_first() {
    let root = TestRoot::new();
    root.add_bundle("core", "order=10\n").commit("bundles");

    let exec = SystemExecutor;
    let log = Logger::new();
    let manager = SnapshotManager::new(root.path(), &exec, &log);

    let first = manager.create(SnapshotKind::PreUpdate).unwrap();
    std::fs::write(root.path().join("drift.txt"), "x\n").unwrap();
    // Distinct timestamps are not guaranteed within a second, so the
    // second snapshot uses a different kind prefix.
    let second = manager.create(SnapshotKind::PreChange).unwrap();

    let infos = manager.list().unwrap();
    assert_eq!(infos.len(), 2);
    assert!(infos.iter().any(|i| i.tag == first.tag));
    assert!(infos.iter().any(|i| i.tag == second.tag));
    for pair in infos.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }
}
