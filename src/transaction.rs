//! Transaction orchestration: select → resolve → confirm → snapshot →
//! apply → persist.
//!
//! A transaction moves through a fixed sequence of states. Structural
//! failures (resolution errors, snapshot tag failure, lock contention)
//! abort before anything is mutated; per-bundle apply failures after the
//! snapshot are isolated, recorded for the summary, and do not stop the
//! remaining bundles. Persisting the selection file is the commit point —
//! a crash before it leaves the previous selection authoritative, and the
//! snapshot covers everything after it.

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::error::TransactionError;
use crate::exec::Executor;
use crate::lock::{Lock, LOCK_FILE};
use crate::logging::{Log, StepStatus};
use crate::prompt::Confirm;
use crate::registry::BundleRegistry;
use crate::resolver;
use crate::selection::{SelectionSet, SelectionStore};
use crate::snapshot::{CreatedSnapshot, SnapshotKind, SnapshotManager, SNAPSHOT_DIR};

/// Transaction progress, logged at each stage transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Resolving,
    AwaitingConfirmation,
    Snapshotting,
    Applying,
    Persisting,
    Done,
}

impl TxState {
    const fn label(self) -> &'static str {
        match self {
            Self::Resolving => "Resolving bundles",
            Self::AwaitingConfirmation => "Awaiting confirmation",
            Self::Snapshotting => "Creating snapshot",
            Self::Applying => "Applying bundles",
            Self::Persisting => "Persisting selection",
            Self::Done => "Done",
        }
    }
}

/// How the selection should change.
#[derive(Debug, Clone)]
pub enum Change {
    /// Replace the selection with exactly these ids (install).
    Replace(Vec<String>),
    /// Edit the current selection (add/remove).
    Edit {
        add: Vec<String>,
        remove: Vec<String>,
    },
}

/// What a completed transaction did.
#[derive(Debug)]
pub struct Outcome {
    /// Bundles in the order they were (or would be) applied.
    pub applied: Vec<String>,
    /// The selection that was (or would be) persisted.
    pub selection: SelectionSet,
    /// The safety-net snapshot, when one was taken.
    pub snapshot: Option<CreatedSnapshot>,
    /// Whether this was a dry run (nothing was mutated).
    pub dry_run: bool,
}

/// Result of applying one bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    /// The bundle's install script ran successfully.
    Applied,
    /// The bundle has no install script; nothing to do.
    Nothing,
}

/// Applies one bundle's payload to the system.
pub trait Applier {
    /// Apply the bundle `id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the bundle's apply step fails. The runner
    /// isolates the failure and continues with the remaining bundles.
    fn apply(&self, registry: &BundleRegistry, id: &str) -> Result<ApplyResult>;
}

/// Default applier: runs the bundle's `install` script, if present, with
/// the bundle directory as working directory.
pub struct ScriptApplier<'a> {
    executor: &'a dyn Executor,
}

impl<'a> ScriptApplier<'a> {
    #[must_use]
    pub const fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }
}

/// Name of the per-bundle install script.
pub const INSTALL_SCRIPT: &str = "install";

impl Applier for ScriptApplier<'_> {
    fn apply(&self, registry: &BundleRegistry, id: &str) -> Result<ApplyResult> {
        let dir = registry.bundle_dir(id);
        let script = dir.join(INSTALL_SCRIPT);
        if !script.exists() {
            return Ok(ApplyResult::Nothing);
        }
        let script = script.to_string_lossy();
        self.executor.run_in(&dir, "sh", &[script.as_ref()])?;
        Ok(ApplyResult::Applied)
    }
}

/// Orchestrates one selection-changing transaction.
pub struct TransactionRunner<'a> {
    registry: &'a BundleRegistry,
    root: &'a Path,
    executor: &'a dyn Executor,
    log: &'a dyn Log,
    confirm: &'a dyn Confirm,
    applier: &'a dyn Applier,
    dry_run: bool,
}

impl<'a> TransactionRunner<'a> {
    #[must_use]
    pub const fn new(
        registry: &'a BundleRegistry,
        root: &'a Path,
        executor: &'a dyn Executor,
        log: &'a dyn Log,
        confirm: &'a dyn Confirm,
        applier: &'a dyn Applier,
        dry_run: bool,
    ) -> Self {
        Self {
            registry,
            root,
            executor,
            log,
            confirm,
            applier,
            dry_run,
        }
    }

    fn enter(&self, state: TxState) {
        self.log.stage(state.label());
    }

    /// Run the transaction: resolve `change` against the persisted
    /// selection, confirm, snapshot (unless this is a fresh install),
    /// apply each bundle, and persist the new selection.
    ///
    /// `kind` names the snapshot taken before mutation.
    ///
    /// # Errors
    ///
    /// - [`TransactionError::RemovalRequired`] when a removed bundle is
    ///   still required by a remaining one.
    /// - [`TransactionError::Aborted`] when the operator declines.
    /// - [`TransactionError::Locked`] when another instance is running.
    /// - Resolution and snapshot-creation errors propagate unchanged.
    pub fn run(&self, change: Change, kind: SnapshotKind) -> Result<Outcome> {
        self.enter(TxState::Resolving);
        let previous = SelectionStore::new(self.root).load()?;
        let fresh_install = previous.is_none();
        if fresh_install {
            self.log.info("no previous selection; treating as fresh install");
        }
        let base = previous.unwrap_or_default();

        let removals: Vec<String> = match &change {
            Change::Replace(_) => Vec::new(),
            Change::Edit { remove, .. } => remove.clone(),
        };
        let edited = match change {
            Change::Replace(ids) => SelectionSet::from_ids(ids),
            Change::Edit { add, remove } => base.apply_edits(&add, &remove),
        };

        let ordered = resolver::resolve(self.registry, edited.ids())?;
        self.reject_required_removals(&ordered, &removals)?;
        for (dep, dependent) in resolver::order_conflicts(self.registry, &ordered) {
            self.log.warn(&format!(
                "order places '{dep}' after '{dependent}' which requires it"
            ));
        }
        let selection = SelectionSet::from_ids(ordered.clone());

        self.describe_plan(&base, &ordered);
        if self.dry_run {
            self.log.dry_run("no changes will be made");
        } else if fresh_install {
            // Nothing pre-existing to destroy, so there is nothing to
            // confirm; Aborted is only reachable for upgrades.
            self.log.info("fresh install; proceeding without confirmation");
        } else {
            self.enter(TxState::AwaitingConfirmation);
            if !self.confirm.confirm(&format!(
                "Apply {} bundle(s) and persist the selection?",
                ordered.len()
            ))? {
                return Err(TransactionError::Aborted.into());
            }
        }

        // The lock covers every mutating state; released on scope exit.
        let _lock = if self.dry_run {
            None
        } else {
            Some(Lock::acquire(
                &self.root.join(SNAPSHOT_DIR).join(LOCK_FILE),
            )?)
        };

        self.enter(TxState::Snapshotting);
        let snapshot = self.take_snapshot(kind, fresh_install)?;

        self.enter(TxState::Applying);
        for id in &ordered {
            self.apply_one(id);
        }

        self.enter(TxState::Persisting);
        if self.dry_run {
            self.log.dry_run(&format!(
                "would persist selection: {}",
                selection.ids().join(", ")
            ));
        } else {
            SelectionStore::new(self.root)
                .save(&selection)
                .map_err(anyhow::Error::from)
                .with_context(|| match &snapshot {
                    Some(created) => {
                        format!("selection not persisted; roll back with snapshot {}", created.tag)
                    }
                    None => "selection not persisted".to_string(),
                })?;
        }

        self.enter(TxState::Done);
        Ok(Outcome {
            applied: ordered,
            selection,
            snapshot,
            dry_run: self.dry_run,
        })
    }

    /// A removal is rejected when the removed bundle survives resolution,
    /// i.e. some remaining bundle still pulls it in.
    fn reject_required_removals(
        &self,
        ordered: &[String],
        removals: &[String],
    ) -> Result<(), TransactionError> {
        for removed in removals {
            if !ordered.contains(removed) {
                continue;
            }
            let dependents: Vec<String> = ordered
                .iter()
                .filter(|id| *id != removed)
                .filter(|id| {
                    resolver::resolve(self.registry, std::slice::from_ref(id))
                        .is_ok_and(|closure| closure.contains(removed))
                })
                .cloned()
                .collect();
            return Err(TransactionError::RemovalRequired {
                id: removed.clone(),
                dependents,
            });
        }
        Ok(())
    }

    fn describe_plan(&self, base: &SelectionSet, ordered: &[String]) {
        for id in ordered {
            let marker = if base.contains(id) { " " } else { "+" };
            self.log.info(&format!("  {marker} {id}"));
        }
        for id in base.ids() {
            if !ordered.contains(id) {
                self.log.info(&format!("  - {id}"));
            }
        }
    }

    fn take_snapshot(
        &self,
        kind: SnapshotKind,
        fresh_install: bool,
    ) -> Result<Option<CreatedSnapshot>> {
        if self.dry_run {
            self.log.dry_run(&format!("would create a {kind} snapshot"));
            self.log.record_step("snapshot", StepStatus::DryRun, None);
            return Ok(None);
        }
        if fresh_install {
            self.log
                .info("fresh install: nothing to roll back to, skipping snapshot");
            self.log
                .record_step("snapshot", StepStatus::Skipped, Some("fresh install"));
            return Ok(None);
        }
        let manager = SnapshotManager::new(self.root, self.executor, self.log);
        let created = manager.create(kind)?;
        self.log
            .record_step("snapshot", StepStatus::Ok, Some(&created.tag));
        Ok(Some(created))
    }

    /// Apply one bundle, isolating failures.
    fn apply_one(&self, id: &str) {
        if self.dry_run {
            self.log.dry_run(&format!("would apply bundle '{id}'"));
            self.log.record_step(id, StepStatus::DryRun, None);
            return;
        }
        match self.applier.apply(self.registry, id) {
            Ok(ApplyResult::Applied) => {
                self.log.info(&format!("applied bundle '{id}'"));
                self.log.record_step(id, StepStatus::Ok, None);
            }
            Ok(ApplyResult::Nothing) => {
                self.log.debug(&format!("bundle '{id}' has no install script"));
                self.log
                    .record_step(id, StepStatus::Skipped, Some("no install script"));
            }
            Err(e) => {
                self.log.error(&format!("bundle '{id}' failed: {e:#}"));
                self.log
                    .record_step(id, StepStatus::Failed, Some(&format!("{e:#}")));
            }
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::exec::SystemExecutor;
    use crate::logging::Logger;
    use crate::prompt::StaticConfirm;
    use crate::registry::DESCRIPTOR_FILE;
    use crate::snapshot::git::Git;

    /// Applier that records apply order and can fail selected bundles.
    #[derive(Default)]
    struct RecordingApplier {
        applied: Mutex<Vec<String>>,
        fail: Vec<String>,
    }

    impl Applier for RecordingApplier {
        fn apply(&self, _registry: &BundleRegistry, id: &str) -> Result<ApplyResult> {
            if self.fail.iter().any(|f| f == id) {
                anyhow::bail!("scripted failure");
            }
            self.applied
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(id.to_string());
            Ok(ApplyResult::Applied)
        }
    }

    /// Git-initialised bundle root with descriptors.
    fn fixture(bundles: &[(&str, &str)]) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let exec = SystemExecutor;
        exec.run_in(tmp.path(), "git", &["init", "-q"]).unwrap();
        exec.run_in(tmp.path(), "git", &["config", "user.email", "test@test"])
            .unwrap();
        exec.run_in(tmp.path(), "git", &["config", "user.name", "test"])
            .unwrap();
        for (id, conf) in bundles {
            let dir = tmp.path().join(id);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(DESCRIPTOR_FILE), conf).unwrap();
        }
        exec.run_in(tmp.path(), "git", &["add", "-A"]).unwrap();
        exec.run_in(tmp.path(), "git", &["commit", "-q", "-m", "seed"])
            .unwrap();
        tmp
    }

    fn runner<'a>(
        registry: &'a BundleRegistry,
        root: &'a Path,
        executor: &'a SystemExecutor,
        log: &'a Logger,
        confirm: &'a StaticConfirm,
        applier: &'a RecordingApplier,
        dry_run: bool,
    ) -> TransactionRunner<'a> {
        TransactionRunner::new(registry, root, executor, log, confirm, applier, dry_run)
    }

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn fresh_install_skips_snapshot_and_persists() {
        let tmp = fixture(&[
            ("core", "order=10\n"),
            ("vim", "order=50\nrequires=core\n"),
        ]);
        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        let exec = SystemExecutor;
        let log = Logger::new();
        let confirm = StaticConfirm { answer: true };
        let applier = RecordingApplier::default();
        let tx = runner(&registry, tmp.path(), &exec, &log, &confirm, &applier, false);

        let outcome = tx
            .run(Change::Replace(ids(&["vim"])), SnapshotKind::PreBootstrap)
            .unwrap();

        assert_eq!(outcome.applied, ids(&["core", "vim"]));
        assert!(outcome.snapshot.is_none());
        assert_eq!(
            *applier.applied.lock().unwrap(),
            ids(&["core", "vim"])
        );
        // Commit point reached.
        let store = SelectionStore::new(tmp.path());
        assert_eq!(store.load().unwrap().unwrap().ids(), ids(&["core", "vim"]));
        // No snapshot tag for a fresh install.
        let git = Git::new(tmp.path(), &exec);
        assert!(git.tags("pre-bootstrap/*").unwrap().is_empty());
        assert!(!log.has_failures());
    }

    #[test]
    fn change_over_existing_selection_takes_snapshot() {
        let tmp = fixture(&[("core", "order=10\n"), ("extra", "order=50\n")]);
        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        let exec = SystemExecutor;
        SelectionStore::new(tmp.path())
            .save(&SelectionSet::from_ids(["core"]))
            .unwrap();

        let log = Logger::new();
        let confirm = StaticConfirm { answer: true };
        let applier = RecordingApplier::default();
        let tx = runner(&registry, tmp.path(), &exec, &log, &confirm, &applier, false);

        let outcome = tx
            .run(
                Change::Edit {
                    add: ids(&["extra"]),
                    remove: vec![],
                },
                SnapshotKind::PreBundleChange,
            )
            .unwrap();

        let created = outcome.snapshot.expect("snapshot expected");
        assert!(created.tag.starts_with("pre-bundle-change/"));
        let git = Git::new(tmp.path(), &exec);
        assert!(git.ref_exists(&created.tag));
        assert_eq!(
            SelectionStore::new(tmp.path()).load().unwrap().unwrap().ids(),
            ids(&["core", "extra"])
        );
    }

    #[test]
    fn removing_a_required_bundle_is_rejected() {
        let tmp = fixture(&[
            ("core", "order=10\n"),
            ("vim", "order=50\nrequires=core\n"),
        ]);
        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        let exec = SystemExecutor;
        let store = SelectionStore::new(tmp.path());
        store
            .save(&SelectionSet::from_ids(["core", "vim"]))
            .unwrap();

        let log = Logger::new();
        let confirm = StaticConfirm { answer: true };
        let applier = RecordingApplier::default();
        let tx = runner(&registry, tmp.path(), &exec, &log, &confirm, &applier, false);

        let err = tx
            .run(
                Change::Edit {
                    add: vec![],
                    remove: ids(&["core"]),
                },
                SnapshotKind::PreBundleChange,
            )
            .unwrap_err();
        match err.downcast::<TransactionError>().unwrap() {
            TransactionError::RemovalRequired { id, dependents } => {
                assert_eq!(id, "core");
                assert_eq!(dependents, ids(&["vim"]));
            }
            other => panic!("expected RemovalRequired, got {other:?}"),
        }
        // Selection untouched, nothing applied.
        assert_eq!(
            store.load().unwrap().unwrap().ids(),
            ids(&["core", "vim"])
        );
        assert!(applier.applied.lock().unwrap().is_empty());
    }

    #[test]
    fn removing_an_unrequired_bundle_succeeds() {
        let tmp = fixture(&[("core", "order=10\n"), ("extra", "order=50\n")]);
        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        let exec = SystemExecutor;
        let store = SelectionStore::new(tmp.path());
        store
            .save(&SelectionSet::from_ids(["core", "extra"]))
            .unwrap();

        let log = Logger::new();
        let confirm = StaticConfirm { answer: true };
        let applier = RecordingApplier::default();
        let tx = runner(&registry, tmp.path(), &exec, &log, &confirm, &applier, false);

        let outcome = tx
            .run(
                Change::Edit {
                    add: vec![],
                    remove: ids(&["extra"]),
                },
                SnapshotKind::PreBundleChange,
            )
            .unwrap();
        assert_eq!(outcome.applied, ids(&["core"]));
        assert_eq!(store.load().unwrap().unwrap().ids(), ids(&["core"]));
    }

    // A first install has no prior state to destroy; it never prompts and
    // can never be aborted by a declining answer.
    #[test]
    fn fresh_install_never_asks_for_confirmation() {
        let tmp = fixture(&[("core", "order=10\n")]);
        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        let exec = SystemExecutor;
        let log = Logger::new();
        let confirm = StaticConfirm { answer: false };
        let applier = RecordingApplier::default();
        let tx = runner(&registry, tmp.path(), &exec, &log, &confirm, &applier, false);

        let outcome = tx
            .run(Change::Replace(ids(&["core"])), SnapshotKind::PreBootstrap)
            .unwrap();
        assert_eq!(outcome.applied, ids(&["core"]));
        assert_eq!(
            SelectionStore::new(tmp.path()).load().unwrap().unwrap().ids(),
            ids(&["core"])
        );
        assert_eq!(*applier.applied.lock().unwrap(), ids(&["core"]));
    }

    #[test]
    fn declined_upgrade_aborts_without_mutation() {
        let tmp = fixture(&[("core", "order=10\n"), ("extra", "order=50\n")]);
        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        let exec = SystemExecutor;
        let store = SelectionStore::new(tmp.path());
        store.save(&SelectionSet::from_ids(["core"])).unwrap();

        let log = Logger::new();
        let confirm = StaticConfirm { answer: false };
        let applier = RecordingApplier::default();
        let tx = runner(&registry, tmp.path(), &exec, &log, &confirm, &applier, false);

        let err = tx
            .run(
                Change::Edit {
                    add: ids(&["extra"]),
                    remove: vec![],
                },
                SnapshotKind::PreBundleChange,
            )
            .unwrap_err();
        assert!(matches!(
            err.downcast::<TransactionError>().unwrap(),
            TransactionError::Aborted
        ));
        assert_eq!(store.load().unwrap().unwrap().ids(), ids(&["core"]));
        assert!(applier.applied.lock().unwrap().is_empty());
    }

    #[test]
    fn dry_run_mutates_nothing_and_records_steps() {
        let tmp = fixture(&[("core", "order=10\n"), ("extra", "order=50\n")]);
        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        let exec = SystemExecutor;
        SelectionStore::new(tmp.path())
            .save(&SelectionSet::from_ids(["core"]))
            .unwrap();

        let log = Logger::new();
        // No --yes needed: dry runs never prompt.
        let confirm = StaticConfirm { answer: false };
        let applier = RecordingApplier::default();
        let tx = runner(&registry, tmp.path(), &exec, &log, &confirm, &applier, true);

        let outcome = tx
            .run(
                Change::Edit {
                    add: ids(&["extra"]),
                    remove: vec![],
                },
                SnapshotKind::PreBundleChange,
            )
            .unwrap();

        assert!(outcome.dry_run);
        assert!(outcome.snapshot.is_none());
        assert!(applier.applied.lock().unwrap().is_empty());
        // Selection unchanged on disk.
        assert_eq!(
            SelectionStore::new(tmp.path()).load().unwrap().unwrap().ids(),
            ids(&["core"])
        );
        // No tag created.
        let git = Git::new(tmp.path(), &exec);
        assert!(git.tags("pre-bundle-change/*").unwrap().is_empty());
        // Every step recorded as dry-run, none failed.
        assert!(log
            .entries()
            .iter()
            .all(|e| e.status == StepStatus::DryRun));
        assert!(!log.has_failures());
    }

    #[test]
    fn per_bundle_failure_is_isolated() {
        let tmp = fixture(&[
            ("early", "order=10\n"),
            ("broken", "order=20\n"),
            ("late", "order=30\n"),
        ]);
        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        let exec = SystemExecutor;
        let log = Logger::new();
        let confirm = StaticConfirm { answer: true };
        let applier = RecordingApplier {
            applied: Mutex::new(Vec::new()),
            fail: ids(&["broken"]),
        };
        let tx = runner(&registry, tmp.path(), &exec, &log, &confirm, &applier, false);

        let outcome = tx
            .run(
                Change::Replace(ids(&["early", "broken", "late"])),
                SnapshotKind::PreBootstrap,
            )
            .unwrap();

        // The failure did not stop the remaining bundles.
        assert_eq!(*applier.applied.lock().unwrap(), ids(&["early", "late"]));
        assert_eq!(log.failure_count(), 1);
        // Selection still persisted; the summary carries the failure.
        assert_eq!(outcome.selection.ids(), ids(&["early", "broken", "late"]));
        assert_eq!(
            SelectionStore::new(tmp.path()).load().unwrap().unwrap().ids(),
            ids(&["early", "broken", "late"])
        );
    }

    #[test]
    fn concurrent_invocation_is_locked_out() {
        let tmp = fixture(&[("core", "order=10\n")]);
        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        let exec = SystemExecutor;
        let log = Logger::new();
        let confirm = StaticConfirm { answer: true };
        let applier = RecordingApplier::default();
        let tx = runner(&registry, tmp.path(), &exec, &log, &confirm, &applier, false);

        let _held = Lock::acquire(&tmp.path().join(SNAPSHOT_DIR).join(LOCK_FILE)).unwrap();
        let err = tx
            .run(Change::Replace(ids(&["core"])), SnapshotKind::PreBootstrap)
            .unwrap_err();
        assert!(matches!(
            err.downcast::<TransactionError>().unwrap(),
            TransactionError::Locked { .. }
        ));
    }

    #[test]
    fn lock_released_after_run() {
        let tmp = fixture(&[("core", "order=10\n")]);
        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        let exec = SystemExecutor;
        let log = Logger::new();
        let confirm = StaticConfirm { answer: true };
        let applier = RecordingApplier::default();
        let tx = runner(&registry, tmp.path(), &exec, &log, &confirm, &applier, false);

        tx.run(Change::Replace(ids(&["core"])), SnapshotKind::PreBootstrap)
            .unwrap();
        assert!(!tmp.path().join(SNAPSHOT_DIR).join(LOCK_FILE).exists());
    }

    #[test]
    fn script_applier_skips_bundles_without_script() {
        let tmp = fixture(&[("plain", "order=10\n")]);
        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        let exec = SystemExecutor;
        let applier = ScriptApplier::new(&exec);
        assert_eq!(
            applier.apply(&registry, "plain").unwrap(),
            ApplyResult::Nothing
        );
    }

    #[test]
    fn script_applier_runs_the_install_script() {
        let tmp = fixture(&[("scripted", "order=10\n")]);
        let dir = tmp.path().join("scripted");
        std::fs::write(dir.join(INSTALL_SCRIPT), "touch applied.marker\n").unwrap();
        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        let exec = SystemExecutor;
        let applier = ScriptApplier::new(&exec);

        assert_eq!(
            applier.apply(&registry, "scripted").unwrap(),
            ApplyResult::Applied
        );
        // Runs with the bundle directory as cwd.
        assert!(dir.join("applied.marker").exists());
    }

    #[test]
    fn script_applier_surfaces_script_failure() {
        let tmp = fixture(&[("broken", "order=10\n")]);
        std::fs::write(tmp.path().join("broken").join(INSTALL_SCRIPT), "exit 3\n").unwrap();
        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        let exec = SystemExecutor;
        let applier = ScriptApplier::new(&exec);
        assert!(applier.apply(&registry, "broken").is_err());
    }
}
