//! Snapshot creation, listing and restore.
//!
//! A snapshot is an immutable checkpoint of version-controlled state: a git
//! tag named `<kind>/<timestamp>`, plus best-effort captures of the current
//! package manifest and bundle selection under
//! `<root>/.snapshots/<timestamp>/`. Snapshots are never mutated after
//! creation and never pruned automatically; they are only superseded by
//! newer ones.

pub mod git;
pub mod packages;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::prompt::Confirm;
use crate::selection::SELECTION_FILE;
use git::Git;

/// Snapshot store directory inside the bundle root.
pub const SNAPSHOT_DIR: &str = ".snapshots";
/// Captured package manifest file name.
pub const MANIFEST_FILE: &str = "packages.txt";
/// Captured selection copy file name.
pub const SELECTION_COPY: &str = "selection.txt";
/// Snapshot metadata file name.
pub const META_FILE: &str = "snapshot.toml";

/// Why a snapshot was taken. The label becomes the tag prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    PreUpdate,
    PreUpgrade,
    PreBundleChange,
    PreRollback,
    PreBootstrap,
    PreConversion,
    PreChange,
}

impl SnapshotKind {
    /// Every kind, in listing order.
    pub const ALL: [Self; 7] = [
        Self::PreUpdate,
        Self::PreUpgrade,
        Self::PreBundleChange,
        Self::PreRollback,
        Self::PreBootstrap,
        Self::PreConversion,
        Self::PreChange,
    ];

    /// The tag prefix for this kind.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::PreUpdate => "pre-update",
            Self::PreUpgrade => "pre-upgrade",
            Self::PreBundleChange => "pre-bundle-change",
            Self::PreRollback => "pre-rollback",
            Self::PreBootstrap => "pre-bootstrap",
            Self::PreConversion => "pre-conversion",
            Self::PreChange => "pre-change",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for SnapshotKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.prefix() == s)
            .ok_or_else(|| format!("unknown snapshot kind '{s}'"))
    }
}

/// Metadata persisted alongside each snapshot's captures.
#[derive(Debug, Serialize, Deserialize)]
struct Meta {
    kind: String,
    tag: String,
    created: String,
}

/// Handle returned by [`SnapshotManager::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSnapshot {
    /// Timestamp identifying the snapshot (`%Y%m%d-%H%M%S`).
    pub timestamp: String,
    /// The immutable git tag (`<kind>/<timestamp>`).
    pub tag: String,
}

/// One row of [`SnapshotManager::list`] output.
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    pub timestamp: String,
    pub kind: String,
    pub tag: String,
    pub short_hash: String,
    /// Timestamp rendered for humans, or the raw timestamp when it does
    /// not parse.
    pub human_time: String,
    pub has_manifest: bool,
    pub has_selection: bool,
}

/// Options for [`SnapshotManager::restore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreOptions {
    /// Also reconcile the installed package set with the captured manifest.
    pub with_packages: bool,
    /// Report what would change without mutating anything.
    pub dry_run: bool,
}

/// What happened to the package set during a restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    /// `with_packages` was not requested.
    NotRequested,
    /// Extras removed and the captured set reinstalled.
    Synced { removed: usize, installed: usize },
    /// Dry run: these extras would be removed.
    WouldSync { remove: Vec<String> },
    /// The operator declined the sync; reported, not an error.
    Declined,
    /// No manifest was captured for the target; skipped with a warning.
    NoManifest,
    /// The sync failed after the tree was already restored; reported in
    /// the summary, the restore itself stands.
    Failed(String),
}

/// Result of [`SnapshotManager::restore`].
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    /// The tag the tree was (or would be) reset to.
    pub tag: String,
    /// Commits that were (or would be) discarded, newest first.
    pub discarded: Vec<String>,
    /// Package reconciliation result.
    pub packages: PackageOutcome,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

/// Creates, lists and restores snapshots for one bundle root.
pub struct SnapshotManager<'a> {
    root: &'a Path,
    executor: &'a dyn Executor,
    log: &'a dyn Log,
}

impl<'a> SnapshotManager<'a> {
    /// Manager for the repository at `root`.
    #[must_use]
    pub const fn new(root: &'a Path, executor: &'a dyn Executor, log: &'a dyn Log) -> Self {
        Self {
            root,
            executor,
            log,
        }
    }

    const fn git(&self) -> Git<'a> {
        Git::new(self.root, self.executor)
    }

    /// Directory holding captures for `timestamp`.
    #[must_use]
    pub fn capture_dir(&self, timestamp: &str) -> PathBuf {
        self.root.join(SNAPSHOT_DIR).join(timestamp)
    }

    /// Create a snapshot of the current state.
    ///
    /// Dirty working trees are committed first with a generated message so
    /// nothing is lost before tagging. Engine state under the snapshot
    /// store is excluded from the repository first so captures and the
    /// lock file never enter the user's history. Capture of the package
    /// manifest and selection copy is best-effort: failures are logged
    /// warnings. Tag creation failure is fatal — without the tag there is
    /// no safety net.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Creation`] naming the failed step.
    pub fn create(&self, kind: SnapshotKind) -> Result<CreatedSnapshot, SnapshotError> {
        let git = self.git();

        git.ensure_excluded(&format!("/{SNAPSHOT_DIR}/"))
            .map_err(|e| SnapshotError::Creation {
                stage: "exclude".to_string(),
                message: format!("{e:#}"),
            })?;

        let dirty = git.has_changes().map_err(|e| SnapshotError::Creation {
            stage: "status".to_string(),
            message: format!("{e:#}"),
        })?;
        if dirty {
            self.log.info("working tree has changes; preserving them in a commit");
            git.commit_all(&format!("bundles: preserve working state before {kind}"))
                .map_err(|e| SnapshotError::Creation {
                    stage: "commit".to_string(),
                    message: format!("{e:#}"),
                })?;
        }

        // Tags are write-once; a second snapshot of the same kind within
        // one second gets a uniqueness suffix instead of failing.
        let base = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        let mut timestamp = base.clone();
        let mut n = 2;
        while git.ref_exists(&format!("{kind}/{timestamp}")) {
            timestamp = format!("{base}-{n}");
            n += 1;
        }
        let tag = format!("{kind}/{timestamp}");
        git.tag(&tag).map_err(|e| SnapshotError::Creation {
            stage: "tag".to_string(),
            message: format!("{e:#}"),
        })?;

        self.capture(kind, &timestamp, &tag);
        self.log.info(&format!("created snapshot {tag}"));

        Ok(CreatedSnapshot { timestamp, tag })
    }

    /// Best-effort capture of external state into the snapshot directory.
    fn capture(&self, kind: SnapshotKind, timestamp: &str, tag: &str) {
        let dir = self.capture_dir(timestamp);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            self.log
                .warn(&format!("could not create capture dir {}: {e}", dir.display()));
            return;
        }

        if packages::available(self.executor) {
            match packages::installed_explicit(self.executor) {
                Ok(installed) => {
                    let mut content = installed.iter().cloned().collect::<Vec<_>>().join("\n");
                    content.push('\n');
                    if let Err(e) = std::fs::write(dir.join(MANIFEST_FILE), content) {
                        self.log.warn(&format!("package manifest capture failed: {e}"));
                    }
                }
                Err(e) => self
                    .log
                    .warn(&format!("package manifest capture failed: {e:#}")),
            }
        } else {
            self.log.debug("package manager not available; skipping manifest capture");
        }

        let selection = self.root.join(SELECTION_FILE);
        if selection.exists()
            && let Err(e) = std::fs::copy(&selection, dir.join(SELECTION_COPY))
        {
            self.log.warn(&format!("selection capture failed: {e}"));
        }

        let meta = Meta {
            kind: kind.to_string(),
            tag: tag.to_string(),
            created: chrono::Local::now().to_rfc3339(),
        };
        match toml::to_string(&meta) {
            Ok(content) => {
                if let Err(e) = std::fs::write(dir.join(META_FILE), content) {
                    self.log.warn(&format!("snapshot metadata write failed: {e}"));
                }
            }
            Err(e) => self.log.warn(&format!("snapshot metadata encode failed: {e}")),
        }
    }

    /// Enumerate snapshots across all kind prefixes, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag listing fails.
    pub fn list(&self) -> anyhow::Result<Vec<SnapshotInfo>> {
        let git = self.git();
        let mut infos = Vec::new();

        for kind in SnapshotKind::ALL {
            for tag in git.tags(&format!("{kind}/*"))? {
                let Some(timestamp) = tag.strip_prefix(&format!("{kind}/")) else {
                    continue;
                };
                let dir = self.capture_dir(timestamp);
                infos.push(SnapshotInfo {
                    timestamp: timestamp.to_string(),
                    kind: kind.to_string(),
                    tag: tag.clone(),
                    short_hash: git.short_hash(&tag).unwrap_or_default(),
                    human_time: human_time(timestamp),
                    has_manifest: dir.join(MANIFEST_FILE).exists(),
                    has_selection: dir.join(SELECTION_COPY).exists(),
                });
            }
        }

        // Fixed-width timestamps sort lexically; newest first.
        infos.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(infos)
    }

    /// Resolve a rollback identifier to a tag: a full `<kind>/<timestamp>`
    /// tag, or a bare timestamp matched against every kind prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::TargetNotFound`] when nothing matches.
    pub fn resolve_target(&self, identifier: &str) -> Result<String, SnapshotError> {
        let git = self.git();
        if identifier.contains('/') {
            if git.ref_exists(identifier) {
                return Ok(identifier.to_string());
            }
        } else {
            for kind in SnapshotKind::ALL {
                let candidate = format!("{kind}/{identifier}");
                if git.ref_exists(&candidate) {
                    return Ok(candidate);
                }
            }
        }
        Err(SnapshotError::TargetNotFound(identifier.to_string()))
    }

    /// Restore the working tree (and optionally the package set) to a
    /// snapshot.
    ///
    /// With `dry_run` this reports the commit range that would be discarded
    /// and the package diff that would apply, with zero mutation.
    /// Otherwise a safety-net `pre-rollback` snapshot is created first,
    /// then the tree is hard-reset to the target tag. Package
    /// reconciliation is gated on confirmation and never fails the
    /// restore once the reset has happened.
    ///
    /// # Errors
    ///
    /// - [`SnapshotError::TargetNotFound`] if the identifier resolves to
    ///   nothing.
    /// - [`SnapshotError::Creation`] if the safety-net snapshot fails.
    /// - [`SnapshotError::Restore`] if the reset itself fails.
    pub fn restore(
        &self,
        identifier: &str,
        options: RestoreOptions,
        confirm: &dyn Confirm,
    ) -> Result<RestoreOutcome, SnapshotError> {
        let tag = self.resolve_target(identifier)?;
        let timestamp = tag.rsplit('/').next().unwrap_or(&tag).to_string();
        let git = self.git();

        let discarded = git.log_range(&tag, "HEAD").map_err(|e| SnapshotError::Restore {
            stage: "log".to_string(),
            message: format!("{e:#}"),
        })?;

        if options.dry_run {
            self.log
                .dry_run(&format!("would reset to {tag}, discarding {} commit(s)", discarded.len()));
            for line in &discarded {
                self.log.info(&format!("  {line}"));
            }
            let packages = if options.with_packages {
                self.dry_run_package_diff(&timestamp)
            } else {
                PackageOutcome::NotRequested
            };
            return Ok(RestoreOutcome {
                tag,
                discarded,
                packages,
                dry_run: true,
            });
        }

        // Safety net before anything destructive; may itself commit dirty
        // state.
        self.create(SnapshotKind::PreRollback)?;

        git.reset_hard(&tag).map_err(|e| SnapshotError::Restore {
            stage: "reset".to_string(),
            message: format!("{e:#}"),
        })?;
        self.log.info(&format!("working tree reset to {tag}"));

        let packages = if options.with_packages {
            self.sync_packages(&timestamp, confirm)
        } else {
            PackageOutcome::NotRequested
        };

        Ok(RestoreOutcome {
            tag,
            discarded,
            packages,
            dry_run: false,
        })
    }

    /// Read the captured manifest for `timestamp`, if any.
    fn captured_manifest(&self, timestamp: &str) -> Option<BTreeSet<String>> {
        let path = self.capture_dir(timestamp).join(MANIFEST_FILE);
        std::fs::read_to_string(path)
            .ok()
            .map(|c| packages::parse_manifest(&c))
    }

    fn dry_run_package_diff(&self, timestamp: &str) -> PackageOutcome {
        let Some(manifest) = self.captured_manifest(timestamp) else {
            self.log
                .warn("no package manifest captured for this snapshot; packages would be left untouched");
            return PackageOutcome::NoManifest;
        };
        match packages::installed_explicit(self.executor) {
            Ok(installed) => {
                let remove = packages::extras(&installed, &manifest);
                self.log.dry_run(&format!(
                    "would remove {} package(s) and reinstall {} from the manifest",
                    remove.len(),
                    manifest.len()
                ));
                PackageOutcome::WouldSync { remove }
            }
            Err(e) => {
                self.log.warn(&format!("package query failed: {e:#}"));
                PackageOutcome::Failed(format!("{e:#}"))
            }
        }
    }

    /// Reconcile the installed package set with the captured manifest.
    /// Runs after the tree reset; failures are reported, never raised.
    fn sync_packages(&self, timestamp: &str, confirm: &dyn Confirm) -> PackageOutcome {
        let Some(manifest) = self.captured_manifest(timestamp) else {
            self.log
                .warn("no package manifest captured for this snapshot; leaving packages untouched");
            return PackageOutcome::NoManifest;
        };

        let installed = match packages::installed_explicit(self.executor) {
            Ok(installed) => installed,
            Err(e) => {
                self.log.warn(&format!("package query failed: {e:#}"));
                return PackageOutcome::Failed(format!("{e:#}"));
            }
        };
        let extras = packages::extras(&installed, &manifest);

        let question = format!(
            "Remove {} package(s) not in the captured manifest and reinstall its {} package(s)?",
            extras.len(),
            manifest.len()
        );
        match confirm.confirm(&question) {
            Ok(true) => {}
            Ok(false) => {
                self.log.info("package sync declined; packages left untouched");
                return PackageOutcome::Declined;
            }
            Err(e) => {
                self.log
                    .warn(&format!("package sync confirmation unavailable: {e}"));
                return PackageOutcome::Failed(e.to_string());
            }
        }

        if let Err(e) = packages::remove(self.executor, &extras) {
            self.log.warn(&format!("package removal failed: {e:#}"));
            return PackageOutcome::Failed(format!("{e:#}"));
        }
        if let Err(e) = packages::install(self.executor, &manifest) {
            self.log.warn(&format!("package install failed: {e:#}"));
            return PackageOutcome::Failed(format!("{e:#}"));
        }
        self.log.info(&format!(
            "package set reconciled: {} removed, {} ensured",
            extras.len(),
            manifest.len()
        ));
        PackageOutcome::Synced {
            removed: extras.len(),
            installed: manifest.len(),
        }
    }
}

/// Render a `%Y%m%d-%H%M%S` timestamp (possibly carrying a uniqueness
/// suffix) for humans; pass through anything that does not parse.
fn human_time(timestamp: &str) -> String {
    let base = timestamp.get(..15).unwrap_or(timestamp);
    chrono::NaiveDateTime::parse_from_str(base, "%Y%m%d-%H%M%S")
        .map_or_else(|_| timestamp.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}
