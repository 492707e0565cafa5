//! Domain-specific error types for the bundle engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Internal modules return typed errors (e.g., [`ResolveError`],
//! [`SnapshotError`]) while command handlers at the CLI boundary convert
//! them to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! BundlesError
//! ├── Registry(RegistryError)       — descriptor parsing, unknown bundles
//! ├── Resolve(ResolveError)         — missing ids, dependency cycles
//! ├── Snapshot(SnapshotError)       — tag creation, restore targets
//! └── Transaction(TransactionError) — confirmation, locking, persistence
//! ```
//!
//! Structural errors abort the whole transaction immediately; best-effort
//! failures (manifest capture, per-bundle apply steps) are logged and
//! accumulated instead of being raised through these types.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the bundle engine.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum BundlesError {
    /// Registry error (discovery, descriptor parsing, unknown bundle).
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Dependency resolution error (unknown id, cycle).
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// Snapshot error (tag creation, restore target lookup).
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Transaction error (confirmation, locking, selection persistence).
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),
}

/// Errors that arise from bundle discovery and descriptor handling.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The requested bundle id does not exist (or is disabled).
    #[error("unknown bundle '{0}'")]
    NotFound(String),

    /// A descriptor file exists but cannot be parsed.
    #[error("invalid descriptor {path}: {message}")]
    Descriptor {
        /// Path of the offending `bundle.conf`.
        path: PathBuf,
        /// Human-readable parse failure.
        message: String,
    },

    /// An I/O error occurred while scanning the bundle root.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise during dependency resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A requested or required bundle id is unknown or disabled.
    #[error("unknown bundle '{0}'")]
    NotFound(String),

    /// The dependency graph contains a cycle reachable from the request.
    ///
    /// Names a bundle that is a member of the cycle.
    #[error("dependency cycle detected at bundle '{0}'")]
    Cycle(String),
}

/// Errors that arise from snapshot creation and restoration.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The snapshot tag could not be written. Fatal: without the tag there
    /// is no safety net, so the surrounding transaction must abort.
    #[error("snapshot creation failed during {stage}: {message}")]
    Creation {
        /// Which step of snapshot creation failed (e.g. `"tag"`, `"commit"`).
        stage: String,
        /// Underlying failure description.
        message: String,
    },

    /// The rollback identifier did not resolve to any known snapshot.
    #[error("no snapshot matches '{0}'")]
    TargetNotFound(String),

    /// The restore itself failed after target resolution (e.g. git reset).
    #[error("restore failed during {stage}: {message}")]
    Restore {
        /// Which restore step failed.
        stage: String,
        /// Underlying failure description.
        message: String,
    },
}

/// Errors that arise while orchestrating a transaction.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// The operator declined the confirmation prompt.
    #[error("aborted by operator")]
    Aborted,

    /// No controlling terminal and no `--yes` flag: confirmation is
    /// impossible, so fail immediately rather than block.
    #[error("confirmation required but no terminal is attached (pass --yes to proceed)")]
    NotInteractive,

    /// Another process holds the advisory lock.
    #[error("another instance (pid {pid}) holds the lock at {path}")]
    Locked {
        /// PID recorded in the lock file.
        pid: String,
        /// Lock file location, for manual cleanup of stale locks.
        path: PathBuf,
    },

    /// A removal would orphan bundles that still require the removed one.
    #[error("cannot remove '{id}': still required by {}", dependents.join(", "))]
    RemovalRequired {
        /// The bundle whose removal was requested.
        id: String,
        /// Selected bundles that list `id` in their requirements.
        dependents: Vec<String>,
    },

    /// The selection file could not be persisted.
    #[error("failed to write selection file {path}: {source}")]
    SelectionWrite {
        /// Selection file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    // -----------------------------------------------------------------------
    // RegistryError
    // -----------------------------------------------------------------------

    #[test]
    fn registry_not_found_display() {
        let e = RegistryError::NotFound("vim".to_string());
        assert_eq!(e.to_string(), "unknown bundle 'vim'");
    }

    #[test]
    fn registry_descriptor_display() {
        let e = RegistryError::Descriptor {
            path: PathBuf::from("/bundles/vim/bundle.conf"),
            message: "unterminated quote".to_string(),
        };
        assert!(e.to_string().contains("bundle.conf"));
        assert!(e.to_string().contains("unterminated quote"));
    }

    #[test]
    fn registry_io_has_source() {
        use std::error::Error as StdError;
        let e = RegistryError::Io {
            path: PathBuf::from("/bundles"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.source().is_some());
    }

    // -----------------------------------------------------------------------
    // ResolveError
    // -----------------------------------------------------------------------

    #[test]
    fn resolve_not_found_display() {
        let e = ResolveError::NotFound("ghost".to_string());
        assert_eq!(e.to_string(), "unknown bundle 'ghost'");
    }

    #[test]
    fn resolve_cycle_names_offender() {
        let e = ResolveError::Cycle("a".to_string());
        assert_eq!(e.to_string(), "dependency cycle detected at bundle 'a'");
    }

    // -----------------------------------------------------------------------
    // SnapshotError
    // -----------------------------------------------------------------------

    #[test]
    fn snapshot_creation_names_stage() {
        let e = SnapshotError::Creation {
            stage: "tag".to_string(),
            message: "tag already exists".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "snapshot creation failed during tag: tag already exists"
        );
    }

    #[test]
    fn snapshot_target_not_found_display() {
        let e = SnapshotError::TargetNotFound("20240101-000000".to_string());
        assert_eq!(e.to_string(), "no snapshot matches '20240101-000000'");
    }

    // -----------------------------------------------------------------------
    // TransactionError
    // -----------------------------------------------------------------------

    #[test]
    fn transaction_removal_required_lists_dependents() {
        let e = TransactionError::RemovalRequired {
            id: "core".to_string(),
            dependents: vec!["develop".to_string(), "work".to_string()],
        };
        assert_eq!(
            e.to_string(),
            "cannot remove 'core': still required by develop, work"
        );
    }

    #[test]
    fn transaction_locked_names_pid_and_path() {
        let e = TransactionError::Locked {
            pid: "4242".to_string(),
            path: PathBuf::from("/repo/.snapshots/lock"),
        };
        assert!(e.to_string().contains("4242"));
        assert!(e.to_string().contains(".snapshots"));
    }

    // -----------------------------------------------------------------------
    // BundlesError conversions
    // -----------------------------------------------------------------------

    #[test]
    fn bundles_error_from_resolve_error() {
        let e: BundlesError = ResolveError::Cycle("x".to_string()).into();
        assert!(e.to_string().contains("Resolution error"));
        assert!(e.to_string().contains("'x'"));
    }

    #[test]
    fn bundles_error_from_snapshot_error() {
        let e: BundlesError = SnapshotError::TargetNotFound("t".to_string()).into();
        assert!(e.to_string().contains("Snapshot error"));
    }

    #[test]
    fn bundles_error_from_transaction_error() {
        let e: BundlesError = TransactionError::Aborted.into();
        assert!(e.to_string().contains("Transaction error"));
    }

    // -----------------------------------------------------------------------
    // Send + Sync bounds
    // -----------------------------------------------------------------------

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<BundlesError>();
        assert_send_sync::<RegistryError>();
        assert_send_sync::<ResolveError>();
        assert_send_sync::<SnapshotError>();
        assert_send_sync::<TransactionError>();
    }

    #[test]
    fn resolve_error_converts_to_anyhow() {
        let e = ResolveError::NotFound("x".to_string());
        let _anyhow_err: anyhow::Error = e.into();
    }
}
