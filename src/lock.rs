//! Advisory lock around mutating critical sections.
//!
//! Snapshot creation, bundle application and restore all mutate the working
//! tree, the git index and the selection file in place. A PID-stamped lock
//! file makes concurrent invocations a hard error instead of silent
//! corruption. The lock is advisory: a crashed process leaves the file
//! behind, and the error message names it so the operator can remove a
//! stale lock by hand.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::error::TransactionError;

/// Lock file name inside the snapshot store directory.
pub const LOCK_FILE: &str = "lock";

/// A held advisory lock; released (file removed) on drop.
#[derive(Debug)]
pub struct Lock {
    path: PathBuf,
}

impl Lock {
    /// Acquire the lock at `path`, writing the current PID.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::Locked`] if the lock file already
    /// exists, naming the recorded holder PID, or
    /// [`TransactionError::SelectionWrite`]-free I/O errors via `Locked`
    /// with an unknown pid when the file cannot be created for any other
    /// reason.
    pub fn acquire(path: &Path) -> Result<Self, TransactionError> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(mut file) => {
                let _ = writeln!(file, "{}", std::process::id());
                Ok(Self {
                    path: path.to_path_buf(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let pid = std::fs::read_to_string(path)
                    .map_or_else(|_| "unknown".to_string(), |s| s.trim().to_string());
                Err(TransactionError::Locked {
                    pid,
                    path: path.to_path_buf(),
                })
            }
            Err(_) => Err(TransactionError::Locked {
                pid: "unknown".to_string(),
                path: path.to_path_buf(),
            }),
        }
    }

    /// The lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
