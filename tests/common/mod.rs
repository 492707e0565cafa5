// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed bundle root (a real git repository)
// and a fluent builder so each integration test can set up an isolated
// environment without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::Path;

use bundles_cli::exec::{Executor as _, SystemExecutor};
use bundles_cli::registry::DESCRIPTOR_FILE;
use bundles_cli::selection::SELECTION_FILE;
use bundles_cli::transaction::INSTALL_SCRIPT;

/// An isolated bundle root backed by a [`tempfile::TempDir`], initialised
/// as a git repository with one seed commit.
pub struct TestRoot {
    dir: tempfile::TempDir,
}

impl TestRoot {
    /// Create an empty, committed bundle root.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let exec = SystemExecutor;
        exec.run_in(dir.path(), "git", &["init", "-q"])
            .expect("git init");
        exec.run_in(dir.path(), "git", &["config", "user.email", "test@test"])
            .expect("git config email");
        exec.run_in(dir.path(), "git", &["config", "user.name", "test"])
            .expect("git config name");
        std::fs::write(dir.path().join(".keep"), "").expect("write seed file");
        let root = Self { dir };
        root.commit("seed");
        root
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Add a bundle directory with the given descriptor content.
    pub fn add_bundle(&self, id: &str, conf: &str) -> &Self {
        let dir = self.path().join(id);
        std::fs::create_dir_all(&dir).expect("create bundle dir");
        std::fs::write(dir.join(DESCRIPTOR_FILE), conf).expect("write descriptor");
        self
    }

    /// Add an install script to a bundle.
    pub fn add_script(&self, id: &str, body: &str) -> &Self {
        std::fs::write(self.path().join(id).join(INSTALL_SCRIPT), body)
            .expect("write install script");
        self
    }

    /// Write the selection file directly (simulating prior installed state).
    pub fn write_selection(&self, ids: &[&str]) -> &Self {
        let mut content = ids.join("\n");
        content.push('\n');
        std::fs::write(self.path().join(SELECTION_FILE), content)
            .expect("write selection");
        self
    }

    /// Stage and commit everything.
    pub fn commit(&self, message: &str) -> &Self {
        let exec = SystemExecutor;
        exec.run_in(self.path(), "git", &["add", "-A"]).expect("git add");
        exec.run_in(self.path(), "git", &["commit", "-q", "-m", message])
            .expect("git commit");
        self
    }

    /// Current HEAD commit hash.
    pub fn head(&self) -> String {
        SystemExecutor
            .run_in(self.path(), "git", &["rev-parse", "HEAD"])
            .expect("git rev-parse")
            .stdout
            .trim()
            .to_string()
    }
}
