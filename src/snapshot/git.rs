//! Git collaborator: the version-control operations the snapshot system
//! needs, driven through the [`Executor`] seam.
//!
//! Only commit, tag, hard-reset and bounded log-range queries are wrapped;
//! nothing here is a general git binding.

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::exec::Executor;

/// Git operations scoped to one repository root.
pub struct Git<'a> {
    root: &'a Path,
    executor: &'a dyn Executor,
}

impl<'a> Git<'a> {
    /// Wrap the repository at `root`.
    #[must_use]
    pub const fn new(root: &'a Path, executor: &'a dyn Executor) -> Self {
        Self { root, executor }
    }

    /// Whether `root` is inside a git work tree.
    #[must_use]
    pub fn is_repo(&self) -> bool {
        self.executor
            .run_unchecked_in(self.root, "git", &["rev-parse", "--is-inside-work-tree"])
            .is_ok_and(|r| r.success)
    }

    /// Whether the tracked working tree has uncommitted modifications.
    ///
    /// # Errors
    ///
    /// Returns an error if `git status` fails.
    pub fn has_changes(&self) -> Result<bool> {
        let result = self
            .executor
            .run_in(self.root, "git", &["status", "--porcelain"])?;
        Ok(!result.stdout.trim().is_empty())
    }

    /// Stage everything and commit with `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or the commit fails.
    pub fn commit_all(&self, message: &str) -> Result<()> {
        self.executor.run_in(self.root, "git", &["add", "-A"])?;
        self.executor
            .run_in(self.root, "git", &["commit", "-m", message])?;
        Ok(())
    }

    /// Create an immutable tag at HEAD.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be written (including when it
    /// already exists — tags are write-once).
    pub fn tag(&self, name: &str) -> Result<()> {
        self.executor.run_in(self.root, "git", &["tag", name])?;
        Ok(())
    }

    /// Whether a ref resolves (tag or commit).
    #[must_use]
    pub fn ref_exists(&self, name: &str) -> bool {
        self.executor
            .run_unchecked_in(
                self.root,
                "git",
                &["rev-parse", "--verify", "--quiet", &format!("{name}^{{commit}}")],
            )
            .is_ok_and(|r| r.success)
    }

    /// List tags matching a glob pattern, in git's default (lexical) order.
    ///
    /// # Errors
    ///
    /// Returns an error if `git tag` fails.
    pub fn tags(&self, pattern: &str) -> Result<Vec<String>> {
        let result = self
            .executor
            .run_in(self.root, "git", &["tag", "--list", pattern])?;
        Ok(result
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Short commit hash for a ref.
    ///
    /// # Errors
    ///
    /// Returns an error if the ref does not resolve.
    pub fn short_hash(&self, name: &str) -> Result<String> {
        let result = self
            .executor
            .run_in(self.root, "git", &["rev-parse", "--short", name])?;
        Ok(result.stdout.trim().to_string())
    }

    /// Full commit hash for a ref.
    ///
    /// # Errors
    ///
    /// Returns an error if the ref does not resolve.
    pub fn rev_parse(&self, name: &str) -> Result<String> {
        let result = self
            .executor
            .run_in(self.root, "git", &["rev-parse", name])?;
        Ok(result.stdout.trim().to_string())
    }

    /// One-line log entries in `from..to`, newest first. Bounded: this is
    /// only used to show what a restore would discard.
    ///
    /// # Errors
    ///
    /// Returns an error if `git log` fails.
    pub fn log_range(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let range = format!("{from}..{to}");
        let result = self
            .executor
            .run_in(self.root, "git", &["log", "--oneline", &range])?;
        Ok(result
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Add a pattern to the repository-local exclude file
    /// (`$GIT_DIR/info/exclude`) so engine state never shows up as an
    /// untracked change. Idempotent; does not touch the user's
    /// `.gitignore`.
    ///
    /// # Errors
    ///
    /// Returns an error if the git dir cannot be resolved or the exclude
    /// file cannot be written.
    pub fn ensure_excluded(&self, pattern: &str) -> Result<()> {
        let result = self
            .executor
            .run_in(self.root, "git", &["rev-parse", "--git-dir"])?;
        let git_dir = result.stdout.trim();
        let git_dir = if Path::new(git_dir).is_absolute() {
            std::path::PathBuf::from(git_dir)
        } else {
            self.root.join(git_dir)
        };

        let exclude = git_dir.join("info").join("exclude");
        let existing = std::fs::read_to_string(&exclude).unwrap_or_default();
        if existing.lines().any(|l| l.trim() == pattern) {
            return Ok(());
        }
        if let Some(parent) = exclude.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut content = existing;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(pattern);
        content.push('\n');
        std::fs::write(&exclude, content)
            .with_context(|| format!("writing {}", exclude.display()))?;
        Ok(())
    }

    /// Hard-reset the working tree to a ref. Destructive.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset fails.
    pub fn reset_hard(&self, name: &str) -> Result<()> {
        self.executor
            .run_in(self.root, "git", &["reset", "--hard", name])?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::exec::SystemExecutor;

    /// Initialise a throwaway repository with one commit.
    fn init_repo(dir: &Path) {
        let exec = SystemExecutor;
        exec.run_in(dir, "git", &["init", "-q"]).unwrap();
        exec.run_in(dir, "git", &["config", "user.email", "test@test"])
            .unwrap();
        exec.run_in(dir, "git", &["config", "user.name", "test"])
            .unwrap();
        std::fs::write(dir.join("file.txt"), "one\n").unwrap();
        exec.run_in(dir, "git", &["add", "-A"]).unwrap();
        exec.run_in(dir, "git", &["commit", "-q", "-m", "init"])
            .unwrap();
    }

    #[test]
    fn detects_repo_and_changes() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());
        let exec = SystemExecutor;
        let git = Git::new(tmp.path(), &exec);

        assert!(git.is_repo());
        assert!(!git.has_changes().unwrap());

        std::fs::write(tmp.path().join("file.txt"), "two\n").unwrap();
        assert!(git.has_changes().unwrap());
    }

    #[test]
    fn non_repo_detected() {
        let tmp = tempfile::tempdir().unwrap();
        let exec = SystemExecutor;
        let git = Git::new(tmp.path(), &exec);
        assert!(!git.is_repo());
    }

    #[test]
    fn commit_tag_and_reset_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());
        let exec = SystemExecutor;
        let git = Git::new(tmp.path(), &exec);

        let original = git.rev_parse("HEAD").unwrap();
        git.tag("pre-change/19700101-000000").unwrap();
        assert!(git.ref_exists("pre-change/19700101-000000"));

        std::fs::write(tmp.path().join("file.txt"), "two\n").unwrap();
        git.commit_all("state change").unwrap();
        assert_ne!(git.rev_parse("HEAD").unwrap(), original);
        assert_eq!(
            git.log_range("pre-change/19700101-000000", "HEAD")
                .unwrap()
                .len(),
            1
        );

        git.reset_hard("pre-change/19700101-000000").unwrap();
        assert_eq!(git.rev_parse("HEAD").unwrap(), original);
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("file.txt")).unwrap(),
            "one\n"
        );
    }

    #[test]
    fn duplicate_tag_fails() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());
        let exec = SystemExecutor;
        let git = Git::new(tmp.path(), &exec);
        git.tag("pre-change/x").unwrap();
        assert!(git.tag("pre-change/x").is_err(), "tags are write-once");
    }

    #[test]
    fn excluded_paths_do_not_dirty_the_tree() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());
        let exec = SystemExecutor;
        let git = Git::new(tmp.path(), &exec);

        git.ensure_excluded("/.snapshots/").unwrap();
        std::fs::create_dir_all(tmp.path().join(".snapshots/x")).unwrap();
        std::fs::write(tmp.path().join(".snapshots/x/state.txt"), "s\n").unwrap();
        assert!(!git.has_changes().unwrap());

        // Idempotent: a second call adds no duplicate entry.
        git.ensure_excluded("/.snapshots/").unwrap();
        let exclude =
            std::fs::read_to_string(tmp.path().join(".git/info/exclude")).unwrap();
        assert_eq!(
            exclude.lines().filter(|l| *l == "/.snapshots/").count(),
            1
        );
    }

    #[test]
    fn tags_filtered_by_pattern() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());
        let exec = SystemExecutor;
        let git = Git::new(tmp.path(), &exec);
        git.tag("pre-update/a").unwrap();
        git.tag("pre-rollback/b").unwrap();
        assert_eq!(git.tags("pre-update/*").unwrap(), vec!["pre-update/a"]);
    }
}
