//! The persisted record of currently-installed bundles.
//!
//! The selection file holds one bundle id per line in execution order. Its
//! existence alone discriminates install vs. upgrade mode: no file means a
//! fresh install. The set is an explicit value passed through the
//! transaction runner, never process-wide state.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::error::TransactionError;

/// Name of the selection file inside the bundle root.
pub const SELECTION_FILE: &str = ".selection";

/// Ordered sequence of bundle ids, duplicates forbidden, representing the
/// resolved installed state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<String>,
}

impl SelectionSet {
    /// Build a selection from ids, dropping duplicates while keeping the
    /// first occurrence's position.
    #[must_use]
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::default();
        for id in ids {
            selection.push(id.into());
        }
        selection
    }

    fn push(&mut self, id: String) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    /// Bundle ids in execution order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Whether `id` is part of the selection.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// Number of selected bundles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the selection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Compute `(self ∪ additions) \ removals`: untouched members keep
    /// their relative order, new additions append at the end. The result
    /// still needs re-resolution before it can be applied.
    #[must_use]
    pub fn apply_edits(&self, additions: &[String], removals: &[String]) -> Self {
        let mut edited = Self::default();
        for id in &self.ids {
            if !removals.contains(id) {
                edited.push(id.clone());
            }
        }
        for id in additions {
            if !removals.contains(id) {
                edited.push(id.clone());
            }
        }
        edited
    }
}

/// Persistence for the [`SelectionSet`].
#[derive(Debug, Clone)]
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    /// Store rooted at the standard selection file under `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(SELECTION_FILE),
        }
    }

    /// The selection file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted selection.
    ///
    /// Returns `None` when the file does not exist — the fresh-install
    /// signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(&self) -> Result<Option<SelectionSet>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let ids = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        Ok(Some(SelectionSet::from_ids(ids)))
    }

    /// Overwrite the selection file near-atomically: write a sibling temp
    /// file, then rename over the target.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::SelectionWrite`] on any I/O failure.
    pub fn save(&self, selection: &SelectionSet) -> Result<(), TransactionError> {
        let mut content = selection.ids.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        let tmp = self.path.with_extension("tmp");
        let write = std::fs::write(&tmp, content)
            .and_then(|()| std::fs::rename(&tmp, &self.path));
        write.map_err(|source| TransactionError::SelectionWrite {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn from_ids_drops_duplicates_keeping_first_position() {
        let s = SelectionSet::from_ids(["a", "b", "a", "c"]);
        assert_eq!(s.ids(), ids(&["a", "b", "c"]).as_slice());
    }

    #[test]
    fn apply_edits_appends_additions_at_end() {
        let s = SelectionSet::from_ids(["a", "b"]);
        let edited = s.apply_edits(&ids(&["c"]), &[]);
        assert_eq!(edited.ids(), ids(&["a", "b", "c"]).as_slice());
    }

    #[test]
    fn apply_edits_preserves_untouched_order_on_removal() {
        let s = SelectionSet::from_ids(["a", "b", "c"]);
        let edited = s.apply_edits(&[], &ids(&["b"]));
        assert_eq!(edited.ids(), ids(&["a", "c"]).as_slice());
    }

    #[test]
    fn apply_edits_existing_addition_is_a_no_op() {
        let s = SelectionSet::from_ids(["a", "b"]);
        let edited = s.apply_edits(&ids(&["a"]), &[]);
        assert_eq!(edited.ids(), ids(&["a", "b"]).as_slice());
    }

    #[test]
    fn apply_edits_removal_beats_addition() {
        let s = SelectionSet::from_ids(["a"]);
        let edited = s.apply_edits(&ids(&["b"]), &ids(&["b"]));
        assert_eq!(edited.ids(), ids(&["a"]).as_slice());
    }

    #[test]
    fn load_missing_file_signals_fresh_install() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SelectionStore::new(tmp.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_round_trips_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SelectionStore::new(tmp.path());
        let selection = SelectionSet::from_ids(["core", "vim", "work"]);
        store.save(&selection).unwrap();
        assert_eq!(store.load().unwrap(), Some(selection));
    }

    #[test]
    fn save_overwrites_previous_content() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SelectionStore::new(tmp.path());
        store.save(&SelectionSet::from_ids(["a", "b"])).unwrap();
        store.save(&SelectionSet::from_ids(["c"])).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.ids(), ids(&["c"]).as_slice());
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SelectionStore::new(tmp.path());
        store.save(&SelectionSet::from_ids(["a"])).unwrap();
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn load_skips_blank_lines() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(SELECTION_FILE), "a\n\nb\n").unwrap();
        let store = SelectionStore::new(tmp.path());
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.ids(), ids(&["a", "b"]).as_slice());
    }

    #[test]
    fn empty_selection_saves_empty_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SelectionStore::new(tmp.path());
        store.save(&SelectionSet::default()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert!(loaded.is_empty());
    }
}
