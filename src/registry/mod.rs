//! Bundle discovery and availability queries.
//!
//! The registry scans the bundle root once at load time: every subdirectory
//! becomes a bundle, with its `bundle.conf` (if any) parsed into a
//! [`BundleDescriptor`]. Descriptors are immutable for the process lifetime.

pub mod descriptor;

pub use descriptor::{BundleDescriptor, DEFAULT_ORDER};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::RegistryError;

/// Name of the per-bundle descriptor file.
pub const DESCRIPTOR_FILE: &str = "bundle.conf";

/// In-memory view of all bundles under a bundle root.
#[derive(Debug, Clone)]
pub struct BundleRegistry {
    root: PathBuf,
    bundles: BTreeMap<String, BundleDescriptor>,
}

impl BundleRegistry {
    /// Scan `root` and parse every bundle subdirectory.
    ///
    /// A subdirectory with no descriptor file still becomes a bundle using
    /// defaults. Non-directories at the top level are ignored, as are
    /// hidden directories (leading `.`), which hold engine state such as
    /// the snapshot store.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be read or a descriptor file
    /// exists but cannot be parsed.
    pub fn discover(root: &Path) -> Result<Self, RegistryError> {
        let entries = std::fs::read_dir(root).map_err(|source| RegistryError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let mut bundles = BTreeMap::new();
        for entry in entries {
            let entry = entry.map_err(|source| RegistryError::Io {
                path: root.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(id) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if id.starts_with('.') {
                continue;
            }
            let descriptor = Self::load_descriptor(id, &path)?;
            bundles.insert(id.to_string(), descriptor);
        }

        Ok(Self {
            root: root.to_path_buf(),
            bundles,
        })
    }

    fn load_descriptor(id: &str, dir: &Path) -> Result<BundleDescriptor, RegistryError> {
        let conf = dir.join(DESCRIPTOR_FILE);
        if !conf.exists() {
            return Ok(BundleDescriptor::with_defaults(id));
        }
        let content = std::fs::read_to_string(&conf).map_err(|source| RegistryError::Io {
            path: conf.clone(),
            source,
        })?;
        descriptor::parse(id, &conf, &content)
    }

    /// Build a registry from pre-parsed descriptors (testing seam).
    #[must_use]
    pub fn from_descriptors(descriptors: Vec<BundleDescriptor>) -> Self {
        Self {
            root: PathBuf::new(),
            bundles: descriptors
                .into_iter()
                .map(|d| (d.id.clone(), d))
                .collect(),
        }
    }

    /// The scanned bundle root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source directory of a bundle.
    #[must_use]
    pub fn bundle_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Look up a bundle descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown ids.
    pub fn get(&self, id: &str) -> Result<&BundleDescriptor, RegistryError> {
        self.bundles
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Whether a bundle exists and is enabled.
    #[must_use]
    pub fn is_available(&self, id: &str) -> bool {
        self.bundles.get(id).is_some_and(|d| d.enabled)
    }

    /// Raw descriptor value lookup with a caller-supplied default.
    #[must_use]
    pub fn config_value<'a>(&'a self, id: &str, key: &str, default: &'a str) -> &'a str {
        self.bundles
            .get(id)
            .and_then(|d| d.value(key))
            .unwrap_or(default)
    }

    /// All bundles, id-ordered.
    pub fn all(&self) -> impl Iterator<Item = &BundleDescriptor> {
        self.bundles.values()
    }

    /// Listable bundles: enabled and not hidden, id-ordered.
    pub fn visible(&self) -> impl Iterator<Item = &BundleDescriptor> {
        self.bundles.values().filter(|d| d.enabled && !d.hidden)
    }

    /// Number of known bundles (including disabled and hidden ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn write_bundle(root: &Path, id: &str, conf: Option<&str>) {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        if let Some(content) = conf {
            std::fs::write(dir.join(DESCRIPTOR_FILE), content).unwrap();
        }
    }

    #[test]
    fn discover_parses_descriptors() {
        let tmp = tempfile::tempdir().unwrap();
        write_bundle(tmp.path(), "core", Some("name=\"Core\"\norder=10\n"));
        write_bundle(tmp.path(), "vim", Some("requires=core\n"));

        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("core").unwrap().display_name, "Core");
        assert_eq!(registry.get("core").unwrap().order, 10);
        assert_eq!(registry.get("vim").unwrap().requires, vec!["core"]);
    }

    #[test]
    fn directory_without_descriptor_gets_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        write_bundle(tmp.path(), "plain", None);

        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        let d = registry.get("plain").unwrap();
        assert_eq!(d.display_name, "plain");
        assert_eq!(d.order, DEFAULT_ORDER);
        assert!(d.enabled);
    }

    #[test]
    fn files_and_hidden_dirs_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        write_bundle(tmp.path(), "real", None);
        std::fs::create_dir_all(tmp.path().join(".snapshots")).unwrap();
        std::fs::write(tmp.path().join("README.md"), "hi").unwrap();

        let registry = BundleRegistry::discover(tmp.path()).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("real").is_ok());
    }

    #[test]
    fn unknown_id_is_not_found() {
        let registry = BundleRegistry::from_descriptors(vec![]);
        let err = registry.get("ghost").unwrap_err();
        assert_eq!(err.to_string(), "unknown bundle 'ghost'");
    }

    #[test]
    fn is_available_requires_enabled() {
        let mut disabled = BundleDescriptor::with_defaults("off");
        disabled.enabled = false;
        let registry = BundleRegistry::from_descriptors(vec![
            BundleDescriptor::with_defaults("on"),
            disabled,
        ]);
        assert!(registry.is_available("on"));
        assert!(!registry.is_available("off"));
        assert!(!registry.is_available("ghost"));
    }

    #[test]
    fn config_value_falls_back_to_default() {
        let mut d = BundleDescriptor::with_defaults("x");
        d.raw.push(("flavour".to_string(), "spicy".to_string()));
        let registry = BundleRegistry::from_descriptors(vec![d]);
        assert_eq!(registry.config_value("x", "flavour", "mild"), "spicy");
        assert_eq!(registry.config_value("x", "missing", "mild"), "mild");
        assert_eq!(registry.config_value("ghost", "flavour", "mild"), "mild");
    }

    #[test]
    fn visible_excludes_hidden_and_disabled() {
        let mut hidden = BundleDescriptor::with_defaults("hidden");
        hidden.hidden = true;
        let mut disabled = BundleDescriptor::with_defaults("disabled");
        disabled.enabled = false;
        let registry = BundleRegistry::from_descriptors(vec![
            BundleDescriptor::with_defaults("shown"),
            hidden,
            disabled,
        ]);
        let visible: Vec<&str> = registry.visible().map(|d| d.id.as_str()).collect();
        assert_eq!(visible, vec!["shown"]);
    }

    #[test]
    fn invalid_descriptor_fails_discovery() {
        let tmp = tempfile::tempdir().unwrap();
        write_bundle(tmp.path(), "bad", Some("not a pair\n"));
        assert!(BundleRegistry::discover(tmp.path()).is_err());
    }
}
