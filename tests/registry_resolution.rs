#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
//! Integration tests for on-disk discovery feeding the resolver: the
//! descriptor files written to a real bundle root must produce the same
//! execution orders the resolver unit tests establish in memory.

mod common;

use bundles_cli::registry::BundleRegistry;
use bundles_cli::resolver;

use common::TestRoot;

fn ids(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Requesting two bundles with a shared dependency pulls the dependency in
/// once, ahead of both dependents.
#[test]
fn shared_dependency_from_disk() {
    let root = TestRoot::new();
    root.add_bundle("core", "order=10\n")
        .add_bundle("develop", "order=20\nrequires=core\n")
        .add_bundle("work", "order=20\nrequires=core\n");

    let registry = BundleRegistry::discover(root.path()).unwrap();
    let resolved = resolver::resolve(&registry, &ids(&["develop", "work"])).unwrap();
    assert_eq!(resolved, ids(&["core", "develop", "work"]));
}

/// A cycle written to disk fails resolution the same way every time.
#[test]
fn cycle_from_disk_is_deterministic() {
    let root = TestRoot::new();
    root.add_bundle("a", "requires=b\n")
        .add_bundle("b", "requires=c\n")
        .add_bundle("c", "requires=a\n");

    let registry = BundleRegistry::discover(root.path()).unwrap();
    let first = resolver::resolve(&registry, &ids(&["a"])).unwrap_err();
    let second = resolver::resolve(&registry, &ids(&["a"])).unwrap_err();
    assert_eq!(first, second);
}

/// Engine state directories (leading dot) never become bundles.
#[test]
fn snapshot_store_is_not_a_bundle() {
    let root = TestRoot::new();
    root.add_bundle("core", "order=10\n");
    std::fs::create_dir_all(root.path().join(".snapshots/20240101-000000")).unwrap();

    let registry = BundleRegistry::discover(root.path()).unwrap();
    assert_eq!(registry.len(), 1);
    assert!(registry.get("core").is_ok());
}
