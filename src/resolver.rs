//! Dependency resolution: expand a requested bundle set into a cycle-free
//! execution order.
//!
//! Classic depth-first topological sort with a tri-state visited map
//! (unvisited / in-progress / done). The post-order output guarantees every
//! dependency precedes its dependents; a second stable sort by the `order`
//! field then applies operator-declared priorities, with ties keeping their
//! topological position. The resolver does not verify that `order` values
//! are consistent with the graph — [`order_conflicts`] reports
//! inconsistencies so callers can warn.
//!
//! Pure functions: no side effects, deterministic for a given registry and
//! input order.

use std::collections::HashMap;

use crate::error::ResolveError;
use crate::registry::{BundleRegistry, DEFAULT_ORDER};

/// Visit state during depth-first expansion. Absence from the map means
/// unvisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current recursion path; revisiting means a cycle.
    InProgress,
    /// Fully resolved and already in the output.
    Done,
}

/// Expand `requested` into its full transitive dependency closure, ordered
/// for safe sequential application.
///
/// Every requested id plus its transitive dependencies appears exactly
/// once, each dependency preceding its dependents (when `order` values are
/// consistent with the graph). Idempotent: resolving an already-resolved
/// list returns it unchanged.
///
/// # Errors
///
/// - [`ResolveError::NotFound`] if a requested or required id is unknown
///   or disabled.
/// - [`ResolveError::Cycle`] naming a member of the first cycle reached.
pub fn resolve(registry: &BundleRegistry, requested: &[String]) -> Result<Vec<String>, ResolveError> {
    let mut marks: HashMap<String, Mark> = HashMap::new();
    let mut output: Vec<String> = Vec::new();

    for id in requested {
        visit(registry, id, &mut marks, &mut output)?;
    }

    // Stable sort: equal orders keep their topological position, so
    // dependency ordering survives whenever `order` values agree with the
    // graph.
    output.sort_by_key(|id| registry.get(id).map_or(DEFAULT_ORDER, |d| d.order));
    Ok(output)
}

fn visit(
    registry: &BundleRegistry,
    id: &str,
    marks: &mut HashMap<String, Mark>,
    output: &mut Vec<String>,
) -> Result<(), ResolveError> {
    match marks.get(id) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => return Err(ResolveError::Cycle(id.to_string())),
        None => {}
    }
    if !registry.is_available(id) {
        return Err(ResolveError::NotFound(id.to_string()));
    }

    marks.insert(id.to_string(), Mark::InProgress);
    let requires = registry
        .get(id)
        .map_err(|_| ResolveError::NotFound(id.to_string()))?
        .requires
        .clone();
    for dep in &requires {
        visit(registry, dep, marks, output)?;
    }
    marks.insert(id.to_string(), Mark::Done);
    output.push(id.to_string());
    Ok(())
}

/// Report `(dependency, dependent)` pairs where an explicit `order` value
/// placed a dependency after its dependent in the resolved list.
///
/// The sorted order stands (the operator's `order` wins); callers surface
/// these pairs as warnings.
#[must_use]
pub fn order_conflicts(registry: &BundleRegistry, ordered: &[String]) -> Vec<(String, String)> {
    let position: HashMap<&str, usize> = ordered
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let mut conflicts = Vec::new();
    for (i, id) in ordered.iter().enumerate() {
        let Ok(descriptor) = registry.get(id) else {
            continue;
        };
        for dep in &descriptor.requires {
            if position.get(dep.as_str()).is_some_and(|&p| p > i) {
                conflicts.push((dep.clone(), id.clone()));
            }
        }
    }
    conflicts
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
    use crate::registry::BundleDescriptor;

    fn bundle(id: &str, order: i32, requires: &[&str]) -> BundleDescriptor {
        let mut d = BundleDescriptor::with_defaults(id);
        d.order = order;
        d.requires = requires.iter().map(|s| (*s).to_string()).collect();
        d
    }

    fn registry(bundles: Vec<BundleDescriptor>) -> BundleRegistry {
        BundleRegistry::from_descriptors(bundles)
    }

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn single_bundle_no_deps() {
        let reg = registry(vec![bundle("core", 10, &[])]);
        assert_eq!(resolve(&reg, &ids(&["core"])).unwrap(), ids(&["core"]));
    }

    #[test]
    fn dependency_precedes_dependent() {
        let reg = registry(vec![bundle("core", 10, &[]), bundle("vim", 50, &["core"])]);
        assert_eq!(resolve(&reg, &ids(&["vim"])).unwrap(), ids(&["core", "vim"]));
    }

    // Scenario A from the design notes: shared dependency, equal orders.
    #[test]
    fn shared_dependency_appears_once_and_first() {
        let reg = registry(vec![
            bundle("core", 10, &[]),
            bundle("develop", 20, &["core"]),
            bundle("work", 20, &["core"]),
        ]);
        let resolved = resolve(&reg, &ids(&["develop", "work"])).unwrap();
        assert_eq!(resolved, ids(&["core", "develop", "work"]));
    }

    // Scenario B: a→b→c→a must fail deterministically, naming a member.
    #[test]
    fn cycle_detected_and_named() {
        let reg = registry(vec![
            bundle("a", 50, &["b"]),
            bundle("b", 50, &["c"]),
            bundle("c", 50, &["a"]),
        ]);
        let err = resolve(&reg, &ids(&["a"])).unwrap_err();
        match &err {
            ResolveError::Cycle(id) => assert!(["a", "b", "c"].contains(&id.as_str())),
            other => panic!("expected Cycle, got {other:?}"),
        }
        // Deterministic: the same request names the same member.
        assert_eq!(resolve(&reg, &ids(&["a"])).unwrap_err(), err);
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let reg = registry(vec![bundle("a", 50, &["a"])]);
        assert_eq!(
            resolve(&reg, &ids(&["a"])).unwrap_err(),
            ResolveError::Cycle("a".to_string())
        );
    }

    #[test]
    fn unknown_requested_id_fails() {
        let reg = registry(vec![]);
        assert_eq!(
            resolve(&reg, &ids(&["ghost"])).unwrap_err(),
            ResolveError::NotFound("ghost".to_string())
        );
    }

    #[test]
    fn unknown_required_id_fails() {
        let reg = registry(vec![bundle("a", 50, &["missing"])]);
        assert_eq!(
            resolve(&reg, &ids(&["a"])).unwrap_err(),
            ResolveError::NotFound("missing".to_string())
        );
    }

    #[test]
    fn disabled_bundle_is_not_found() {
        let mut off = bundle("off", 50, &[]);
        off.enabled = false;
        let reg = registry(vec![off]);
        assert_eq!(
            resolve(&reg, &ids(&["off"])).unwrap_err(),
            ResolveError::NotFound("off".to_string())
        );
    }

    #[test]
    fn diamond_resolves_each_node_once() {
        let reg = registry(vec![
            bundle("base", 50, &[]),
            bundle("left", 50, &["base"]),
            bundle("right", 50, &["base"]),
            bundle("top", 50, &["left", "right"]),
        ]);
        let resolved = resolve(&reg, &ids(&["top"])).unwrap();
        assert_eq!(resolved, ids(&["base", "left", "right", "top"]));
    }

    #[test]
    fn duplicate_requests_deduplicated() {
        let reg = registry(vec![bundle("core", 10, &[])]);
        assert_eq!(
            resolve(&reg, &ids(&["core", "core"])).unwrap(),
            ids(&["core"])
        );
    }

    #[test]
    fn resolve_is_idempotent() {
        let reg = registry(vec![
            bundle("core", 10, &[]),
            bundle("develop", 20, &["core"]),
            bundle("work", 20, &["core"]),
        ]);
        let once = resolve(&reg, &ids(&["develop", "work"])).unwrap();
        let twice = resolve(&reg, &once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn order_field_sorts_independent_bundles() {
        let reg = registry(vec![
            bundle("late", 90, &[]),
            bundle("early", 10, &[]),
            bundle("middle", 50, &[]),
        ]);
        let resolved = resolve(&reg, &ids(&["late", "middle", "early"])).unwrap();
        assert_eq!(resolved, ids(&["early", "middle", "late"]));
    }

    #[test]
    fn equal_orders_keep_topological_position() {
        // dep and user share order=50; stability must keep dep first.
        let reg = registry(vec![bundle("dep", 50, &[]), bundle("user", 50, &["dep"])]);
        assert_eq!(
            resolve(&reg, &ids(&["user"])).unwrap(),
            ids(&["dep", "user"])
        );
    }

    #[test]
    fn requires_expanded_in_declared_order() {
        let reg = registry(vec![
            bundle("z", 50, &[]),
            bundle("a", 50, &[]),
            bundle("top", 50, &["z", "a"]),
        ]);
        // Declared order z,a wins over alphabetical.
        assert_eq!(
            resolve(&reg, &ids(&["top"])).unwrap(),
            ids(&["z", "a", "top"])
        );
    }

    #[test]
    fn order_conflict_reported_not_fixed() {
        // The dependency carries a *higher* order than its dependent, so the
        // sort places it after — reported as a conflict, order still wins.
        let reg = registry(vec![bundle("dep", 90, &[]), bundle("user", 10, &["dep"])]);
        let resolved = resolve(&reg, &ids(&["user"])).unwrap();
        assert_eq!(resolved, ids(&["user", "dep"]));
        let conflicts = order_conflicts(&reg, &resolved);
        assert_eq!(conflicts, vec![("dep".to_string(), "user".to_string())]);
    }

    #[test]
    fn consistent_orders_have_no_conflicts() {
        let reg = registry(vec![bundle("dep", 10, &[]), bundle("user", 20, &["dep"])]);
        let resolved = resolve(&reg, &ids(&["user"])).unwrap();
        assert!(order_conflicts(&reg, &resolved).is_empty());
    }

    #[test]
    fn empty_request_resolves_to_empty() {
        let reg = registry(vec![bundle("core", 10, &[])]);
        assert!(resolve(&reg, &[]).unwrap().is_empty());
    }
}
