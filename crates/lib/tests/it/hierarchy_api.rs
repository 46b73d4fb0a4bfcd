//! Path-level behavior every hierarchy must share, checked against each backend.

use crate::helpers::{for_each_backend, path, populate, sorted_child_keys};

#[test]
fn test_set_then_get_returns_value() {
    for_each_backend(|name, hierarchy| {
        for (keys, value) in [(&[][..], 1), (&["a"][..], 2), (&["a", "b", "c"][..], 3)] {
            hierarchy.set(&path(keys), value).unwrap();
            assert_eq!(
                hierarchy.try_get_value(&path(keys)).unwrap(),
                Some(value),
                "{name}: {keys:?}"
            );
        }
        hierarchy.set(&path(&["a"]), 20).unwrap();
        assert_eq!(hierarchy.try_get_value(&path(&["a"])).unwrap(), Some(20), "{name}");
        assert_eq!(
            hierarchy.try_get_value(&path(&["a", "b", "c"])).unwrap(),
            Some(3),
            "{name}"
        );
    });
}

#[test]
fn test_missing_paths_read_as_absent() {
    for_each_backend(|name, hierarchy| {
        populate(hierarchy, &[(&["a", "b"], 1)]);
        assert_eq!(hierarchy.try_get_value(&path(&["a"])).unwrap(), None, "{name}");
        assert_eq!(hierarchy.try_get_value(&path(&["z"])).unwrap(), None, "{name}");
        assert!(hierarchy.contains(&path(&["a"])).unwrap(), "{name}");
        assert!(!hierarchy.contains(&path(&["a", "b", "c"])).unwrap(), "{name}");
        assert_eq!(hierarchy.child_keys(&path(&["z"])).unwrap(), None, "{name}");
    });
}

#[test]
fn test_add_refuses_occupied_value() {
    for_each_backend(|name, hierarchy| {
        hierarchy.add(&path(&["a", "b"]), 1).unwrap();
        let err = hierarchy.add(&path(&["a", "b"]), 2).unwrap_err();
        assert!(err.is_duplicate(), "{name}: {err}");
        assert_eq!(hierarchy.try_get_value(&path(&["a", "b"])).unwrap(), Some(1), "{name}");

        // A structural node without a value accepts an add.
        hierarchy.add(&path(&["a"]), 5).unwrap();
        assert_eq!(hierarchy.try_get_value(&path(&["a"])).unwrap(), Some(5), "{name}");
    });
}

#[test]
fn test_round_trip_children() {
    for_each_backend(|name, hierarchy| {
        populate(hierarchy, &[(&[], 0), (&["a"], 1), (&["a", "b"], 2), (&["c"], 3)]);
        assert_eq!(sorted_child_keys(hierarchy, &[]), vec!["a", "c"], "{name}");
        assert_eq!(sorted_child_keys(hierarchy, &["a"]), vec!["b"], "{name}");
        assert!(sorted_child_keys(hierarchy, &["c"]).is_empty(), "{name}");
    });
}

#[test]
fn test_scenario_root_value_and_pruned_child() {
    for_each_backend(|name, hierarchy| {
        let root = path(&[]);
        assert_eq!(hierarchy.try_get_value(&root).unwrap(), None, "{name}");

        hierarchy.add(&root, 42).unwrap();
        assert_eq!(hierarchy.try_get_value(&root).unwrap(), Some(42), "{name}");

        hierarchy.set(&path(&["x"]), 7).unwrap();
        assert_eq!(hierarchy.try_get_value(&path(&["x"])).unwrap(), Some(7), "{name}");
        assert_eq!(sorted_child_keys(hierarchy, &[]), vec!["x"], "{name}");

        assert!(hierarchy.remove_value_and_prune(&path(&["x"])).unwrap(), "{name}");
        assert!(sorted_child_keys(hierarchy, &[]).is_empty(), "{name}");
        assert_eq!(hierarchy.try_get_value(&root).unwrap(), Some(42), "{name}");
    });
}

#[test]
fn test_remove_value_and_prune_is_idempotent() {
    for_each_backend(|name, hierarchy| {
        populate(hierarchy, &[(&["a", "b"], 1), (&["a", "c"], 2)]);

        assert!(hierarchy.remove_value_and_prune(&path(&["a", "b"])).unwrap(), "{name}");
        let children = sorted_child_keys(hierarchy, &["a"]);
        assert!(!hierarchy.remove_value_and_prune(&path(&["a", "b"])).unwrap(), "{name}");
        assert_eq!(sorted_child_keys(hierarchy, &["a"]), children, "{name}");
        assert_eq!(hierarchy.try_get_value(&path(&["a", "c"])).unwrap(), Some(2), "{name}");
    });
}

#[test]
fn test_pruning_removes_deepest_valueless_ancestor() {
    for_each_backend(|name, hierarchy| {
        populate(hierarchy, &[(&["a", "b", "c"], 1), (&["x", "y"], 2)]);

        assert!(hierarchy.remove_value_and_prune(&path(&["a", "b", "c"])).unwrap(), "{name}");
        assert!(!hierarchy.contains(&path(&["a"])).unwrap(), "{name}");
        assert_eq!(sorted_child_keys(hierarchy, &[]), vec!["x"], "{name}");
        assert_eq!(hierarchy.try_get_value(&path(&["x", "y"])).unwrap(), Some(2), "{name}");
    });
}

#[test]
fn test_pruning_keeps_subtrees_that_still_hold_values() {
    for_each_backend(|name, hierarchy| {
        populate(hierarchy, &[(&["a"], 1), (&["a", "b"], 2)]);

        // Clearing an inner value keeps its valued descendant.
        assert!(hierarchy.remove_value_and_prune(&path(&["a"])).unwrap(), "{name}");
        assert!(hierarchy.contains(&path(&["a"])).unwrap(), "{name}");
        assert_eq!(hierarchy.try_get_value(&path(&["a"])).unwrap(), None, "{name}");
        assert_eq!(hierarchy.try_get_value(&path(&["a", "b"])).unwrap(), Some(2), "{name}");
    });
}

#[test]
fn test_prune_on_missing_path_changes_nothing() {
    for_each_backend(|name, hierarchy| {
        populate(hierarchy, &[(&["a"], 1)]);
        assert!(!hierarchy.remove_value_and_prune(&path(&["a", "missing"])).unwrap(), "{name}");
        assert!(!hierarchy.remove_value_and_prune(&path(&["b"])).unwrap(), "{name}");
        assert_eq!(hierarchy.try_get_value(&path(&["a"])).unwrap(), Some(1), "{name}");
    });
}

#[test]
fn test_prune_at_root_only_clears_value() {
    for_each_backend(|name, hierarchy| {
        populate(hierarchy, &[(&[], 1)]);
        assert!(hierarchy.remove_value_and_prune(&path(&[])).unwrap(), "{name}");
        assert!(hierarchy.contains(&path(&[])).unwrap(), "{name}");
        assert_eq!(hierarchy.try_get_value(&path(&[])).unwrap(), None, "{name}");
    });
}

#[test]
fn test_remove_non_empty_requires_recursion() {
    for_each_backend(|name, hierarchy| {
        populate(hierarchy, &[(&["a"], 1), (&["a", "b"], 2), (&["a", "b", "c"], 3)]);

        assert!(!hierarchy.remove(&path(&["a"]), false).unwrap(), "{name}");
        assert_eq!(hierarchy.try_get_value(&path(&["a", "b", "c"])).unwrap(), Some(3), "{name}");
        assert_eq!(sorted_child_keys(hierarchy, &["a"]), vec!["b"], "{name}");

        assert!(hierarchy.remove(&path(&["a"]), true).unwrap(), "{name}");
        assert!(!hierarchy.contains(&path(&["a"])).unwrap(), "{name}");
        assert!(!hierarchy.contains(&path(&["a", "b", "c"])).unwrap(), "{name}");
        assert!(sorted_child_keys(hierarchy, &[]).is_empty(), "{name}");
    });
}

#[test]
fn test_remove_leaf_and_missing_paths() {
    for_each_backend(|name, hierarchy| {
        populate(hierarchy, &[(&["a", "b"], 1)]);
        assert!(hierarchy.remove(&path(&["a", "b"]), false).unwrap(), "{name}");
        assert!(hierarchy.contains(&path(&["a"])).unwrap(), "{name}");
        assert!(!hierarchy.remove(&path(&["a", "b"]), false).unwrap(), "{name}");
        assert!(!hierarchy.remove(&path(&[]), true).unwrap(), "{name}");
    });
}
