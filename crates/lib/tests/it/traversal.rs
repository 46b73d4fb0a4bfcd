//! Parent navigation and descendant walks over each backend.

use std::collections::HashSet;

use hierarchy::{
    Hierarchy, ImmutableHierarchy, MutableHierarchy, TraversalNode,
    node::{HasChildNodes, HasKey, HasValue, HierarchyNode},
};

use crate::helpers::{Key, Value, document_hierarchy, path, populate};

const ENTRIES: &[(&[&str], Value)] = &[(&["a"], 1), (&["a", "b"], 2), (&["c", "d"], 3)];

/// Collects `(path, value)` for every descendant of `root`.
fn walk<N>(root: TraversalNode<N>) -> Vec<(String, Option<Value>)>
where
    N: HierarchyNode<Key = Key, Value = Value>,
{
    let mut seen: Vec<_> = root
        .descendants()
        .map(|node| {
            let node = node.unwrap();
            (node.path().to_string(), node.try_get_value())
        })
        .collect();
    seen.sort();
    seen
}

fn expected_walk() -> Vec<(String, Option<Value>)> {
    vec![
        ("/a".to_string(), Some(1)),
        ("/a/b".to_string(), Some(2)),
        ("/c".to_string(), None),
        ("/c/d".to_string(), Some(3)),
    ]
}

#[test]
fn test_descendants_match_across_backends() {
    let mut immutable = ImmutableHierarchy::<Key, Value>::new();
    populate(&mut immutable, ENTRIES);
    assert_eq!(walk(immutable.traverse()), expected_walk());

    let mut mutable = MutableHierarchy::<Key, Value>::new();
    populate(&mut mutable, ENTRIES);
    assert_eq!(walk(mutable.traverse()), expected_walk());

    let (_store, mut document) = document_hierarchy();
    populate(&mut document, ENTRIES);
    assert_eq!(walk(document.traverse()), expected_walk());
}

#[test]
fn test_parent_chain_leads_back_to_root() {
    let (_store, mut hierarchy) = document_hierarchy();
    populate(&mut hierarchy, ENTRIES);

    let root = hierarchy.traverse();
    let deepest = root
        .descendants()
        .map(|node| node.unwrap())
        .find(|node| node.path() == &path(&["a", "b"]))
        .unwrap();

    assert_eq!(deepest.depth(), 2);
    let parent = deepest.parent_node().unwrap();
    assert_eq!(parent.try_get_key().as_deref(), Some("a"));
    assert_eq!(parent.path(), &path(&["a"]));

    let top = deepest.ancestors().last().unwrap();
    assert_eq!(top, &root);
    assert!(!top.has_parent_node());
    assert!(top.parent_node().is_err());
}

#[test]
fn test_decorators_hash_by_wrapped_node() {
    let mut hierarchy = MutableHierarchy::<Key, Value>::new();
    hierarchy.set(&path(&["a", "b"]), 1).unwrap();

    let walked: Vec<_> = hierarchy
        .traverse()
        .descendants()
        .map(|node| node.unwrap())
        .collect();
    let b = hierarchy.get_or_create(&path(&["a", "b"])).unwrap();
    let direct = TraversalNode::root(b);

    let set: HashSet<_> = walked.into_iter().collect();
    assert!(set.contains(&direct));
    assert_eq!(set.len(), 2);
}

#[test]
fn test_child_enumeration_is_repeatable() {
    let (_store, mut hierarchy) = document_hierarchy();
    populate(&mut hierarchy, ENTRIES);

    let root = hierarchy.traverse();
    let first: HashSet<_> = root.child_nodes().map(|c| c.unwrap().path().to_string()).collect();
    let second: HashSet<_> = root.child_nodes().map(|c| c.unwrap().path().to_string()).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert!(root.has_child_nodes());
}
