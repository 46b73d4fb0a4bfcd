//! Path-walking algorithms written against the node capability traits.
//!
//! Every function takes a node by value and returns its successor. Mutations
//! are threaded back up the path with [`ChildWriter::replace_child`], which is a
//! no-op whenever a backend hands back the same node, so the same code serves
//! copy-on-write, in-place and document-backed trees.
//!
//! Expected refusals (path does not resolve, no value to clear, non-empty node
//! without `recurse`) are `Ok` results; structural violations are errors.

use std::fmt::Debug;

use tracing::{debug, trace};

use crate::{
    Result,
    node::{
        ChildWriter, HasChildNodes, HasKey, HasValue, HierarchyError, IdentifiableChildren,
        ValueWriter, describe_key, describe_node,
    },
    path::HierarchyPath,
};

/// Result of [`remove_value_and_prune`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneOutcome {
    /// The path did not resolve or the node held no value; nothing changed.
    Unchanged,
    /// The value was cleared and every node on the path was kept.
    ValueCleared,
    /// The value was cleared and at least one valueless subtree was detached.
    Pruned,
}

impl PruneOutcome {
    pub fn value_was_cleared(self) -> bool {
        !matches!(self, PruneOutcome::Unchanged)
    }

    pub fn is_pruned(self) -> bool {
        matches!(self, PruneOutcome::Pruned)
    }
}

/// Puts `new` in place of `old` unless the backend returned the same node.
fn reattach<N>(parent: N, old: &N, new: N) -> Result<N>
where
    N: ChildWriter + PartialEq,
{
    if *old == new {
        Ok(parent)
    } else {
        parent.replace_child(old, new)
    }
}

/// Returns the child under `key`, creating and attaching it first if missing.
fn child_or_create<N, F>(node: N, key: &N::Key, create: &mut F) -> Result<(N, N)>
where
    N: HasKey<Key: Debug + PartialEq> + IdentifiableChildren + ChildWriter,
    F: FnMut(&N::Key) -> Result<N>,
{
    if let Some(child) = node.try_get_child_node(key)? {
        return Ok((node, child));
    }
    let created = create(key)?;
    if created.try_get_key().as_ref() != Some(key) {
        return Err(HierarchyError::KeyMismatch {
            expected: describe_key(key),
            actual: describe_node(&created),
        }
        .into());
    }
    trace!(key = ?key, "Creating missing child");
    let node = node.add_child(created)?;
    let child = node
        .try_get_child_node(key)?
        .ok_or_else(|| HierarchyError::StaleReference {
            key: describe_key(key),
        })?;
    Ok((node, child))
}

/// Walks `path` from `root`, creating every missing node with `create`.
///
/// `create` is called once per missing key, root to leaf. Returns the new root
/// together with the node the path leads to.
pub fn get_or_create<N, F>(root: N, path: &HierarchyPath<N::Key>, mut create: F) -> Result<(N, N)>
where
    N: HasKey<Key: Debug + PartialEq> + IdentifiableChildren + ChildWriter + Clone + PartialEq,
    F: FnMut(&N::Key) -> Result<N>,
{
    get_or_create_from(root, path, &mut create)
}

fn get_or_create_from<N, F>(node: N, path: &HierarchyPath<N::Key>, create: &mut F) -> Result<(N, N)>
where
    N: HasKey<Key: Debug + PartialEq> + IdentifiableChildren + ChildWriter + Clone + PartialEq,
    F: FnMut(&N::Key) -> Result<N>,
{
    let Some((key, rest)) = path.split_first() else {
        return Ok((node.clone(), node));
    };
    let (node, child) = child_or_create(node, key, create)?;
    let (new_child, descendant) = get_or_create_from(child.clone(), &rest, create)?;
    let node = reattach(node, &child, new_child)?;
    Ok((node, descendant))
}

/// Applies `update` to the node at `path`, creating missing nodes on the way.
fn update_at<N, F, W>(
    node: N,
    path: &HierarchyPath<N::Key>,
    create: &mut F,
    update: W,
) -> Result<N>
where
    N: HasKey<Key: Debug + PartialEq> + IdentifiableChildren + ChildWriter + Clone + PartialEq,
    F: FnMut(&N::Key) -> Result<N>,
    W: FnOnce(N) -> Result<N>,
{
    let Some((key, rest)) = path.split_first() else {
        return update(node);
    };
    let (node, child) = child_or_create(node, key, create)?;
    let new_child = update_at(child.clone(), &rest, create, update)?;
    reattach(node, &child, new_child)
}

/// Stores `value` at `path`, creating missing nodes and overwriting any
/// existing value.
pub fn set_value<N, F>(
    root: N,
    path: &HierarchyPath<N::Key>,
    value: N::Value,
    mut create: F,
) -> Result<N>
where
    N: HasKey<Key: Debug + PartialEq>
        + IdentifiableChildren
        + ChildWriter
        + ValueWriter
        + Clone
        + PartialEq,
    F: FnMut(&N::Key) -> Result<N>,
{
    update_at(root, path, &mut create, |node| node.set_value(value))
}

/// Stores `value` at `path`, failing with [`HierarchyError::DuplicateValue`] if
/// the node already holds one.
pub fn add_value<N, F>(
    root: N,
    path: &HierarchyPath<N::Key>,
    value: N::Value,
    mut create: F,
) -> Result<N>
where
    N: HasKey<Key: Debug + PartialEq>
        + IdentifiableChildren
        + ChildWriter
        + ValueWriter
        + Clone
        + PartialEq,
    F: FnMut(&N::Key) -> Result<N>,
{
    update_at(root, path, &mut create, |node| {
        if node.has_value() {
            return Err(HierarchyError::DuplicateValue {
                path: format!("{:?}", path.as_slice()),
            }
            .into());
        }
        node.set_value(value)
    })
}

/// Returns the node at `path`, or `None` if the path does not resolve.
pub fn try_get_node<N>(root: &N, path: &HierarchyPath<N::Key>) -> Result<Option<N>>
where
    N: IdentifiableChildren + Clone,
{
    let mut current = root.clone();
    for key in path {
        match current.try_get_child_node(key)? {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Returns `true` if `node` or any of its descendants holds a value.
pub fn subtree_has_value<N>(node: &N) -> Result<bool>
where
    N: HasValue + HasChildNodes,
{
    if node.has_value() {
        return Ok(true);
    }
    for child in node.child_nodes() {
        if subtree_has_value(&child?)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Detaches `child` from `parent`.
///
/// A child with children is only removed when `recurse` is set; its subtree is
/// then emptied depth-first, post-order, before the child itself is detached.
/// The flag is `true` only when the child and its whole subtree are gone. If a
/// descendant cannot be removed, everything still present stays attached and
/// the flag is `false`.
pub fn remove_node_recursively<N>(parent: N, child: N, recurse: bool) -> Result<(N, bool)>
where
    N: HasChildNodes + ChildWriter + Clone + PartialEq,
{
    if !child.has_child_nodes() {
        return parent.remove_child(&child);
    }
    if !recurse {
        trace!("Refusing to remove a non-empty node without recursion");
        return Ok((parent, false));
    }
    let (emptied, complete) = remove_children(child.clone())?;
    let parent = reattach(parent, &child, emptied.clone())?;
    if !complete {
        debug!("Subtree removal incomplete, keeping the remaining branch attached");
        return Ok((parent, false));
    }
    parent.remove_child(&emptied)
}

fn remove_children<N>(node: N) -> Result<(N, bool)>
where
    N: HasChildNodes + ChildWriter + Clone + PartialEq,
{
    let children = node.child_nodes().collect::<Result<Vec<_>>>()?;
    let mut node = node;
    for child in children {
        let (updated, removed) = remove_node_recursively(node, child, true)?;
        node = updated;
        if !removed {
            return Ok((node, false));
        }
    }
    Ok((node, true))
}

/// Removes the node at `path`. The root itself is never removed.
///
/// Returns `false` without changes if the path does not resolve or the node has
/// children and `recurse` is not set.
pub fn remove_node<N>(root: N, path: &HierarchyPath<N::Key>, recurse: bool) -> Result<(N, bool)>
where
    N: IdentifiableChildren + HasChildNodes + ChildWriter + Clone + PartialEq,
{
    let Some((key, rest)) = path.split_first() else {
        return Ok((root, false));
    };
    let Some(child) = root.try_get_child_node(key)? else {
        return Ok((root, false));
    };
    if rest.is_root() {
        return remove_node_recursively(root, child, recurse);
    }
    let (new_child, removed) = remove_node(child.clone(), &rest, recurse)?;
    let root = reattach(root, &child, new_child)?;
    Ok((root, removed))
}

/// Clears the value at `path` and prunes every subtree on the path that no
/// longer holds a value anywhere.
///
/// The root is never pruned. Subtrees that still hold a value below the
/// cleared node are kept intact.
pub fn remove_value_and_prune<N>(root: N, path: &HierarchyPath<N::Key>) -> Result<(N, PruneOutcome)>
where
    N: IdentifiableChildren + ValueWriter + HasChildNodes + ChildWriter + Clone + PartialEq,
{
    let Some((key, rest)) = path.split_first() else {
        let (node, cleared) = root.remove_value()?;
        let outcome = if cleared {
            PruneOutcome::ValueCleared
        } else {
            PruneOutcome::Unchanged
        };
        return Ok((node, outcome));
    };
    let Some(child) = root.try_get_child_node(key)? else {
        return Ok((root, PruneOutcome::Unchanged));
    };
    let (new_child, outcome) = remove_value_and_prune(child.clone(), &rest)?;
    if outcome == PruneOutcome::Unchanged {
        return Ok((root, outcome));
    }
    let root = reattach(root, &child, new_child.clone())?;
    if subtree_has_value(&new_child)? {
        return Ok((root, outcome));
    }
    let (root, pruned) = remove_node_recursively(root, new_child, true)?;
    Ok((root, if pruned { PruneOutcome::Pruned } else { outcome }))
}
