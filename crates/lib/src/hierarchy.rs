//! The path-level hierarchy API.
//!
//! [`Hierarchy`] is what callers program against. [`NodeHierarchy`] implements
//! it once, for any root node with the full capability set, by delegating to
//! [`crate::algorithms`]. The concrete hierarchies are aliases selecting a node
//! type.

use std::{fmt, sync::Arc};

use tracing::{debug, warn};

use crate::{
    Error, Result,
    algorithms::{self, PruneOutcome},
    document::{DocumentId, DocumentNode, DocumentStore},
    memory::{ImmutableNode, MutableNode},
    node::{HierarchyError, HierarchyNode, NodeFactory},
    path::HierarchyPath,
    traversal::TraversalNode,
};

/// A tree-shaped collection whose values are addressed by key paths.
///
/// Missing nodes along a path are created by [`add`](Hierarchy::add) and
/// [`set`](Hierarchy::set); reads never create anything.
pub trait Hierarchy<K, V> {
    /// Returns the value stored at `path`, if the node exists and has one.
    fn try_get_value(&self, path: &HierarchyPath<K>) -> Result<Option<V>>;

    /// Returns `true` if a node exists at `path`, with or without a value.
    fn contains(&self, path: &HierarchyPath<K>) -> Result<bool>;

    /// Returns the keys of the children of the node at `path`, or `None` if
    /// there is no such node.
    fn child_keys(&self, path: &HierarchyPath<K>) -> Result<Option<Vec<K>>>;

    /// Stores `value` at `path`.
    ///
    /// Fails with [`HierarchyError::DuplicateValue`] if the node already has a value.
    fn add(&mut self, path: &HierarchyPath<K>, value: V) -> Result<()>;

    /// Stores `value` at `path`, replacing any existing value.
    fn set(&mut self, path: &HierarchyPath<K>, value: V) -> Result<()>;

    /// Removes the node at `path` together with its value.
    ///
    /// A node with children is only removed when `recurse` is set. Returns
    /// `false` if nothing was removed; the root path is never removed.
    fn remove(&mut self, path: &HierarchyPath<K>, recurse: bool) -> Result<bool>;

    /// Clears the value at `path` and prunes subtrees left without any value.
    ///
    /// Returns `true` if a value was cleared.
    fn remove_value_and_prune(&mut self, path: &HierarchyPath<K>) -> Result<bool>;
}

/// A [`Hierarchy`] over a root node of type `N`.
///
/// The root is replaced only when an operation succeeds. On failure the root
/// is refreshed from its backend: a copy-on-write root stays the previous
/// version, while write-through backends (mutable nodes, document stores) keep
/// the steps completed before the failure and the root reflects them.
pub struct NodeHierarchy<N> {
    root: N,
}

pub type ImmutableHierarchy<K, V> = NodeHierarchy<ImmutableNode<K, V>>;

pub type MutableHierarchy<K, V> = NodeHierarchy<MutableNode<K, V>>;

pub type DocumentHierarchy<K, V> = NodeHierarchy<DocumentNode<K, V>>;

/// Returns a child factory producing nodes compatible with `template`.
fn child_factory<N>(template: N) -> impl FnMut(&N::Key) -> Result<N>
where
    N: NodeFactory<Key: Clone>,
{
    move |key| template.create_child(key.clone())
}

impl<N> NodeHierarchy<N> {
    /// Wraps an existing root node.
    pub fn from_root(root: N) -> Self {
        Self { root }
    }

    /// Returns the current root node.
    pub fn root(&self) -> &N {
        &self.root
    }

    pub fn into_root(self) -> N {
        self.root
    }
}

impl<N: HierarchyNode> NodeHierarchy<N> {
    /// Runs `op` on the root and installs the new root if it succeeds.
    ///
    /// On failure the root is refreshed, so a write-through backend picks up
    /// whatever the failed operation already wrote. If the refresh fails as
    /// well the previous root is kept and the original error is returned.
    fn apply<T>(&mut self, op: impl FnOnce(N) -> Result<(N, T)>) -> Result<T> {
        match op(self.root.clone()) {
            Ok((root, output)) => {
                self.root = root;
                Ok(output)
            }
            Err(err) => {
                match self.root.refresh() {
                    Ok(root) => self.root = root,
                    Err(refresh_err) => warn!(
                        error = %refresh_err,
                        "Could not refresh the root after a failed operation; keeping the previous root"
                    ),
                }
                Err(err)
            }
        }
    }

    /// Returns a traversal decorator positioned at the root.
    pub fn traverse(&self) -> TraversalNode<N> {
        TraversalNode::root(self.root.clone())
    }

    /// Returns the node at `path`, creating it and any missing ancestors.
    pub fn get_or_create(&mut self, path: &HierarchyPath<N::Key>) -> Result<N> {
        let create = child_factory(self.root.clone());
        self.apply(|root| algorithms::get_or_create(root, path, create))
    }

    /// Like [`Hierarchy::remove_value_and_prune`], reporting whether anything
    /// was pruned.
    pub fn remove_value_and_prune_with_outcome(
        &mut self,
        path: &HierarchyPath<N::Key>,
    ) -> Result<PruneOutcome> {
        let outcome = self.apply(|root| algorithms::remove_value_and_prune(root, path))?;
        debug!(path = ?path, outcome = ?outcome, "Removed value");
        Ok(outcome)
    }
}

impl<N: HierarchyNode> Hierarchy<N::Key, N::Value> for NodeHierarchy<N> {
    fn try_get_value(&self, path: &HierarchyPath<N::Key>) -> Result<Option<N::Value>> {
        Ok(algorithms::try_get_node(&self.root, path)?.and_then(|node| node.try_get_value()))
    }

    fn contains(&self, path: &HierarchyPath<N::Key>) -> Result<bool> {
        Ok(algorithms::try_get_node(&self.root, path)?.is_some())
    }

    fn child_keys(&self, path: &HierarchyPath<N::Key>) -> Result<Option<Vec<N::Key>>> {
        let Some(node) = algorithms::try_get_node(&self.root, path)? else {
            return Ok(None);
        };
        let keys = node
            .child_nodes()
            .map(|child| {
                child?.try_get_key().ok_or_else(|| -> Error {
                    HierarchyError::MissingKeyOnChild {
                        parent: format!("{:?}", path.as_slice()),
                    }
                    .into()
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(keys))
    }

    fn add(&mut self, path: &HierarchyPath<N::Key>, value: N::Value) -> Result<()> {
        let create = child_factory(self.root.clone());
        self.apply(|root| Ok((algorithms::add_value(root, path, value, create)?, ())))
    }

    fn set(&mut self, path: &HierarchyPath<N::Key>, value: N::Value) -> Result<()> {
        let create = child_factory(self.root.clone());
        self.apply(|root| Ok((algorithms::set_value(root, path, value, create)?, ())))
    }

    fn remove(&mut self, path: &HierarchyPath<N::Key>, recurse: bool) -> Result<bool> {
        let removed = self.apply(|root| algorithms::remove_node(root, path, recurse))?;
        debug!(path = ?path, recurse, removed, "Removed node");
        Ok(removed)
    }

    fn remove_value_and_prune(&mut self, path: &HierarchyPath<N::Key>) -> Result<bool> {
        Ok(self
            .remove_value_and_prune_with_outcome(path)?
            .value_was_cleared())
    }
}

impl<K, V> NodeHierarchy<ImmutableNode<K, V>> {
    /// Creates an empty copy-on-write hierarchy.
    pub fn new() -> Self {
        Self::from_root(ImmutableNode::root())
    }
}

impl<K, V> NodeHierarchy<MutableNode<K, V>> {
    /// Creates an empty in-place hierarchy.
    pub fn new() -> Self {
        Self::from_root(MutableNode::root())
    }
}

impl<K, V> NodeHierarchy<DocumentNode<K, V>> {
    /// Creates a hierarchy with a new root document in `store`.
    pub fn create(store: Arc<dyn DocumentStore<K, V>>) -> Result<Self> {
        Ok(Self::from_root(DocumentNode::create_root(store)?))
    }

    /// Opens the hierarchy whose root document is `root_id`.
    pub fn open(store: Arc<dyn DocumentStore<K, V>>, root_id: &DocumentId) -> Result<Self> {
        Ok(Self::from_root(DocumentNode::open(store, root_id)?))
    }

    /// Returns the identifier of the root document.
    pub fn root_id(&self) -> &DocumentId {
        self.root.id()
    }
}

impl<N: Default> Default for NodeHierarchy<N> {
    fn default() -> Self {
        Self::from_root(N::default())
    }
}

impl<N: Clone> Clone for NodeHierarchy<N> {
    fn clone(&self) -> Self {
        Self::from_root(self.root.clone())
    }
}

impl<N: fmt::Debug> fmt::Debug for NodeHierarchy<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHierarchy")
            .field("root", &self.root)
            .finish()
    }
}
