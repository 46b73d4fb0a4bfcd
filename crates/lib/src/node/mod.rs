//! Node capability traits.
//!
//! A node type implements whichever of these small traits it can support, and
//! each algorithm in [`crate::algorithms`] names only the capabilities it needs.
//! Backends differ in how they realize a capability (an O(1) local change for the
//! in-memory trees, a store round-trip for documents), never in its contract.
//!
//! Nodes are handles: cloning one is cheap, and equality is node identity
//! (the same allocation, or the same stored document), not structural equality.
//!
//! Writer capabilities consume the node and hand back its successor. A mutable
//! backend returns the same handle; the copy-on-write backend returns a new node,
//! which the caller then swaps into the parent with [`ChildWriter::replace_child`].

use std::{fmt::Debug, hash::Hash};

use crate::Result;

pub mod errors;

pub use errors::HierarchyError;

/// A finite sequence of child nodes.
///
/// Each call to [`HasChildNodes::child_nodes`] produces a fresh sequence. Items
/// are fallible because a backend may have to load each child.
pub type ChildNodes<'a, N> = Box<dyn Iterator<Item = Result<N>> + 'a>;

/// Read access to the key of the edge leading to this node.
pub trait HasKey {
    type Key;

    /// Returns the node's key, or `None` for a root.
    fn try_get_key(&self) -> Option<Self::Key>;
}

/// Read access to the node's value payload.
///
/// A node without a value is a purely structural node; this is distinct from a
/// node that stores an "empty" value.
pub trait HasValue {
    type Value;

    fn try_get_value(&self) -> Option<Self::Value>;

    fn has_value(&self) -> bool {
        self.try_get_value().is_some()
    }
}

/// Write access to the node's value payload.
pub trait ValueWriter: HasValue + Sized {
    /// Stores `value`, replacing any previous one.
    fn set_value(self, value: Self::Value) -> Result<Self>;

    /// Clears the value. The flag reports whether a value was present.
    ///
    /// When no value was present the node is returned unchanged.
    fn remove_value(self) -> Result<(Self, bool)>;
}

/// Enumeration of child nodes, in the backend's natural order.
pub trait HasChildNodes: Sized {
    fn has_child_nodes(&self) -> bool;

    fn child_nodes(&self) -> ChildNodes<'_, Self>;
}

/// Lookup of a child node by key.
pub trait IdentifiableChildren: HasKey + Sized {
    fn try_get_child_node(&self, key: &Self::Key) -> Result<Option<Self>>;
}

/// Structural mutation of the child collection.
pub trait ChildWriter: Sized {
    /// Attaches `child` under its own key.
    ///
    /// Fails with [`HierarchyError::DuplicateKey`] if a sibling already uses the
    /// key, leaving the node unchanged.
    fn add_child(self, child: Self) -> Result<Self>;

    /// Detaches `child`, which must be a leaf.
    ///
    /// Fails with [`HierarchyError::StaleReference`] if `child` is not the node
    /// indexed under its key, and with [`HierarchyError::NonEmptyNode`] if it still
    /// has children. The flag is `false` when the backend could not complete the
    /// removal; the child then stays attached.
    fn remove_child(self, child: &Self) -> Result<(Self, bool)>;

    /// Swaps `old` for `new` under their shared key.
    ///
    /// Fails with [`HierarchyError::KeyMismatch`] if the keys differ and with
    /// [`HierarchyError::StaleReference`] if `old` is not the indexed child.
    fn replace_child(self, old: &Self, new: Self) -> Result<Self>;
}

/// Construction of new, detached child nodes compatible with this node.
pub trait NodeFactory: HasKey + Sized {
    fn create_child(&self, key: Self::Key) -> Result<Self>;
}

/// Re-reading a node from the state that backs it.
///
/// Write-through backends may have moved on from a handle when an operation
/// fails partway. `refresh` returns a handle that agrees with the backing
/// state again. Backends without shared backing state return the handle itself.
pub trait Refresh: Sized {
    fn refresh(&self) -> Result<Self>;
}

/// The full capability set required by [`crate::hierarchy::NodeHierarchy`].
pub trait HierarchyNode:
    HasKey<Key: Clone + Eq + Hash + Debug>
    + HasValue
    + ValueWriter
    + HasChildNodes
    + IdentifiableChildren
    + ChildWriter
    + NodeFactory
    + Refresh
    + Clone
    + PartialEq
{
}

impl<N> HierarchyNode for N where
    N: HasKey<Key: Clone + Eq + Hash + Debug>
        + HasValue
        + ValueWriter
        + HasChildNodes
        + IdentifiableChildren
        + ChildWriter
        + NodeFactory
        + Refresh
        + Clone
        + PartialEq
{
}

/// Renders a key for error messages.
pub(crate) fn describe_key<K: Debug>(key: &K) -> String {
    format!("{key:?}")
}

/// Renders the key of a node for error messages, using `<root>` for keyless nodes.
pub(crate) fn describe_node<N>(node: &N) -> String
where
    N: HasKey<Key: Debug>,
{
    node.try_get_key()
        .map(|key| describe_key(&key))
        .unwrap_or_else(|| "<root>".to_string())
}
