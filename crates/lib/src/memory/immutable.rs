//! Copy-on-write in-memory tree.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use im::Vector;

use crate::{
    Result,
    node::{
        ChildNodes, ChildWriter, HasChildNodes, HasKey, HasValue, HierarchyError,
        IdentifiableChildren, NodeFactory, Refresh, ValueWriter, describe_key, describe_node,
    },
};

/// An immutable tree node.
///
/// Every write returns a new node and leaves the original untouched, so older
/// roots remain valid snapshots. Children are kept in insertion order in a
/// persistent vector; unchanged subtrees are shared between versions.
pub struct ImmutableNode<K, V> {
    inner: Arc<NodeData<K, V>>,
}

#[derive(Clone)]
struct NodeData<K, V> {
    key: Option<K>,
    value: Option<V>,
    children: Vector<ImmutableNode<K, V>>,
}

impl<K, V> ImmutableNode<K, V> {
    fn from_data(data: NodeData<K, V>) -> Self {
        Self {
            inner: Arc::new(data),
        }
    }

    /// Creates a keyless root node without a value.
    pub fn root() -> Self {
        Self::from_data(NodeData {
            key: None,
            value: None,
            children: Vector::new(),
        })
    }

    /// Creates a detached node for `key` without a value.
    pub fn new(key: K) -> Self {
        Self::from_data(NodeData {
            key: Some(key),
            value: None,
            children: Vector::new(),
        })
    }

    /// Creates a detached leaf for `key` holding `value`.
    pub fn leaf(key: K, value: V) -> Self {
        Self::from_data(NodeData {
            key: Some(key),
            value: Some(value),
            children: Vector::new(),
        })
    }

    /// Returns the number of direct children.
    pub fn child_count(&self) -> usize {
        self.inner.children.len()
    }
}

impl<K: PartialEq, V> ImmutableNode<K, V> {
    fn position(&self, key: &K) -> Option<usize> {
        self.inner
            .children
            .iter()
            .position(|child| child.inner.key.as_ref() == Some(key))
    }
}

impl<K: Clone, V: Clone> ImmutableNode<K, V> {
    fn modified(&self, edit: impl FnOnce(&mut NodeData<K, V>)) -> Self {
        let mut data = (*self.inner).clone();
        edit(&mut data);
        Self::from_data(data)
    }
}

impl<K, V> Clone for ImmutableNode<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> PartialEq for ImmutableNode<K, V> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<K, V> Eq for ImmutableNode<K, V> {}

impl<K, V> Hash for ImmutableNode<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.inner), state);
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ImmutableNode<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImmutableNode")
            .field("key", &self.inner.key)
            .field("value", &self.inner.value)
            .field("children", &self.inner.children.len())
            .finish()
    }
}

impl<K: Clone, V> HasKey for ImmutableNode<K, V> {
    type Key = K;

    fn try_get_key(&self) -> Option<K> {
        self.inner.key.clone()
    }
}

impl<K, V: Clone> HasValue for ImmutableNode<K, V> {
    type Value = V;

    fn try_get_value(&self) -> Option<V> {
        self.inner.value.clone()
    }

    fn has_value(&self) -> bool {
        self.inner.value.is_some()
    }
}

impl<K: Clone, V: Clone> ValueWriter for ImmutableNode<K, V> {
    fn set_value(self, value: V) -> Result<Self> {
        Ok(self.modified(|data| data.value = Some(value)))
    }

    fn remove_value(self) -> Result<(Self, bool)> {
        if self.inner.value.is_none() {
            return Ok((self, false));
        }
        Ok((self.modified(|data| data.value = None), true))
    }
}

impl<K, V> HasChildNodes for ImmutableNode<K, V> {
    fn has_child_nodes(&self) -> bool {
        !self.inner.children.is_empty()
    }

    fn child_nodes(&self) -> ChildNodes<'_, Self> {
        Box::new(self.inner.children.iter().cloned().map(Ok))
    }
}

impl<K: Clone + PartialEq, V> IdentifiableChildren for ImmutableNode<K, V> {
    fn try_get_child_node(&self, key: &K) -> Result<Option<Self>> {
        Ok(self
            .position(key)
            .map(|index| self.inner.children[index].clone()))
    }
}

impl<K, V> ChildWriter for ImmutableNode<K, V>
where
    K: Clone + PartialEq + fmt::Debug,
    V: Clone,
{
    fn add_child(self, child: Self) -> Result<Self> {
        let Some(key) = child.inner.key.as_ref() else {
            return Err(HierarchyError::MissingKeyOnChild {
                parent: describe_node(&self),
            }
            .into());
        };
        if self.position(key).is_some() {
            return Err(HierarchyError::DuplicateKey {
                key: describe_key(key),
            }
            .into());
        }
        Ok(self.modified(|data| data.children.push_back(child)))
    }

    fn remove_child(self, child: &Self) -> Result<(Self, bool)> {
        let index = self.indexed_position(child)?;
        if child.has_child_nodes() {
            return Err(HierarchyError::NonEmptyNode {
                key: describe_node(child),
            }
            .into());
        }
        let updated = self.modified(|data| {
            data.children.remove(index);
        });
        Ok((updated, true))
    }

    fn replace_child(self, old: &Self, new: Self) -> Result<Self> {
        if old.inner.key != new.inner.key {
            return Err(HierarchyError::KeyMismatch {
                expected: describe_node(old),
                actual: describe_node(&new),
            }
            .into());
        }
        let index = self.indexed_position(old)?;
        if *old == new {
            return Ok(self);
        }
        Ok(self.modified(|data| {
            data.children.set(index, new);
        }))
    }
}

impl<K, V> ImmutableNode<K, V>
where
    K: Clone + PartialEq + fmt::Debug,
{
    /// Finds the index of `child`, which must be the node indexed under its key.
    fn indexed_position(&self, child: &Self) -> Result<usize> {
        let stale = || HierarchyError::StaleReference {
            key: describe_node(child),
        };
        let key = child.inner.key.as_ref().ok_or_else(stale)?;
        match self.position(key) {
            Some(index) if self.inner.children[index] == *child => Ok(index),
            _ => Err(stale().into()),
        }
    }
}

impl<K: Clone, V> NodeFactory for ImmutableNode<K, V> {
    fn create_child(&self, key: K) -> Result<Self> {
        Ok(Self::new(key))
    }
}

// Versions are immutable; a handle is always current.
impl<K, V> Refresh for ImmutableNode<K, V> {
    fn refresh(&self) -> Result<Self> {
        Ok(self.clone())
    }
}

impl<K, V> Default for ImmutableNode<K, V> {
    fn default() -> Self {
        Self::root()
    }
}
