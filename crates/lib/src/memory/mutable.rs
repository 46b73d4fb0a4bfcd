//! Directly mutable in-memory tree.

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

use crate::{
    Result,
    node::{
        ChildNodes, ChildWriter, HasChildNodes, HasKey, HasValue, HierarchyError,
        IdentifiableChildren, NodeFactory, Refresh, ValueWriter, describe_key, describe_node,
    },
};

/// A shared handle to a tree node that is mutated in place.
///
/// Clones of a handle observe each other's writes. Children are stored in an
/// insertion-ordered list with a key index for constant-time lookup. Only
/// parent→child references exist, so the tree holds no reference cycles.
pub struct MutableNode<K, V> {
    inner: Rc<RefCell<NodeData<K, V>>>,
}

struct NodeData<K, V> {
    key: Option<K>,
    value: Option<V>,
    children: Vec<MutableNode<K, V>>,
    index: HashMap<K, MutableNode<K, V>>,
}

impl<K, V> MutableNode<K, V> {
    fn from_parts(key: Option<K>, value: Option<V>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(NodeData {
                key,
                value,
                children: Vec::new(),
                index: HashMap::new(),
            })),
        }
    }

    /// Creates a keyless root node without a value.
    pub fn root() -> Self {
        Self::from_parts(None, None)
    }

    /// Creates a detached node for `key` without a value.
    pub fn new(key: K) -> Self {
        Self::from_parts(Some(key), None)
    }

    /// Creates a detached leaf for `key` holding `value`.
    pub fn leaf(key: K, value: V) -> Self {
        Self::from_parts(Some(key), Some(value))
    }

    /// Returns the number of direct children.
    pub fn child_count(&self) -> usize {
        self.inner.borrow().children.len()
    }

    /// Returns `true` if `node` is this node or one of its descendants.
    fn contains_node(&self, node: &Self) -> bool {
        self == node
            || self
                .inner
                .borrow()
                .children
                .iter()
                .any(|child| child.contains_node(node))
    }
}

impl<K, V> Clone for MutableNode<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K, V> PartialEq for MutableNode<K, V> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<K, V> Eq for MutableNode<K, V> {}

impl<K, V> Hash for MutableNode<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.inner), state);
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MutableNode<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.borrow();
        f.debug_struct("MutableNode")
            .field("key", &data.key)
            .field("value", &data.value)
            .field("children", &data.children.len())
            .finish()
    }
}

impl<K: Clone, V> HasKey for MutableNode<K, V> {
    type Key = K;

    fn try_get_key(&self) -> Option<K> {
        self.inner.borrow().key.clone()
    }
}

impl<K, V: Clone> HasValue for MutableNode<K, V> {
    type Value = V;

    fn try_get_value(&self) -> Option<V> {
        self.inner.borrow().value.clone()
    }

    fn has_value(&self) -> bool {
        self.inner.borrow().value.is_some()
    }
}

impl<K, V: Clone> ValueWriter for MutableNode<K, V> {
    fn set_value(self, value: V) -> Result<Self> {
        self.inner.borrow_mut().value = Some(value);
        Ok(self)
    }

    fn remove_value(self) -> Result<(Self, bool)> {
        let removed = self.inner.borrow_mut().value.take().is_some();
        Ok((self, removed))
    }
}

impl<K, V> HasChildNodes for MutableNode<K, V> {
    fn has_child_nodes(&self) -> bool {
        !self.inner.borrow().children.is_empty()
    }

    fn child_nodes(&self) -> ChildNodes<'_, Self> {
        // Snapshot the handles so callers may mutate the node while iterating.
        let children = self.inner.borrow().children.clone();
        Box::new(children.into_iter().map(Ok))
    }
}

impl<K: Clone + Eq + Hash, V> IdentifiableChildren for MutableNode<K, V> {
    fn try_get_child_node(&self, key: &K) -> Result<Option<Self>> {
        Ok(self.inner.borrow().index.get(key).cloned())
    }
}

impl<K, V> ChildWriter for MutableNode<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    fn add_child(self, child: Self) -> Result<Self> {
        let Some(key) = child.try_get_key() else {
            return Err(HierarchyError::MissingKeyOnChild {
                parent: describe_node(&self),
            }
            .into());
        };
        if self.inner.borrow().index.contains_key(&key) {
            return Err(HierarchyError::DuplicateKey {
                key: describe_key(&key),
            }
            .into());
        }
        if child.contains_node(&self) {
            return Err(HierarchyError::CycleDetected {
                key: describe_key(&key),
            }
            .into());
        }
        {
            let mut data = self.inner.borrow_mut();
            data.index.insert(key, child.clone());
            data.children.push(child);
        }
        Ok(self)
    }

    fn remove_child(self, child: &Self) -> Result<(Self, bool)> {
        let key = self.indexed_key(child)?;
        if child.has_child_nodes() {
            return Err(HierarchyError::NonEmptyNode {
                key: describe_key(&key),
            }
            .into());
        }
        {
            let mut data = self.inner.borrow_mut();
            data.index.remove(&key);
            data.children.retain(|existing| existing != child);
        }
        Ok((self, true))
    }

    fn replace_child(self, old: &Self, new: Self) -> Result<Self> {
        let old_key = old.try_get_key();
        let new_key = new.try_get_key();
        if old_key != new_key {
            return Err(HierarchyError::KeyMismatch {
                expected: describe_node(old),
                actual: describe_node(&new),
            }
            .into());
        }
        let key = self.indexed_key(old)?;
        if *old == new {
            return Ok(self);
        }
        if new.contains_node(&self) {
            return Err(HierarchyError::CycleDetected {
                key: describe_key(&key),
            }
            .into());
        }
        {
            let mut data = self.inner.borrow_mut();
            if let Some(slot) = data.children.iter_mut().find(|existing| **existing == *old) {
                *slot = new.clone();
            }
            data.index.insert(key, new);
        }
        Ok(self)
    }
}

impl<K, V> MutableNode<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    /// Returns the key of `child`, which must be the node indexed under it.
    fn indexed_key(&self, child: &Self) -> Result<K> {
        let stale = || HierarchyError::StaleReference {
            key: describe_node(child),
        };
        let key = child.try_get_key().ok_or_else(stale)?;
        match self.inner.borrow().index.get(&key) {
            Some(indexed) if indexed == child => Ok(key),
            _ => Err(stale().into()),
        }
    }
}

impl<K: Clone, V> NodeFactory for MutableNode<K, V> {
    fn create_child(&self, key: K) -> Result<Self> {
        Ok(Self::new(key))
    }
}

// Every clone shares the node, so a handle is always current.
impl<K, V> Refresh for MutableNode<K, V> {
    fn refresh(&self) -> Result<Self> {
        Ok(self.clone())
    }
}

impl<K, V> Default for MutableNode<K, V> {
    fn default() -> Self {
        Self::root()
    }
}
