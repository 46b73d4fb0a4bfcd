//! Tree nodes backed by a [`DocumentStore`].

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use tracing::{debug, error, trace, warn};

use super::{DocumentError, DocumentId, DocumentStore, NodeDocument};
use crate::{
    Result,
    node::{
        ChildNodes, ChildWriter, HasChildNodes, HasKey, HasValue, HierarchyError,
        IdentifiableChildren, NodeFactory, Refresh, ValueWriter, describe_key, describe_node,
    },
};

/// A tree node stored as one document.
///
/// The handle holds a snapshot of its document. Every write goes straight to
/// the store, in the order described in the [module docs](super), and the
/// returned successor carries the updated snapshot. Two handles are equal when
/// they refer to the same document identifier.
///
/// A node created through [`NodeFactory::create_child`] is *pending*: its
/// document is written only once it is attached to a parent with
/// [`ChildWriter::add_child`].
pub struct DocumentNode<K, V> {
    store: Arc<dyn DocumentStore<K, V>>,
    document: NodeDocument<K, V>,
    persisted: bool,
}

impl<K, V> DocumentNode<K, V> {
    /// Creates a pending node for `key` that is not yet stored.
    pub fn pending(store: Arc<dyn DocumentStore<K, V>>, key: K) -> Self {
        Self {
            store,
            document: NodeDocument::keyed(key),
            persisted: false,
        }
    }

    /// Stores a new, empty root document.
    pub fn create_root(store: Arc<dyn DocumentStore<K, V>>) -> Result<Self> {
        let document = NodeDocument::root();
        let id = store.insert(&document)?;
        debug!(id = %id, "Created root document");
        Ok(Self {
            store,
            document,
            persisted: true,
        })
    }

    /// Loads the node stored under `id`.
    pub fn open(store: Arc<dyn DocumentStore<K, V>>, id: &DocumentId) -> Result<Self> {
        let document = store
            .find_by_id(id)?
            .ok_or_else(|| DocumentError::DocumentNotFound { id: id.clone() })?;
        Ok(Self {
            store,
            document,
            persisted: true,
        })
    }

    pub fn id(&self) -> &DocumentId {
        self.document.id()
    }

    /// Returns the document snapshot held by this handle.
    pub fn document(&self) -> &NodeDocument<K, V> {
        &self.document
    }

    /// Returns `true` once the node's document has been written to the store.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore<K, V>> {
        &self.store
    }

    /// Writes the snapshot back to the store. Pending nodes are left in memory.
    fn persist(&self) -> Result<()> {
        if !self.persisted {
            return Ok(());
        }
        debug!(id = %self.id(), "Updating document");
        self.store.update(&self.document)
    }
}

impl<K, V> DocumentNode<K, V>
where
    K: Clone + PartialEq + fmt::Debug,
{
    /// Loads the child document referenced under `key`.
    fn load_child(&self, key: &K, id: &DocumentId) -> Result<Self> {
        trace!(parent = %self.id(), child = %id, "Loading child document");
        let Some(document) = self.store.find_by_id(id)? else {
            error!(
                parent = %self.id(),
                child = %id,
                key = ?key,
                "Parent references a document that does not exist"
            );
            return Err(DocumentError::DocumentNotFound { id: id.clone() }.into());
        };
        match document.key() {
            None => {
                error!(parent = %self.id(), child = %id, "Child document has no key");
                Err(HierarchyError::MissingKeyOnChild {
                    parent: describe_node(self),
                }
                .into())
            }
            Some(actual) if actual != key => Err(DocumentError::ChildKeyMismatch {
                parent: self.id().clone(),
                child: id.clone(),
                expected: describe_key(key),
                actual: describe_key(actual),
            }
            .into()),
            Some(_) => Ok(Self {
                store: Arc::clone(&self.store),
                document,
                persisted: true,
            }),
        }
    }
}

impl<K, V> DocumentNode<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    /// Returns the key of `child`, which must be the document referenced under it.
    fn indexed_key(&self, child: &Self) -> Result<K> {
        let stale = || HierarchyError::StaleReference {
            key: describe_node(child),
        };
        let key = child.document.key().cloned().ok_or_else(stale)?;
        match self.document.child_id(&key) {
            Some(id) if id == child.id() => Ok(key),
            _ => Err(stale().into()),
        }
    }
}

impl<K, V> Clone for DocumentNode<K, V>
where
    K: Clone,
    V: Clone,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            document: self.document.clone(),
            persisted: self.persisted,
        }
    }
}

impl<K, V> PartialEq for DocumentNode<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<K, V> Eq for DocumentNode<K, V> {}

impl<K, V> Hash for DocumentNode<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for DocumentNode<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentNode")
            .field("document", &self.document)
            .field("persisted", &self.persisted)
            .finish()
    }
}

impl<K: Clone, V> HasKey for DocumentNode<K, V> {
    type Key = K;

    fn try_get_key(&self) -> Option<K> {
        self.document.key().cloned()
    }
}

impl<K, V: Clone> HasValue for DocumentNode<K, V> {
    type Value = V;

    fn try_get_value(&self) -> Option<V> {
        self.document.value().cloned()
    }

    fn has_value(&self) -> bool {
        self.document.value().is_some()
    }
}

impl<K, V: Clone> ValueWriter for DocumentNode<K, V> {
    fn set_value(mut self, value: V) -> Result<Self> {
        self.document.set_value(value);
        self.persist()?;
        Ok(self)
    }

    fn remove_value(mut self) -> Result<(Self, bool)> {
        if self.document.take_value().is_none() {
            return Ok((self, false));
        }
        self.persist()?;
        Ok((self, true))
    }
}

impl<K, V> HasChildNodes for DocumentNode<K, V>
where
    K: Clone + PartialEq + fmt::Debug,
{
    fn has_child_nodes(&self) -> bool {
        self.document.has_children()
    }

    /// Loads each referenced child in the iteration order of the reference map.
    fn child_nodes(&self) -> ChildNodes<'_, Self> {
        Box::new(
            self.document
                .children()
                .iter()
                .map(move |(key, id)| self.load_child(key, id)),
        )
    }
}

impl<K, V> IdentifiableChildren for DocumentNode<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    fn try_get_child_node(&self, key: &K) -> Result<Option<Self>> {
        match self.document.child_id(key) {
            Some(id) => self.load_child(key, id).map(Some),
            None => Ok(None),
        }
    }
}

impl<K, V> ChildWriter for DocumentNode<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    /// Stores the child document, then references it and persists this node.
    fn add_child(mut self, child: Self) -> Result<Self> {
        let Some(key) = child.document.key().cloned() else {
            return Err(HierarchyError::MissingKeyOnChild {
                parent: describe_node(&self),
            }
            .into());
        };
        if self.document.child_id(&key).is_some() {
            return Err(HierarchyError::DuplicateKey {
                key: describe_key(&key),
            }
            .into());
        }
        if child.persisted {
            return Err(DocumentError::AlreadyPersisted {
                id: child.id().clone(),
            }
            .into());
        }

        let child_id = self.store.insert(&child.document)?;
        debug!(parent = %self.id(), child = %child_id, key = ?key, "Inserted child document");

        self.document.insert_child(key, child_id.clone());
        if let Err(err) = self.persist() {
            warn!(
                parent = %self.id(),
                child = %child_id,
                "Child document stored but parent could not be updated; child is unreferenced"
            );
            return Err(err);
        }
        Ok(self)
    }

    /// Deletes the child document, then drops the reference and persists this node.
    fn remove_child(mut self, child: &Self) -> Result<(Self, bool)> {
        let key = self.indexed_key(child)?;
        let current = self.load_child(&key, child.id())?;
        if current.document.has_children() {
            return Err(HierarchyError::NonEmptyNode {
                key: describe_key(&key),
            }
            .into());
        }

        if !self.store.delete(child.id())? {
            debug!(parent = %self.id(), child = %child.id(), "Store declined to delete child document");
            return Ok((self, false));
        }
        debug!(parent = %self.id(), child = %child.id(), key = ?key, "Deleted child document");

        self.document.remove_child(&key);
        if let Err(err) = self.persist() {
            warn!(
                parent = %self.id(),
                child = %child.id(),
                "Child document deleted but parent could not be updated; parent holds a dangling reference"
            );
            return Err(err);
        }
        Ok((self, true))
    }

    /// Points the reference for the shared key at `new`, storing `new` first if pending.
    fn replace_child(mut self, old: &Self, new: Self) -> Result<Self> {
        if old.document.key() != new.document.key() {
            return Err(HierarchyError::KeyMismatch {
                expected: describe_node(old),
                actual: describe_node(&new),
            }
            .into());
        }
        let key = self.indexed_key(old)?;
        if old == &new {
            return Ok(self);
        }

        if !new.persisted {
            self.store.insert(&new.document)?;
            debug!(parent = %self.id(), child = %new.id(), key = ?key, "Inserted replacement document");
        }
        self.document.insert_child(key, new.id().clone());
        self.persist()?;
        warn!(
            parent = %self.id(),
            replaced = %old.id(),
            "Replaced child document is no longer referenced"
        );
        Ok(self)
    }
}

impl<K: Clone, V: Clone> Refresh for DocumentNode<K, V> {
    /// Reloads the stored document. A pending node has nothing stored yet and
    /// is returned as is.
    fn refresh(&self) -> Result<Self> {
        if !self.persisted {
            return Ok(self.clone());
        }
        trace!(id = %self.id(), "Reloading document");
        let document = self
            .store
            .find_by_id(self.id())?
            .ok_or_else(|| DocumentError::DocumentNotFound {
                id: self.id().clone(),
            })?;
        Ok(Self {
            store: Arc::clone(&self.store),
            document,
            persisted: true,
        })
    }
}

impl<K: Clone, V> NodeFactory for DocumentNode<K, V> {
    fn create_child(&self, key: K) -> Result<Self> {
        Ok(Self::pending(Arc::clone(&self.store), key))
    }
}
