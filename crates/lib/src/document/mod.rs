//! Document-store backend.
//!
//! Every node is a separately stored [`NodeDocument`] holding its key, its
//! value, and a map from child key to child [`DocumentId`]. The store offers no
//! cross-document transactions, so [`DocumentNode`] keeps the references
//! consistent by ordering its writes: a child document is always written before
//! the parent references it, and deleted before the parent drops the reference.
//! An interrupted mutation can therefore leave an unreferenced document behind
//! but never a reference to a document that was not yet written.

use std::{
    collections::HashMap,
    fmt,
    hash::Hash,
};

use serde::{Deserialize, Serialize};

pub mod errors;
mod node;
mod store;

pub use errors::DocumentError;
pub use node::DocumentNode;
pub use store::{DocumentStore, InMemoryDocumentStore};

/// Identifier of a stored node document.
///
/// Identifiers are assigned when the document is created, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0)
    }
}

/// The stored form of a single node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize, V: Serialize",
    deserialize = "K: Deserialize<'de> + Eq + Hash, V: Deserialize<'de>"
))]
pub struct NodeDocument<K, V> {
    id: DocumentId,
    key: Option<K>,
    value: Option<V>,
    #[serde(with = "child_references")]
    children: HashMap<K, DocumentId>,
}

impl<K, V> NodeDocument<K, V> {
    fn from_key(key: Option<K>) -> Self {
        Self {
            id: DocumentId::generate(),
            key,
            value: None,
            children: HashMap::new(),
        }
    }

    /// Creates a keyless root document with a fresh identifier.
    pub fn root() -> Self {
        Self::from_key(None)
    }

    /// Creates a document for `key` with a fresh identifier.
    pub fn keyed(key: K) -> Self {
        Self::from_key(Some(key))
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: V) {
        self.value = Some(value);
    }

    /// Removes and returns the value.
    pub fn take_value(&mut self) -> Option<V> {
        self.value.take()
    }

    /// Returns the child reference map.
    pub fn children(&self) -> &HashMap<K, DocumentId> {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

impl<K: Eq + Hash, V> NodeDocument<K, V> {
    /// Returns the identifier referenced under `key`.
    pub fn child_id(&self, key: &K) -> Option<&DocumentId> {
        self.children.get(key)
    }

    /// Records `id` under `key`, returning the identifier it replaced.
    pub fn insert_child(&mut self, key: K, id: DocumentId) -> Option<DocumentId> {
        self.children.insert(key, id)
    }

    /// Drops the reference under `key`.
    pub fn remove_child(&mut self, key: &K) -> Option<DocumentId> {
        self.children.remove(key)
    }
}

/// Serializes the child map as a list of `{ key, id }` entries so that keys
/// which are not strings survive formats like JSON.
mod child_references {
    use std::{collections::HashMap, hash::Hash};

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::DocumentId;

    #[derive(Serialize)]
    struct ChildRef<'a, K> {
        key: &'a K,
        id: &'a DocumentId,
    }

    #[derive(Deserialize)]
    struct OwnedChildRef<K> {
        key: K,
        id: DocumentId,
    }

    pub fn serialize<K, S>(
        children: &HashMap<K, DocumentId>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(children.iter().map(|(key, id)| ChildRef { key, id }))
    }

    pub fn deserialize<'de, K, D>(deserializer: D) -> Result<HashMap<K, DocumentId>, D::Error>
    where
        K: Deserialize<'de> + Eq + Hash,
        D: Deserializer<'de>,
    {
        let refs = Vec::<OwnedChildRef<K>>::deserialize(deserializer)?;
        Ok(refs.into_iter().map(|r| (r.key, r.id)).collect())
    }
}
