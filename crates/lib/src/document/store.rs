//! Document store abstraction and its in-memory implementation.

use std::{
    collections::HashMap,
    fmt,
    hash::Hash,
    path::Path,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, trace};

use super::{DocumentError, DocumentId, NodeDocument};
use crate::Result;

/// Durable, identifier-addressed storage for node documents.
///
/// Each call is independent; the store is not expected to provide atomicity
/// across documents.
pub trait DocumentStore<K, V>: Send + Sync {
    /// Stores a new document and returns its identifier.
    ///
    /// Fails with [`DocumentError::DuplicateDocument`] if the identifier is taken.
    fn insert(&self, document: &NodeDocument<K, V>) -> Result<DocumentId>;

    /// Overwrites a stored document.
    ///
    /// Fails with [`DocumentError::DocumentNotFound`] if it is not stored.
    fn update(&self, document: &NodeDocument<K, V>) -> Result<()>;

    /// Deletes a document. Returns `false` if nothing was deleted.
    fn delete(&self, id: &DocumentId) -> Result<bool>;

    fn find_by_id(&self, id: &DocumentId) -> Result<Option<NodeDocument<K, V>>>;
}

/// The current store file format version.
const STORE_FILE_VERSION: u8 = 0;

fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// The leading part of a store file, read before the documents so that an
/// unknown format is reported before any document is decoded.
#[derive(Deserialize)]
struct StoreFileHeader {
    #[serde(rename = "_v", default)]
    version: u8,
}

#[derive(Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize, V: Serialize",
    deserialize = "K: Deserialize<'de> + Eq + Hash, V: Deserialize<'de>"
))]
struct StoreFile<K, V> {
    #[serde(rename = "_v", default, skip_serializing_if = "is_v0")]
    version: u8,
    documents: Vec<NodeDocument<K, V>>,
}

/// A document store keeping every document in a `HashMap`.
///
/// The whole collection can be saved to and loaded from a JSON file.
pub struct InMemoryDocumentStore<K, V> {
    documents: RwLock<HashMap<DocumentId, NodeDocument<K, V>>>,
}

impl<K, V> InMemoryDocumentStore<K, V> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<DocumentId, NodeDocument<K, V>>>> {
        self.documents
            .read()
            .map_err(|_| DocumentError::StorePoisoned.into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<DocumentId, NodeDocument<K, V>>>> {
        self.documents
            .write()
            .map_err(|_| DocumentError::StorePoisoned.into())
    }

    /// Returns the number of stored documents.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Returns the identifiers of all stored documents.
    pub fn all_ids(&self) -> Result<Vec<DocumentId>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    pub fn contains(&self, id: &DocumentId) -> Result<bool> {
        Ok(self.read()?.contains_key(id))
    }
}

impl<K, V> InMemoryDocumentStore<K, V>
where
    K: Clone + Serialize,
    V: Clone + Serialize,
{
    /// Saves every stored document to `path` as JSON.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let documents = self.read()?.values().cloned().collect();
        let file = StoreFile {
            version: STORE_FILE_VERSION,
            documents,
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl<K, V> InMemoryDocumentStore<K, V>
where
    K: DeserializeOwned + Eq + Hash,
    V: DeserializeOwned,
{
    /// Loads a store from a JSON file written by [`Self::save_to_file`].
    ///
    /// If the file does not exist, a new, empty store is returned. A file
    /// written in an unknown format fails with
    /// [`DocumentError::UnsupportedVersion`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let header: StoreFileHeader = serde_json::from_str(&json)?;
                if header.version != STORE_FILE_VERSION {
                    return Err(DocumentError::UnsupportedVersion {
                        version: header.version,
                    }
                    .into());
                }
                let file: StoreFile<K, V> = serde_json::from_str(&json)?;
                debug!(
                    version = file.version,
                    documents = file.documents.len(),
                    "Loaded document store"
                );
                let documents = file
                    .documents
                    .into_iter()
                    .map(|doc| (doc.id().clone(), doc))
                    .collect();
                Ok(Self {
                    documents: RwLock::new(documents),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl<K, V> DocumentStore<K, V> for InMemoryDocumentStore<K, V>
where
    K: Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn insert(&self, document: &NodeDocument<K, V>) -> Result<DocumentId> {
        let mut documents = self.write()?;
        let id = document.id().clone();
        if documents.contains_key(&id) {
            return Err(DocumentError::DuplicateDocument { id }.into());
        }
        trace!(id = %id, "Storing document");
        documents.insert(id.clone(), document.clone());
        Ok(id)
    }

    fn update(&self, document: &NodeDocument<K, V>) -> Result<()> {
        let mut documents = self.write()?;
        match documents.get_mut(document.id()) {
            Some(stored) => {
                *stored = document.clone();
                Ok(())
            }
            None => Err(DocumentError::DocumentNotFound {
                id: document.id().clone(),
            }
            .into()),
        }
    }

    fn delete(&self, id: &DocumentId) -> Result<bool> {
        Ok(self.write()?.remove(id).is_some())
    }

    fn find_by_id(&self, id: &DocumentId) -> Result<Option<NodeDocument<K, V>>> {
        Ok(self.read()?.get(id).cloned())
    }
}

impl<K, V> Default for InMemoryDocumentStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for InMemoryDocumentStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.documents.read().map(|docs| docs.len()).ok();
        f.debug_struct("InMemoryDocumentStore")
            .field("documents", &count)
            .finish()
    }
}
