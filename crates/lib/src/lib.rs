//!
//! Hierarchy: path-addressed tree collections.
//! This library provides a tree-shaped collection whose values are addressed by a sequence of keys,
//! with interchangeable in-memory and document-store representations.
//!
//! ## Core Concepts
//!
//! * **Paths (`path::HierarchyPath`)**: An immutable sequence of keys walking from the root down through named child edges.
//! * **Capabilities (`node`)**: Small, independent traits a node type implements (key, value, children, lookup, child writes).
//!   Every algorithm asks only for the capabilities it needs.
//! * **Algorithms (`algorithms`)**: Get-or-create, set, add, remove, and remove-value-and-prune, written once against the
//!   capability traits and reused by every backend.
//! * **Backends**:
//!     * **`memory::ImmutableNode`**: A copy-on-write tree; every mutation produces a new path from the mutation point to the root.
//!     * **`memory::MutableNode`**: A shared-handle tree mutated in place.
//!     * **`document::DocumentNode`**: One stored document per node, linked to its children by a key→identifier map.
//! * **Traversal (`traversal::TraversalNode`)**: A decorator adding parent navigation and absolute paths to any backend
//!   without storing parent links in the tree itself.
//! * **Hierarchies (`hierarchy::Hierarchy`)**: The path-level API (`try_get_value`, `add`, `set`, `remove`,
//!   `remove_value_and_prune`) shared by all backends.

pub mod algorithms;
pub mod document;
pub mod hierarchy;
pub mod memory;
pub mod node;
pub mod path;
pub mod traversal;

pub use document::{DocumentId, DocumentNode, DocumentStore, InMemoryDocumentStore, NodeDocument};
pub use hierarchy::{DocumentHierarchy, Hierarchy, ImmutableHierarchy, MutableHierarchy, NodeHierarchy};
pub use memory::{ImmutableNode, MutableNode};
pub use path::HierarchyPath;
pub use traversal::TraversalNode;

/// Result type used throughout the hierarchy library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the hierarchy library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structural errors raised by node capabilities and path algorithms
    #[error(transparent)]
    Hierarchy(node::HierarchyError),

    /// Structured errors from the document-store backend
    #[error(transparent)]
    Document(document::DocumentError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Hierarchy(_) => "node",
            Error::Document(_) => "document",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Document(doc_err) => doc_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates an occupied key or value slot.
    pub fn is_duplicate(&self) -> bool {
        match self {
            Error::Hierarchy(err) => err.is_duplicate(),
            Error::Document(err) => err.is_duplicate(),
            _ => false,
        }
    }

    /// Check if this error indicates the caller held an outdated child reference.
    pub fn is_stale_reference(&self) -> bool {
        match self {
            Error::Hierarchy(err) => err.is_stale_reference(),
            _ => false,
        }
    }

    /// Check if this error indicates a key mismatch on replacement.
    pub fn is_key_mismatch(&self) -> bool {
        match self {
            Error::Hierarchy(err) => err.is_key_mismatch(),
            _ => false,
        }
    }

    /// Check if this error indicates corrupted or inconsistent tree data.
    pub fn is_integrity_error(&self) -> bool {
        match self {
            Error::Hierarchy(err) => err.is_integrity_error(),
            Error::Document(err) => err.is_integrity_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Serialize(_))
    }

    /// Check if this error came from the document-store backend.
    pub fn is_document_error(&self) -> bool {
        matches!(self, Error::Document(_))
    }
}
