//! Error types for the document-store backend.
//!
//! These cover failures of the store protocol itself: missing or duplicate
//! documents and reference maps that disagree with the documents they point at.
//! Structural refusals shared with the in-memory backends are reported as
//! [`HierarchyError`](crate::node::HierarchyError).

use thiserror::Error;

use super::DocumentId;

/// Errors that can occur while reading or writing node documents.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A referenced document does not exist in the store.
    #[error("Document not found: {id}")]
    DocumentNotFound {
        /// The identifier that could not be resolved
        id: DocumentId,
    },

    /// A document with the same identifier is already stored.
    #[error("Document already exists: {id}")]
    DuplicateDocument {
        /// The identifier that is already taken
        id: DocumentId,
    },

    /// A node that is already stored was attached as a new child.
    #[error("Document {id} is already persisted and cannot be attached again")]
    AlreadyPersisted {
        /// The identifier of the stored node
        id: DocumentId,
    },

    /// A parent references a child under a key the child document does not carry.
    #[error("Document {child} referenced by {parent} under key {expected} carries key {actual}")]
    ChildKeyMismatch {
        /// The parent holding the reference
        parent: DocumentId,
        /// The referenced child document
        child: DocumentId,
        /// The key recorded in the parent's reference map
        expected: String,
        /// The key stored in the child document
        actual: String,
    },

    /// A store lock was poisoned by a panicking writer.
    #[error("Document store lock poisoned")]
    StorePoisoned,

    /// A persisted store file uses an unsupported format version.
    #[error("Unsupported store file version {version}")]
    UnsupportedVersion {
        /// The version found in the file
        version: u8,
    },
}

impl DocumentError {
    /// Check if this error indicates a document was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentError::DocumentNotFound { .. })
    }

    /// Check if this error indicates an identifier or node was stored twice.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            DocumentError::DuplicateDocument { .. } | DocumentError::AlreadyPersisted { .. }
        )
    }

    /// Check if this error indicates inconsistent stored data.
    pub fn is_integrity_error(&self) -> bool {
        matches!(self, DocumentError::ChildKeyMismatch { .. })
    }

    /// Get the document identifier if this error is about a specific document.
    pub fn document_id(&self) -> Option<&DocumentId> {
        match self {
            DocumentError::DocumentNotFound { id }
            | DocumentError::DuplicateDocument { id }
            | DocumentError::AlreadyPersisted { id }
            | DocumentError::ChildKeyMismatch { child: id, .. } => Some(id),
            _ => None,
        }
    }
}

// Conversion from DocumentError to the main Error type
impl From<DocumentError> for crate::Error {
    fn from(err: DocumentError) -> Self {
        crate::Error::Document(err)
    }
}
