//! Structural error types for node capabilities and path algorithms.
//!
//! Keys are generic, so errors carry their `Debug` rendering rather than the
//! keys themselves.

use thiserror::Error;

/// Errors raised when a structural invariant of the tree would be violated.
///
/// Routine refusals (removing a non-empty node without recursion, clearing a
/// value that is not there, walking a path that does not resolve) are reported
/// through `bool`/`Option` results by the algorithms and never reach this type,
/// with one exception: calling [`ChildWriter::remove_child`] directly on a child
/// that still has children raises [`HierarchyError::NonEmptyNode`].
///
/// [`ChildWriter::remove_child`]: crate::node::ChildWriter::remove_child
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    /// A sibling with the same key already exists.
    #[error("Duplicate child key: {key}")]
    DuplicateKey {
        /// The rendered key that is already taken
        key: String,
    },

    /// The addressed node already holds a value.
    #[error("A value already exists at {path}")]
    DuplicateValue {
        /// The rendered path of the occupied node
        path: String,
    },

    /// A replacement child does not carry the key of the child it replaces.
    #[error("Key mismatch: expected {expected}, found {actual}")]
    KeyMismatch {
        /// The key the node must carry
        expected: String,
        /// The key the node actually carries
        actual: String,
    },

    /// The child argument is not the node currently indexed under its key.
    #[error("Stale child reference for key {key}")]
    StaleReference {
        /// The rendered key of the outdated child
        key: String,
    },

    /// A child node has no key and therefore no well-defined path.
    #[error("Child node without a key under {parent}")]
    MissingKeyOnChild {
        /// The parent the keyless child was found under
        parent: String,
    },

    /// A child with children of its own was passed to a non-recursive removal.
    #[error("Cannot remove non-empty node {key}")]
    NonEmptyNode {
        /// The rendered key of the node that still has children
        key: String,
    },

    /// Attaching the node would make it its own ancestor.
    #[error("Attaching {key} would create a cycle")]
    CycleDetected {
        /// The rendered key of the node that would become its own ancestor
        key: String,
    },

    /// Parent navigation was requested on a node with no recorded parent.
    #[error("Node has no parent")]
    NoParent,
}

impl HierarchyError {
    /// Check if this error indicates an occupied key or value slot.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            HierarchyError::DuplicateKey { .. } | HierarchyError::DuplicateValue { .. }
        )
    }

    /// Check if this error is a key mismatch on replacement.
    pub fn is_key_mismatch(&self) -> bool {
        matches!(self, HierarchyError::KeyMismatch { .. })
    }

    /// Check if the caller held an outdated child reference.
    pub fn is_stale_reference(&self) -> bool {
        matches!(self, HierarchyError::StaleReference { .. })
    }

    /// Check if this error signals inconsistent tree data.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            HierarchyError::MissingKeyOnChild { .. } | HierarchyError::CycleDetected { .. }
        )
    }

    /// Check if this error is the expected "root has no parent" condition.
    pub fn is_no_parent(&self) -> bool {
        matches!(self, HierarchyError::NoParent)
    }

    /// Get the rendered key if this error is about a specific key.
    pub fn key(&self) -> Option<&str> {
        match self {
            HierarchyError::DuplicateKey { key }
            | HierarchyError::StaleReference { key }
            | HierarchyError::NonEmptyNode { key }
            | HierarchyError::CycleDetected { key } => Some(key),
            _ => None,
        }
    }
}

// Conversion from HierarchyError to the main Error type
impl From<HierarchyError> for crate::Error {
    fn from(err: HierarchyError) -> Self {
        crate::Error::Hierarchy(err)
    }
}
