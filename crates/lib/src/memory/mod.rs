//! In-memory tree backends.
//!
//! Both backends satisfy the same capability traits and differ only in their
//! structural strategy: [`ImmutableNode`] rebuilds the path from a mutation to
//! the root, [`MutableNode`] changes nodes in place.

mod immutable;
mod mutable;

pub use immutable::ImmutableNode;
pub use mutable::MutableNode;
