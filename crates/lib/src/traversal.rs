//! Parent-aware traversal over any node type.
//!
//! Tree nodes only reference their children. [`TraversalNode`] wraps a node
//! together with the chain of decorators that led to it, so parent navigation
//! and absolute paths are available during a top-down walk without storing a
//! back-reference anywhere in the tree.

use std::{
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

use crate::{
    Result,
    node::{ChildNodes, HasChildNodes, HasKey, HasValue, HierarchyError},
    path::HierarchyPath,
};

/// A node decorated with its parent chain and absolute path.
///
/// Two decorators are equal when they wrap the same underlying node, whatever
/// parent chain each one carries.
pub struct TraversalNode<N: HasKey> {
    node: N,
    parent: Option<Rc<TraversalNode<N>>>,
    path: HierarchyPath<N::Key>,
}

impl<N: HasKey> TraversalNode<N> {
    /// Wraps `node` as the start of a traversal, at the root path.
    pub fn root(node: N) -> Self {
        Self {
            node,
            parent: None,
            path: HierarchyPath::new(),
        }
    }

    /// Returns the wrapped node.
    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn into_inner(self) -> N {
        self.node
    }

    /// Returns the absolute path of this node, relative to the traversal root.
    pub fn path(&self) -> &HierarchyPath<N::Key> {
        &self.path
    }

    /// Returns the number of edges between this node and the traversal root.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn has_parent_node(&self) -> bool {
        self.parent.is_some()
    }

    pub fn try_get_parent_node(&self) -> Option<&TraversalNode<N>> {
        self.parent.as_deref()
    }

    /// Returns the parent decorator.
    ///
    /// Fails with [`HierarchyError::NoParent`] on the traversal root.
    pub fn parent_node(&self) -> Result<&TraversalNode<N>> {
        self.try_get_parent_node()
            .ok_or_else(|| HierarchyError::NoParent.into())
    }

    /// Iterates over the ancestors, parent first.
    pub fn ancestors(&self) -> impl Iterator<Item = &TraversalNode<N>> {
        std::iter::successors(self.try_get_parent_node(), |node| {
            node.try_get_parent_node()
        })
    }
}

impl<N> TraversalNode<N>
where
    N: HasKey<Key: Clone + fmt::Debug> + HasChildNodes + Clone,
{
    /// Wraps a child of `parent`.
    ///
    /// Fails with [`HierarchyError::MissingKeyOnChild`] if `child` has no key.
    fn wrap_child(parent: &Rc<TraversalNode<N>>, child: N) -> Result<Self> {
        let key = child
            .try_get_key()
            .ok_or_else(|| HierarchyError::MissingKeyOnChild {
                parent: format!("{:?}", parent.path.as_slice()),
            })?;
        Ok(Self {
            path: parent.path.join(key),
            parent: Some(Rc::clone(parent)),
            node: child,
        })
    }

    /// Iterates over all descendants in depth-first pre-order.
    ///
    /// Each level is loaded when it is reached.
    pub fn descendants(&self) -> Descendants<N> {
        let mut stack: Vec<_> = self.child_nodes().collect();
        stack.reverse();
        Descendants { stack }
    }
}

impl<N: HasKey> HasKey for TraversalNode<N> {
    type Key = N::Key;

    fn try_get_key(&self) -> Option<N::Key> {
        self.node.try_get_key()
    }
}

impl<N: HasKey + HasValue> HasValue for TraversalNode<N> {
    type Value = N::Value;

    fn try_get_value(&self) -> Option<N::Value> {
        self.node.try_get_value()
    }

    fn has_value(&self) -> bool {
        self.node.has_value()
    }
}

impl<N> HasChildNodes for TraversalNode<N>
where
    N: HasKey<Key: Clone + fmt::Debug> + HasChildNodes + Clone,
{
    fn has_child_nodes(&self) -> bool {
        self.node.has_child_nodes()
    }

    /// Re-wraps each child of the underlying node with this decorator as parent.
    fn child_nodes(&self) -> ChildNodes<'_, Self> {
        let parent = Rc::new(self.clone());
        Box::new(
            self.node
                .child_nodes()
                .map(move |child| Self::wrap_child(&parent, child?)),
        )
    }
}

/// Depth-first, pre-order iterator over the descendants of a [`TraversalNode`].
pub struct Descendants<N: HasKey> {
    stack: Vec<Result<TraversalNode<N>>>,
}

impl<N> Iterator for Descendants<N>
where
    N: HasKey<Key: Clone + fmt::Debug> + HasChildNodes + Clone,
{
    type Item = Result<TraversalNode<N>>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = match self.stack.pop()? {
            Ok(node) => node,
            Err(err) => return Some(Err(err)),
        };
        let mut children: Vec<_> = node.child_nodes().collect();
        children.reverse();
        self.stack.extend(children);
        Some(Ok(node))
    }
}

impl<N: HasKey + Clone> Clone for TraversalNode<N> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            parent: self.parent.clone(),
            path: self.path.clone(),
        }
    }
}

impl<N: HasKey + PartialEq> PartialEq for TraversalNode<N> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<N: HasKey + Eq> Eq for TraversalNode<N> {}

impl<N: HasKey + Hash> Hash for TraversalNode<N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.hash(state);
    }
}

impl<N> fmt::Debug for TraversalNode<N>
where
    N: HasKey<Key: fmt::Debug> + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalNode")
            .field("path", &self.path)
            .field("node", &self.node)
            .finish()
    }
}
