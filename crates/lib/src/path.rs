//! Key-sequence paths for hierarchical access.
//!
//! A [`HierarchyPath`] addresses a node by the keys of the edges walked from the
//! root. The empty path is the root itself.
//!
//! # Usage
//!
//! ```rust
//! use hierarchy::{HierarchyPath, hierarchy_path};
//!
//! let path: HierarchyPath<&str> = hierarchy_path!["user", "profile"];
//! let name = path.join("name");
//!
//! assert_eq!(name.len(), 3);
//! assert_eq!(name.to_string(), "/user/profile/name");
//!
//! let (first, rest) = name.split_first().unwrap();
//! assert_eq!(*first, "user");
//! assert_eq!(rest, hierarchy_path!["profile", "name"]);
//! ```

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An immutable, ordered sequence of keys identifying a node from the root.
///
/// Equality and hashing are structural over the visible keys. Stripping the
/// first key with [`rest`](Self::rest) shares the key buffer instead of copying it.
pub struct HierarchyPath<K> {
    keys: Arc<[K]>,
    start: usize,
}

impl<K> HierarchyPath<K> {
    /// Creates the empty path, which denotes the root.
    pub fn new() -> Self {
        Self {
            keys: Arc::from(Vec::new()),
            start: 0,
        }
    }

    /// Alias for [`new`](Self::new).
    pub fn root() -> Self {
        Self::new()
    }

    /// Creates a path over the given keys, in order.
    pub fn from_keys(keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            start: 0,
        }
    }

    /// Creates a path with exactly one key.
    pub fn single(key: K) -> Self {
        Self::from_keys([key])
    }

    /// Returns the keys of this path as a slice.
    pub fn as_slice(&self) -> &[K] {
        &self.keys[self.start..]
    }

    /// Returns an iterator over the keys, root to leaf.
    pub fn keys(&self) -> std::slice::Iter<'_, K> {
        self.as_slice().iter()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, K> {
        self.keys()
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.keys.len() - self.start
    }

    /// Returns `true` if this path has no keys and so addresses the root.
    pub fn is_root(&self) -> bool {
        self.len() == 0
    }

    /// Alias for [`is_root`](Self::is_root).
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    /// Returns the first key, or `None` for the root.
    pub fn first(&self) -> Option<&K> {
        self.as_slice().first()
    }

    /// Returns the last key, or `None` for the root.
    pub fn last(&self) -> Option<&K> {
        self.as_slice().last()
    }

    /// Returns the path below the first key.
    ///
    /// The rest of the root path is the root path.
    pub fn rest(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
            start: (self.start + 1).min(self.keys.len()),
        }
    }

    /// Splits off the first key, returning it together with the remaining path.
    pub fn split_first(&self) -> Option<(&K, Self)> {
        self.first().map(|key| (key, self.rest()))
    }

    /// Returns `true` if `prefix` is an ancestor of (or equal to) this path.
    pub fn starts_with(&self, prefix: &Self) -> bool
    where
        K: PartialEq,
    {
        self.as_slice().starts_with(prefix.as_slice())
    }
}

impl<K: Clone> HierarchyPath<K> {
    /// Returns a new path with `key` appended.
    pub fn join(&self, key: K) -> Self {
        Self::from_keys(self.keys().cloned().chain(std::iter::once(key)))
    }

    /// Returns a new path with all keys of `other` appended.
    pub fn concat(&self, other: &Self) -> Self {
        Self::from_keys(self.keys().chain(other.keys()).cloned())
    }

    /// Returns the path of the parent node, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.as_slice().split_last()?;
        Some(Self::from_keys(parent.iter().cloned()))
    }
}

impl<K> Clone for HierarchyPath<K> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
            start: self.start,
        }
    }
}

impl<K> Default for HierarchyPath<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq> PartialEq for HierarchyPath<K> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<K: Eq> Eq for HierarchyPath<K> {}

impl<K: Hash> Hash for HierarchyPath<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<K: fmt::Debug> fmt::Debug for HierarchyPath<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HierarchyPath")
            .field(&self.as_slice())
            .finish()
    }
}

impl<K: fmt::Display> fmt::Display for HierarchyPath<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "/");
        }
        for key in self.keys() {
            write!(f, "/{key}")?;
        }
        Ok(())
    }
}

impl<K> From<Vec<K>> for HierarchyPath<K> {
    fn from(keys: Vec<K>) -> Self {
        Self {
            keys: Arc::from(keys),
            start: 0,
        }
    }
}

impl<K, const N: usize> From<[K; N]> for HierarchyPath<K> {
    fn from(keys: [K; N]) -> Self {
        Self::from_keys(keys)
    }
}

impl<K> FromIterator<K> for HierarchyPath<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self::from_keys(iter)
    }
}

impl<'a, K> IntoIterator for &'a HierarchyPath<K> {
    type Item = &'a K;
    type IntoIter = std::slice::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys()
    }
}

impl<K: Serialize> Serialize for HierarchyPath<K> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.keys())
    }
}

impl<'de, K: Deserialize<'de>> Deserialize<'de> for HierarchyPath<K> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<K>::deserialize(deserializer).map(Self::from)
    }
}

/// Constructs a [`HierarchyPath`] from a list of keys.
///
/// Each key is passed through [`Into`], so string literals can build a path of
/// `String` keys when the key type is known from context.
///
/// ```rust
/// use hierarchy::{HierarchyPath, hierarchy_path};
///
/// let root: HierarchyPath<String> = hierarchy_path![];
/// assert!(root.is_root());
///
/// let path: HierarchyPath<String> = hierarchy_path!["a", "b"];
/// assert_eq!(path.as_slice(), ["a".to_string(), "b".to_string()]);
/// ```
#[macro_export]
macro_rules! hierarchy_path {
    () => {
        $crate::path::HierarchyPath::new()
    };

    ($($key:expr),+ $(,)?) => {
        $crate::path::HierarchyPath::from_keys([$(::core::convert::Into::into($key)),+])
    };
}
