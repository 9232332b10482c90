//! Zero-copy route parameter extraction

use ahash::AHashMap;

/// Zero-copy route parameters container
///
/// Names borrow from the tree endpoint and values borrow from the looked-up
/// path, so a lookup allocates only the map itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params<'a> {
    inner: AHashMap<&'a str, &'a str>,
}

impl<'a> Params<'a> {
    /// Create new empty parameters container
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: AHashMap::new(),
        }
    }

    /// Create with pre-allocated capacity for known parameter count
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: AHashMap::with_capacity(capacity),
        }
    }

    /// Insert a parameter (internal use only)
    #[inline]
    pub(crate) fn insert(&mut self, key: &'a str, value: &'a str) {
        self.inner.insert(key, value);
    }

    /// Get parameter value by name
    #[inline]
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.inner.get(name).copied()
    }

    /// Check if parameter exists
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over all parameters
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.inner.iter().map(|(k, v)| (*k, *v))
    }
}
