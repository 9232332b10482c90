//! Ordered argument bags for URL generation
//!
//! Values are optional: a `None` entry is dropped before substitution, which
//! is how a caller un-sets a default argument for one call.

use ahash::AHashMap;

/// Ordered name/value pairs; setting an existing name keeps its position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    entries: Vec<(String, Option<String>)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set(name, Some(value.to_string()));
        self
    }

    /// Builder form of setting an explicit null
    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.set(name, None);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Value for `name`; `None` for absent and null entries alike
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Option<String>> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Overlay `other` onto `self`: existing names keep their position,
    /// new names are appended, `other` wins on collision.
    pub fn merge(&mut self, other: &Arguments) {
        for (name, value) in &other.entries {
            self.set(name.clone(), value.clone());
        }
    }

    /// Copy without null entries
    pub fn without_nulls(&self) -> Arguments {
        Arguments {
            entries: self
                .entries
                .iter()
                .filter(|(_, v)| v.is_some())
                .cloned()
                .collect(),
        }
    }

    /// Non-null pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(n, v)| v.as_deref().map(|v| (n.as_str(), v)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Arguments
where
    K: Into<String>,
    V: ToString,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Arguments
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut arguments = Arguments::new();
        for (name, value) in iter {
            arguments.set(name, Some(value.to_string()));
        }
        arguments
    }
}

impl From<&AHashMap<String, String>> for Arguments {
    fn from(map: &AHashMap<String, String>) -> Self {
        let mut pairs: Vec<(&String, &String)> = map.iter().collect();
        pairs.sort();
        pairs.into_iter().collect()
    }
}
