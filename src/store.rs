/*!
 * Path-keyed store that remembers insertion order
 */

use std::collections::HashMap;

/// Map from path to value, iterated in insertion order
///
/// Re-inserting an existing path replaces the value in place and keeps its
/// original position.
#[derive(Debug, Clone)]
pub struct PathStore<V> {
    order: Vec<String>,
    entries: HashMap<String, V>,
}

impl<V> Default for PathStore<V> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }
}

impl<V> PathStore<V> {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value for a path, returning the previous one
    pub fn insert(&mut self, path: impl Into<String>, value: V) -> Option<V> {
        let path = path.into();
        if let Some(slot) = self.entries.get_mut(&path) {
            return Some(std::mem::replace(slot, value));
        }
        self.order.push(path.clone());
        self.entries.insert(path, value);
        None
    }

    /// Remove a path, returning its value
    pub fn remove(&mut self, path: &str) -> Option<V> {
        let value = self.entries.remove(path)?;
        self.order.retain(|p| p != path);
        Some(value)
    }

    /// Remove every path matching the predicate, returning them in order
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Vec<(String, V)>
    where
        F: FnMut(&str) -> bool,
    {
        let (removed, kept): (Vec<String>, Vec<String>) =
            self.order.drain(..).partition(|p| predicate(p));
        self.order = kept;
        removed
            .into_iter()
            .filter_map(|path| self.entries.remove(&path).map(|v| (path, v)))
            .collect()
    }

    pub fn get(&self, path: &str) -> Option<&V> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    /// Paths in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.order
            .iter()
            .filter_map(|p| self.entries.get(p).map(|v| (p.as_str(), v)))
    }
}
