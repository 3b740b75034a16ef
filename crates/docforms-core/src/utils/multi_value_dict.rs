//! A dictionary that can hold multiple values per key.
//!
//! Submitted form data repeats keys for multi-valued widgets (checkbox
//! groups, multi-selects), so lookups need both "last value" and "all
//! values" views. Keys iterate in first-insertion order.

use std::collections::HashMap;
use std::hash::Hash;

/// A dictionary that maps keys to lists of values.
///
/// [`get`](MultiValueDict::get) returns the **last** value for a key, while
/// [`get_list`](MultiValueDict::get_list) returns all of them.
///
/// # Examples
///
/// ```
/// use docforms_core::utils::MultiValueDict;
///
/// let mut d = MultiValueDict::new();
/// d.append("tags".to_string(), "red");
/// d.append("tags".to_string(), "blue");
///
/// assert_eq!(d.get("tags"), Some(&"blue"));
/// assert_eq!(d.get_list("tags"), &["red", "blue"]);
/// ```
#[derive(Debug, Clone)]
pub struct MultiValueDict<K: Eq + Hash + Clone, V> {
    order: Vec<K>,
    inner: HashMap<K, Vec<V>>,
}

impl<K: Eq + Hash + Clone, V> Default for MultiValueDict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, V> MultiValueDict<K, V> {
    /// Creates an empty `MultiValueDict`.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            inner: HashMap::new(),
        }
    }

    /// Returns the last value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key).and_then(|v| v.last())
    }

    /// Returns every value stored under `key`; empty when absent.
    pub fn get_list<Q>(&self, key: &Q) -> &[V]
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key).map_or(&[], Vec::as_slice)
    }

    /// Sets the value for a key, replacing any existing values.
    pub fn set(&mut self, key: K, value: V) {
        if !self.inner.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.inner.insert(key, vec![value]);
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: K, value: V) {
        match self.inner.get_mut(&key) {
            Some(values) => values.push(value),
            None => {
                self.order.push(key.clone());
                self.inner.insert(key, vec![value]);
            }
        }
    }

    /// Removes a key and returns its values.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Vec<V>>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.inner.remove(key)?;
        self.order.retain(|k| k.borrow() != key);
        Some(removed)
    }

    /// Returns the keys in first-insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// Returns `(key, values)` pairs in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.order
            .iter()
            .filter_map(|k| self.inner.get(k).map(|v| (k, v.as_slice())))
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the dictionary contains no keys.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if the dictionary contains the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(key)
    }
}

impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for MultiValueDict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut d = Self::new();
        for (k, v) in iter {
            d.append(k, v);
        }
        d
    }
}
