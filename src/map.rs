//! TreeHashMap: the public map, layered over `RawTreeMap`.

use crate::access::AccessTracker;
use crate::config::{ConfigError, MapConfig};
use crate::hashing::{fold, spread, table_size_for, DEFAULT_LOAD_FACTOR};
use crate::order::{InsertionOrder, KeyOrder, TieBreak};
use crate::raw::{PutMode, PutOutcome, RawTreeMap};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// A chained hash map whose crowded buckets turn into red-black trees.
///
/// Lookups are O(1) on average. `O` decides how a tree bucket orders keys
/// whose hashes are fully equal. With the default [`InsertionOrder`] such
/// keys need a search of both subtrees. Maps built with the `ordered_*`
/// constructors use [`KeyOrder`] and stay O(log n) per bucket even when
/// every key shares one hash.
///
/// ```
/// use tree_hashmap::TreeHashMap;
///
/// let mut m = TreeHashMap::new();
/// assert_eq!(m.insert("a", 1), None);
/// assert_eq!(m.insert("b", 2), None);
/// assert_eq!(m.insert("a", 3), Some(1));
/// assert_eq!(m.get("a"), Some(&3));
/// assert_eq!(m.len(), 2);
/// ```
pub struct TreeHashMap<K, V, S = RandomState, O = InsertionOrder> {
    hasher: S,
    raw: RawTreeMap<K, V, O>,
    access: AccessTracker,
}

impl<K, V> TreeHashMap<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Pre-sizes the bucket array to the next power of two `>= capacity`.
    /// Nothing is allocated until the first insertion.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }

    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Result<Self, ConfigError> {
        Self::with_config(MapConfig::new().initial_capacity(capacity).load_factor(load_factor))
    }

    pub fn with_config(config: MapConfig) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K: Ord, V> TreeHashMap<K, V, RandomState, KeyOrder> {
    /// Empty map whose tree buckets sort equal-hash keys by `K: Ord`.
    ///
    /// ```
    /// use tree_hashmap::TreeHashMap;
    ///
    /// let mut m = TreeHashMap::new_ordered();
    /// m.insert(String::from("b"), 2);
    /// m.insert(String::from("a"), 1);
    /// assert_eq!(m.get("a"), Some(&1));
    /// ```
    pub fn new_ordered() -> Self {
        Self::ordered_with_hasher(RandomState::new())
    }

    pub fn ordered_with_config(config: MapConfig) -> Result<Self, ConfigError> {
        Self::ordered_with_config_and_hasher(config, RandomState::new())
    }
}

impl<K: Ord, V, S> TreeHashMap<K, V, S, KeyOrder> {
    pub fn ordered_with_hasher(hasher: S) -> Self {
        Self::from_parts(0, DEFAULT_LOAD_FACTOR, hasher)
    }

    pub fn ordered_with_config_and_hasher(config: MapConfig, hasher: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let initial = config.initial_capacity.map_or(0, table_size_for);
        Ok(Self::from_parts(initial, config.load_factor, hasher))
    }
}

impl<K, V, S, O> Default for TreeHashMap<K, V, S, O>
where
    S: Default,
{
    fn default() -> Self {
        Self::from_parts(0, DEFAULT_LOAD_FACTOR, S::default())
    }
}

impl<K, V, S> TreeHashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_parts(0, DEFAULT_LOAD_FACTOR, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::from_parts(table_size_for(capacity), DEFAULT_LOAD_FACTOR, hasher)
    }

    pub fn with_config_and_hasher(config: MapConfig, hasher: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let initial = config.initial_capacity.map_or(0, table_size_for);
        Ok(Self::from_parts(initial, config.load_factor, hasher))
    }
}

impl<K, V, S, O> TreeHashMap<K, V, S, O> {
    fn from_parts(initial_capacity: usize, load_factor: f32, hasher: S) -> Self {
        Self {
            hasher,
            raw: RawTreeMap::new(initial_capacity, load_factor),
            access: AccessTracker::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Number of buckets; zero until the first insertion.
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    pub fn load_factor(&self) -> f32 {
        self.raw.load_factor()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Removes every entry. The bucket array keeps its size.
    pub fn clear(&mut self) {
        let old = {
            let _g = self.access.enter();
            self.raw.clear()
        };
        // Entries drop once the map is idle again.
        drop(old);
    }
}

// Keys and values the map does not keep are dropped after the access
// token, so their `Drop` may read the map.
impl<K, V, S, O> TreeHashMap<K, V, S, O>
where
    K: Eq + Hash,
    S: BuildHasher,
    O: TieBreak<K>,
{
    fn hash_of<Q>(&self, q: &Q) -> u32
    where
        Q: ?Sized + Hash,
    {
        spread(fold(self.hasher.hash_one(q)))
    }

    /// Inserts or overwrites; returns the previous value for `key`.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let outcome = {
            let _g = self.access.enter();
            let hash = self.hash_of(&key);
            self.raw.put_val(hash, key, value, PutMode::Overwrite)
        };
        match outcome {
            PutOutcome::Inserted(_) => None,
            PutOutcome::Occupied { key, value, .. } => {
                drop(key);
                Some(value)
            }
        }
    }

    /// Inserts only when `key` is absent. Returns the value already stored
    /// otherwise, in which case `key` and `value` are dropped.
    pub fn put_if_absent(&mut self, key: K, value: V) -> Option<&V> {
        let outcome = {
            let _g = self.access.enter();
            let hash = self.hash_of(&key);
            self.raw.put_val(hash, key, value, PutMode::KeepExisting)
        };
        match outcome {
            PutOutcome::Inserted(_) => None,
            PutOutcome::Occupied { node, key, value } => {
                drop((key, value));
                Some(self.raw.entry(node).1)
            }
        }
    }

    /// Returns the value for `key`, inserting `default()` first if absent.
    /// `default` only runs when the key is missing, and runs while the map
    /// is idle.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let (hash, found) = {
            let _g = self.access.enter();
            let hash = self.hash_of(&key);
            (hash, self.raw.find(hash, &key))
        };
        let node = match found {
            Some(node) => {
                drop(key);
                node
            }
            None => {
                let value = default();
                let outcome = {
                    let _g = self.access.enter();
                    self.raw.put_val(hash, key, value, PutMode::KeepExisting)
                };
                match outcome {
                    PutOutcome::Inserted(node) => node,
                    // `default` inserted the key itself; its entry wins.
                    PutOutcome::Occupied { node, key, value } => {
                        drop((key, value));
                        node
                    }
                }
            }
        };
        self.raw.value_mut(node)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: TieBreak<Q>,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: TieBreak<Q>,
    {
        let _g = self.access.enter();
        let hash = self.hash_of(q);
        let node = self.raw.find(hash, q)?;
        Some(self.raw.entry(node))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: TieBreak<Q>,
    {
        let _g = self.access.enter();
        let hash = self.hash_of(q);
        let node = self.raw.find(hash, q)?;
        Some(self.raw.value_mut(node))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: TieBreak<Q>,
    {
        let _g = self.access.enter();
        let hash = self.hash_of(q);
        self.raw.find(hash, q).is_some()
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: TieBreak<Q>,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Removes `q` and hands back the stored key and value. The map is
    /// consistent again before either is returned.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: TieBreak<Q>,
    {
        let _g = self.access.enter();
        let hash = self.hash_of(q);
        self.raw.remove(hash, q)
    }
}

impl<K, V, S, O> Extend<(K, V)> for TreeHashMap<K, V, S, O>
where
    K: Eq + Hash,
    S: BuildHasher,
    O: TieBreak<K>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S, O> FromIterator<(K, V)> for TreeHashMap<K, V, S, O>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    O: TieBreak<K>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut m = Self::default();
        m.extend(iter);
        m
    }
}

impl<K, V, S, O> fmt::Debug for TreeHashMap<K, V, S, O>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.raw.entries()).finish()
    }
}

#[cfg(test)]
impl<K, V, S, O: TieBreak<K>> TreeHashMap<K, V, S, O> {
    pub(crate) fn validate(&self) -> Result<(), String> {
        self.raw.validate()
    }
}
