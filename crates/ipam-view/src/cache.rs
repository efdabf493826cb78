//! Client-side query cache with optimistic transactions.
//!
//! Fetched collections are cached per query key (for hosts, the active
//! [`HostFilter`](ipam_client::HostFilter)). Mutations either invalidate the
//! affected keys, or patch them optimistically inside a transaction:
//! snapshot, apply, then [`QueryCache::commit`] on success or
//! [`QueryCache::rollback`] on failure.

use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
struct Entry<V> {
    value: V,
    stale: bool,
}

/// Values saved before an optimistic patch
#[derive(Debug)]
#[must_use = "an optimistic patch must be committed or rolled back"]
pub struct Snapshot<K, V> {
    saved: Vec<(K, Entry<V>)>,
}

impl<K, V> Snapshot<K, V> {
    /// Number of entries the patch touched
    pub fn len(&self) -> usize {
        self.saved.len()
    }

    /// True when the patch touched nothing
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }
}

/// Cached query results keyed by query parameters
#[derive(Debug, Clone)]
pub struct QueryCache<K, V> {
    entries: HashMap<K, Entry<V>>,
}

impl<K, V> Default for QueryCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value, fresh or stale
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// Cached value that has not been invalidated
    pub fn get_fresh(&self, key: &K) -> Option<&V> {
        self.entries.get(key).filter(|e| !e.stale).map(|e| &e.value)
    }

    /// True when `key` needs a (re)fetch
    pub fn needs_fetch(&self, key: &K) -> bool {
        self.get_fresh(key).is_none()
    }

    /// Store a freshly fetched value
    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, Entry { value, stale: false });
    }

    /// Patch a cached value in place; false when `key` is not cached
    pub fn update(&mut self, key: &K, patch: impl FnOnce(&mut V)) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                patch(&mut entry.value);
                true
            }
            None => false,
        }
    }

    /// Mark one key stale
    pub fn invalidate(&mut self, key: &K) {
        if let Some(entry) = self.entries.get_mut(key) {
            debug!("invalidating cache entry {:?}", key);
            entry.stale = true;
        }
    }

    /// Mark every key stale
    pub fn invalidate_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.stale = true;
        }
    }

    /// Cached keys, in no particular order
    pub fn keys(&self) -> Vec<K> {
        self.entries.keys().cloned().collect()
    }

    /// Patch every cached key in `keys`, returning what they held before
    pub fn apply_optimistic(&mut self, keys: &[K], mut patch: impl FnMut(&mut V)) -> Snapshot<K, V> {
        let mut saved = Vec::new();
        for key in keys {
            if let Some(entry) = self.entries.get_mut(key) {
                saved.push((key.clone(), entry.clone()));
                patch(&mut entry.value);
            }
        }
        debug!("optimistic patch applied to {} cache entries", saved.len());
        Snapshot { saved }
    }

    /// Keep the patch and mark the touched keys stale so they refetch
    pub fn commit(&mut self, snapshot: Snapshot<K, V>) {
        for (key, _) in snapshot.saved {
            self.invalidate(&key);
        }
    }

    /// Restore the values held before the patch and mark them stale
    pub fn rollback(&mut self, snapshot: Snapshot<K, V>) {
        debug!("rolling back optimistic patch on {} cache entries", snapshot.saved.len());
        for (key, mut entry) in snapshot.saved {
            entry.stale = true;
            self.entries.insert(key, entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_and_invalidate() {
        let mut cache: QueryCache<&str, Vec<u32>> = QueryCache::new();
        assert!(cache.needs_fetch(&"hosts"));

        cache.insert("hosts", vec![1, 2]);
        assert_eq!(cache.get_fresh(&"hosts"), Some(&vec![1, 2]));

        cache.invalidate(&"hosts");
        assert!(cache.needs_fetch(&"hosts"));
        assert_eq!(cache.get(&"hosts"), Some(&vec![1, 2]));

        cache.insert("hosts", vec![3]);
        cache.insert("subnets", vec![4]);
        cache.invalidate_all();
        assert!(cache.needs_fetch(&"hosts") && cache.needs_fetch(&"subnets"));
    }

    #[test]
    fn update_patches_only_cached_keys() {
        let mut cache: QueryCache<&str, Vec<u32>> = QueryCache::new();
        cache.insert("a", vec![1]);
        assert!(cache.update(&"a", |v| v.push(2)));
        assert!(!cache.update(&"b", |v| v.push(2)));
        assert_eq!(cache.get(&"a"), Some(&vec![1, 2]));
    }

    #[test]
    fn rollback_restores_the_snapshot() {
        let mut cache: QueryCache<&str, Vec<u32>> = QueryCache::new();
        cache.insert("a", vec![1, 2, 3]);
        cache.insert("b", vec![9]);

        let snapshot = cache.apply_optimistic(&["a", "missing"], |v| v.retain(|n| *n != 2));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(cache.get(&"a"), Some(&vec![1, 3]));

        cache.rollback(snapshot);
        assert_eq!(cache.get(&"a"), Some(&vec![1, 2, 3]));
        assert!(cache.needs_fetch(&"a"));
        assert_eq!(cache.get_fresh(&"b"), Some(&vec![9]));
    }

    #[test]
    fn commit_keeps_the_patch_and_marks_stale() {
        let mut cache: QueryCache<&str, Vec<u32>> = QueryCache::new();
        cache.insert("a", vec![1]);
        let snapshot = cache.apply_optimistic(&["a"], |v| v.push(5));
        cache.commit(snapshot);
        assert_eq!(cache.get(&"a"), Some(&vec![1, 5]));
        assert!(cache.needs_fetch(&"a"));
    }
}
