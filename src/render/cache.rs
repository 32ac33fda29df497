//! Memo cache for derived per-pass values.
//!
//! Keeps a small number of computed values keyed by the full tuple of their
//! inputs, handing out shared `Rc`s so repeated passes with unchanged inputs
//! observe the very same allocation. Used for the slot profile, which several
//! panes read during one pass and which must not be rebuilt on navigation
//! back to an already-seen range.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::rc::Rc;

/// An insertion-ordered cache with a fixed capacity.
///
/// When the cache exceeds capacity, the oldest inserted entries are evicted.
/// Lookups do not promote entries. Invalidation is explicit.
pub struct MemoCache<K: Hash + Eq + Clone, V> {
    entries: HashMap<K, Rc<V>>,
    order: VecDeque<K>,
    capacity: usize,
    misses: u64,
}

impl<K: Hash + Eq + Clone, V> MemoCache<K, V> {
    /// Create a new cache with the given capacity.
    ///
    /// A capacity of 0 disables caching entirely: every lookup recomputes.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
            misses: 0,
        }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &K) -> Option<Rc<V>> {
        self.entries.get(key).map(Rc::clone)
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// Errors from `compute` are returned and nothing is cached.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: &K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<Rc<V>, E> {
        if let Some(hit) = self.entries.get(key) {
            return Ok(Rc::clone(hit));
        }
        self.misses += 1;
        let value = Rc::new(compute()?);
        if self.capacity > 0 {
            self.entries.insert(key.clone(), Rc::clone(&value));
            self.order.push_back(key.clone());
            self.enforce_cap();
        }
        Ok(value)
    }

    /// Number of computations performed so far.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, e.g. after an option change.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Evict oldest entries until we're at or below capacity.
    fn enforce_cap(&mut self) {
        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ok(v: i32) -> impl FnOnce() -> Result<i32, ()> {
        move || Ok(v)
    }

    #[test]
    fn test_hit_returns_same_allocation() {
        let mut cache: MemoCache<(u32, u32), i32> = MemoCache::new(2);
        let a = cache.get_or_try_insert_with(&(1, 2), ok(10)).unwrap();
        let b = cache.get_or_try_insert_with(&(1, 2), ok(99)).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(*b, 10);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_eviction() {
        let mut cache: MemoCache<u32, i32> = MemoCache::new(2);
        cache.get_or_try_insert_with(&1, ok(1)).unwrap();
        cache.get_or_try_insert_with(&2, ok(2)).unwrap();
        cache.get_or_try_insert_with(&3, ok(3)).unwrap();

        // 1 should be evicted
        assert!(cache.get(&1).is_none());
        assert_eq!(cache.get(&3).as_deref(), Some(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut cache: MemoCache<u32, i32> = MemoCache::new(2);
        let err = cache.get_or_try_insert_with(&1, || Err::<i32, &str>("boom"));
        assert!(err.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_always_recomputes() {
        let mut cache: MemoCache<u32, i32> = MemoCache::new(0);
        let a = cache.get_or_try_insert_with(&1, ok(1)).unwrap();
        let b = cache.get_or_try_insert_with(&1, ok(1)).unwrap();
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_invalidate() {
        let mut cache: MemoCache<u32, i32> = MemoCache::new(2);
        cache.get_or_try_insert_with(&1, ok(1)).unwrap();
        cache.invalidate();
        assert!(cache.is_empty());
    }
}
