//! Fixed-capacity containers
//!
//! Everything the simulation touches per frame is sized once, at level load:
//! - `FixedSizeArray`: a bounded vector that refuses to grow past its capacity
//! - `ObjectPool`: pre-built instances handed out and reclaimed without allocating
//!
//! Instances are reset when they are released, not when they are allocated.

use std::ops::{Index, IndexMut};

use thiserror::Error;

/// Pool failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("pool '{name}' exhausted (capacity {capacity})")]
    Exhausted { name: &'static str, capacity: usize },

    #[error("no pool registered for '{0}'")]
    Unregistered(&'static str),
}

/// Bounded vector. `add` hands the item back instead of growing.
#[derive(Debug, Clone)]
pub struct FixedSizeArray<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> FixedSizeArray<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item. Returns it back as `Err` when the array is full.
    pub fn add(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push(item);
        Ok(())
    }

    /// Insert at `index`, shifting later items. Returns the item back when full.
    pub fn insert(&mut self, index: usize, item: T) -> Result<(), T> {
        if self.is_full() || index > self.items.len() {
            return Err(item);
        }
        self.items.insert(index, item);
        Ok(())
    }

    /// Remove preserving order
    pub fn remove(&mut self, index: usize) -> Option<T> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Remove by swapping the last item into the hole (O(1), order not kept)
    pub fn swap_remove(&mut self, index: usize) -> Option<T> {
        (index < self.items.len()).then(|| self.items.swap_remove(index))
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, T> {
        self.items.drain(..)
    }

    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.items.retain(keep);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.items.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Index of the first item matching `predicate` (linear search)
    pub fn find(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.iter().position(predicate)
    }

    pub fn sort_by_key<K: Ord>(&mut self, key: impl FnMut(&T) -> K) {
        self.items.sort_by_key(key);
    }

    /// Binary search; the array must already be sorted by the same key.
    pub fn binary_search_by_key<K: Ord>(
        &self,
        key: &K,
        extract: impl FnMut(&T) -> K,
    ) -> Result<usize, usize> {
        self.items.binary_search_by_key(key, extract)
    }
}

impl<T> Default for FixedSizeArray<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T> Index<usize> for FixedSizeArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T> IndexMut<usize> for FixedSizeArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a FixedSizeArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut FixedSizeArray<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}

/// Something that can be returned to a pool and handed out again
pub trait Poolable {
    /// Return to a freshly-built state. Called on release.
    fn reset(&mut self);
}

/// Fixed-capacity pool of pre-built instances
#[derive(Debug)]
pub struct ObjectPool<T> {
    name: &'static str,
    available: Vec<T>,
    capacity: usize,
    allocated: usize,
    exhaustion_count: usize,
    fatal_on_exhaustion: bool,
}

impl<T: Poolable> ObjectPool<T> {
    /// Build a pool and fill it with `capacity` instances up front.
    pub fn new(name: &'static str, capacity: usize, mut fill: impl FnMut() -> T) -> Self {
        let mut available = Vec::with_capacity(capacity);
        available.extend((0..capacity).map(|_| fill()));
        Self {
            name,
            available,
            capacity,
            allocated: 0,
            exhaustion_count: 0,
            fatal_on_exhaustion: false,
        }
    }

    /// Development mode: assert instead of returning `PoolError::Exhausted`.
    pub fn set_fatal_on_exhaustion(&mut self, fatal: bool) {
        self.fatal_on_exhaustion = fatal;
    }

    /// Take an instance out of the pool. The instance is not reset here.
    pub fn allocate(&mut self) -> Result<T, PoolError> {
        match self.available.pop() {
            Some(item) => {
                self.allocated += 1;
                Ok(item)
            }
            None => {
                self.exhaustion_count += 1;
                log::error!(
                    "Pool '{}' exhausted: {} of {} in use",
                    self.name,
                    self.allocated,
                    self.capacity
                );
                assert!(
                    !self.fatal_on_exhaustion,
                    "pool '{}' exhausted (capacity {})",
                    self.name,
                    self.capacity
                );
                Err(PoolError::Exhausted {
                    name: self.name,
                    capacity: self.capacity,
                })
            }
        }
    }

    /// Reset an instance and make it available again.
    ///
    /// Releasing when nothing is outstanding is a bookkeeping bug; the
    /// instance is dropped so the pool never grows past its capacity.
    pub fn release(&mut self, mut item: T) {
        if self.allocated == 0 {
            log::warn!(
                "Pool '{}': release with no outstanding allocation, dropping instance",
                self.name
            );
            return;
        }
        item.reset();
        self.allocated -= 1;
        self.available.push(item);
    }

    /// Outstanding (allocated, not yet released) instances
    #[inline]
    pub fn allocated_count(&self) -> usize {
        self.allocated
    }

    #[inline]
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many allocation requests failed since the pool was built
    #[inline]
    pub fn exhaustion_count(&self) -> usize {
        self.exhaustion_count
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Default)]
    struct Counter {
        value: u32,
        resets: u32,
    }

    impl Poolable for Counter {
        fn reset(&mut self) {
            self.value = 0;
            self.resets += 1;
        }
    }

    #[test]
    fn test_fixed_array_refuses_to_grow() {
        let mut array = FixedSizeArray::new(2);
        assert!(array.add(1).is_ok());
        assert!(array.add(2).is_ok());
        assert_eq!(array.add(3), Err(3));
        assert_eq!(array.len(), 2);
        assert_eq!(array.remaining_capacity(), 0);
        assert!(array.is_full());
    }

    #[test]
    fn test_fixed_array_remove_keeps_order() {
        let mut array = FixedSizeArray::new(4);
        for value in [10, 20, 30, 40] {
            array.add(value).unwrap();
        }
        assert_eq!(array.remove(1), Some(20));
        assert_eq!(array.as_slice(), &[10, 30, 40]);
        assert_eq!(array.swap_remove(0), Some(10));
        assert_eq!(array.as_slice(), &[40, 30]);
        assert_eq!(array.remove(5), None);
    }

    #[test]
    fn test_fixed_array_binary_search() {
        let mut array = FixedSizeArray::new(8);
        for value in [7, 3, 9, 1] {
            array.add((value, value * 10)).unwrap();
        }
        array.sort_by_key(|(k, _)| *k);
        let index = array.binary_search_by_key(&9, |(k, _)| *k).unwrap();
        assert_eq!(array[index].1, 90);
        assert!(array.binary_search_by_key(&4, |(k, _)| *k).is_err());
    }

    #[test]
    fn test_pool_fills_up_front() {
        let pool = ObjectPool::new("counters", 5, Counter::default);
        assert_eq!(pool.available_count(), 5);
        assert_eq!(pool.allocated_count(), 0);
        assert_eq!(pool.capacity(), 5);
    }

    #[test]
    fn test_pool_resets_on_release_not_allocate() {
        let mut pool = ObjectPool::new("counters", 1, Counter::default);
        let mut item = pool.allocate().unwrap();
        item.value = 42;
        pool.release(item);

        let item = pool.allocate().unwrap();
        assert_eq!(item.value, 0);
        assert_eq!(item.resets, 1);
    }

    #[test]
    fn test_pool_exhaustion_reports_each_excess_request() {
        let mut pool = ObjectPool::new("counters", 2, Counter::default);
        let a = pool.allocate().unwrap();
        let _b = pool.allocate().unwrap();

        assert_eq!(
            pool.allocate().unwrap_err(),
            PoolError::Exhausted {
                name: "counters",
                capacity: 2
            }
        );
        assert!(pool.allocate().is_err());
        assert_eq!(pool.exhaustion_count(), 2);

        pool.release(a);
        assert!(pool.allocate().is_ok());
        assert_eq!(pool.exhaustion_count(), 2);
    }

    #[test]
    #[should_panic(expected = "exhausted")]
    fn test_pool_fatal_exhaustion_asserts() {
        let mut pool = ObjectPool::new("strict", 1, Counter::default);
        pool.set_fatal_on_exhaustion(true);
        let _a = pool.allocate().unwrap();
        let _ = pool.allocate();
    }

    #[test]
    fn test_pool_release_without_allocation_is_ignored() {
        let mut pool = ObjectPool::new("counters", 1, Counter::default);
        pool.release(Counter::default());
        assert_eq!(pool.available_count(), 1);
        assert_eq!(pool.allocated_count(), 0);
    }

    proptest! {
        #[test]
        fn prop_allocated_count_tracks_outstanding(ops in proptest::collection::vec(any::<bool>(), 0..64)) {
            let capacity = 8;
            let mut pool = ObjectPool::new("prop", capacity, Counter::default);
            let mut held = Vec::new();
            let mut failures = 0;

            for allocate in ops {
                if allocate {
                    match pool.allocate() {
                        Ok(item) => held.push(item),
                        Err(_) => failures += 1,
                    }
                } else if let Some(item) = held.pop() {
                    pool.release(item);
                }
                prop_assert_eq!(pool.allocated_count(), held.len());
                prop_assert!(pool.allocated_count() <= capacity);
            }
            prop_assert_eq!(pool.exhaustion_count(), failures);
        }
    }
}
