//! Hash index storage.
//!
//! Buckets give O(1) equality lookup; a parallel insertion-ordered slot
//! log makes full scans deterministic and lazy without relying on hash
//! map iteration order. Removed entries leave a hole in the slot log so
//! open scan positions stay meaningful until a generation bump
//! invalidates them anyway.

use crate::index::key::Key;
use crate::tuple::TupleRef;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Scan position over a slot log, shared by hash full scans and bitset
/// iteration.
#[derive(Debug, Clone, Default)]
pub struct SlotPos {
    /// Next slot to examine.
    pub next: usize,
}

/// Hash-based index storage.
#[derive(Debug)]
pub struct HashStore {
    /// Key to slot ids, insertion order preserved within a bucket.
    buckets: HashMap<Key, Vec<usize>>,
    /// Insertion log; `None` marks a removed entry.
    slots: Vec<Option<(Key, TupleRef)>>,
    /// Live entry count.
    live: usize,
    /// Approximate payload footprint in bytes.
    data_bytes: usize,
}

impl HashStore {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
            slots: Vec::new(),
            live: 0,
            data_bytes: 0,
        }
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns the approximate memory footprint in bytes.
    #[must_use]
    pub fn bsize(&self) -> usize {
        self.data_bytes
    }

    /// Returns true if any entry matches the key.
    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        self.buckets.contains_key(key)
    }

    /// Returns the first-inserted entry matching the key.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&TupleRef> {
        let slot = *self.buckets.get(key)?.first()?;
        self.slots[slot].as_ref().map(|(_, t)| t)
    }

    /// Inserts an entry.
    pub fn insert(&mut self, key: Key, tuple: TupleRef) {
        let slot = self.slots.len();
        self.data_bytes += key.bsize() + tuple.bsize();
        self.buckets.entry(key.clone()).or_default().push(slot);
        self.slots.push(Some((key, tuple)));
        self.live += 1;
    }

    /// Removes and returns the first-inserted entry matching the key.
    pub fn take(&mut self, key: &Key) -> Option<TupleRef> {
        let bucket = self.buckets.get_mut(key)?;
        let slot = bucket.remove(0);
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        let (key, tuple) = self.slots[slot].take()?;
        self.live -= 1;
        self.data_bytes -= key.bsize() + tuple.bsize();
        Some(tuple)
    }

    /// Removes the entry holding exactly this tuple.
    pub fn remove_ref(&mut self, key: &Key, tuple: &TupleRef) -> bool {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return false;
        };
        let Some(idx) = bucket.iter().position(|&slot| {
            self.slots[slot]
                .as_ref()
                .is_some_and(|(_, t)| TupleRef::same_tuple(t, tuple))
        }) else {
            return false;
        };
        let slot = bucket.remove(idx);
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        if let Some((key, tuple)) = self.slots[slot].take() {
            self.live -= 1;
            self.data_bytes -= key.bsize() + tuple.bsize();
        }
        true
    }

    /// Returns a pseudo-random live entry.
    ///
    /// Picks a uniform starting slot from a seeded generator and walks
    /// forward cyclically to the first live entry, so holes skew the pick
    /// slightly toward entries following deleted runs. Deterministic for a
    /// fixed seed and an unchanged slot log.
    #[must_use]
    pub fn random(&self, seed: u64) -> Option<&TupleRef> {
        if self.live == 0 {
            return None;
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let start = rng.gen_range(0..self.slots.len());
        (0..self.slots.len()).find_map(|i| {
            let slot = (start + i) % self.slots.len();
            self.slots[slot].as_ref().map(|(_, t)| t)
        })
    }

    /// Advances a full scan, yielding entries in insertion order.
    pub fn advance_all(&self, pos: &mut SlotPos) -> Option<&TupleRef> {
        while pos.next < self.slots.len() {
            let slot = pos.next;
            pos.next += 1;
            if let Some((_, tuple)) = &self.slots[slot] {
                return Some(tuple);
            }
        }
        None
    }

    /// Advances an equality scan, yielding duplicates in insertion order.
    pub fn advance_eq(&self, key: &Key, next_dup: &mut usize) -> Option<&TupleRef> {
        let bucket = self.buckets.get(key)?;
        while *next_dup < bucket.len() {
            let slot = bucket[*next_dup];
            *next_dup += 1;
            if let Some((_, tuple)) = &self.slots[slot] {
                return Some(tuple);
            }
        }
        None
    }

    /// Counts entries matching the key.
    #[must_use]
    pub fn count_eq(&self, key: &Key) -> usize {
        self.buckets.get(key).map_or(0, Vec::len)
    }
}

impl Default for HashStore {
    fn default() -> Self {
        Self::new()
    }
}
