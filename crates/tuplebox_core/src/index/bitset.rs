//! Bitset index storage.
//!
//! Each entry is a 64-bit mask extracted from a single unsigned key
//! field. Lookup by bit pattern scans the insertion-ordered slot log; the
//! structure has no point-lookup or ordering, so `get`/`min`/`max` are
//! rejected one level up as unsupported.

use crate::index::hash::SlotPos;
use crate::tuple::TupleRef;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bit-matching predicate applied during iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitsMatch {
    /// Every entry.
    Any,
    /// Entries whose mask contains all probe bits.
    AllSet(u64),
    /// Entries whose mask shares at least one probe bit.
    AnySet(u64),
}

impl BitsMatch {
    fn matches(self, mask: u64) -> bool {
        match self {
            BitsMatch::Any => true,
            BitsMatch::AllSet(probe) => mask & probe == probe,
            BitsMatch::AnySet(probe) => mask & probe != 0,
        }
    }
}

/// Bitset index storage.
#[derive(Debug)]
pub struct BitsetStore {
    /// Insertion log; `None` marks a removed entry.
    slots: Vec<Option<(u64, TupleRef)>>,
    live: usize,
    data_bytes: usize,
}

impl BitsetStore {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
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

    /// Inserts an entry under its mask.
    pub fn insert(&mut self, mask: u64, tuple: TupleRef) {
        self.data_bytes += 8 + tuple.bsize();
        self.slots.push(Some((mask, tuple)));
        self.live += 1;
    }

    /// Removes the entry holding exactly this tuple.
    pub fn remove_ref(&mut self, tuple: &TupleRef) -> bool {
        for slot in &mut self.slots {
            let matches = slot
                .as_ref()
                .is_some_and(|(_, t)| TupleRef::same_tuple(t, tuple));
            if matches {
                if let Some((_, removed)) = slot.take() {
                    self.live -= 1;
                    self.data_bytes -= 8 + removed.bsize();
                }
                return true;
            }
        }
        false
    }

    /// Advances a scan, yielding matching entries in insertion order.
    pub fn advance(&self, pos: &mut SlotPos, pred: BitsMatch) -> Option<&TupleRef> {
        while pos.next < self.slots.len() {
            let slot = pos.next;
            pos.next += 1;
            if let Some((mask, tuple)) = &self.slots[slot] {
                if pred.matches(*mask) {
                    return Some(tuple);
                }
            }
        }
        None
    }

    /// Counts entries matching the predicate.
    #[must_use]
    pub fn count(&self, pred: BitsMatch) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|(mask, _)| pred.matches(*mask))
            .count()
    }

    /// Returns a pseudo-random live entry, same pick rule as the hash
    /// store: uniform starting slot, first live entry at or after it.
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
}

impl Default for BitsetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuplebox_codec::Value;

    fn tuple(id: u64) -> TupleRef {
        TupleRef::from_values(&[Value::Unsigned(id)]).unwrap()
    }

    fn collect(store: &BitsetStore, pred: BitsMatch) -> Vec<u64> {
        let mut pos = SlotPos::default();
        let mut out = Vec::new();
        while let Some(t) = store.advance(&mut pos, pred) {
            out.push(t.decode().unwrap()[0].as_unsigned().unwrap());
        }
        out
    }

    fn populated() -> BitsetStore {
        let mut store = BitsetStore::new();
        store.insert(0b001, tuple(1));
        store.insert(0b011, tuple(2));
        store.insert(0b100, tuple(3));
        store.insert(0b111, tuple(4));
        store
    }

    #[test]
    fn all_scan_in_insertion_order() {
        let store = populated();
        assert_eq!(collect(&store, BitsMatch::Any), [1, 2, 3, 4]);
    }

    #[test]
    fn all_set_matching() {
        let store = populated();
        assert_eq!(collect(&store, BitsMatch::AllSet(0b011)), [2, 4]);
        assert_eq!(collect(&store, BitsMatch::AllSet(0b100)), [3, 4]);
        assert!(collect(&store, BitsMatch::AllSet(0b1000)).is_empty());
    }

    #[test]
    fn any_set_matching() {
        let store = populated();
        assert_eq!(collect(&store, BitsMatch::AnySet(0b110)), [2, 3, 4]);
        assert!(collect(&store, BitsMatch::AnySet(0)).is_empty());
    }

    #[test]
    fn count_matches_scan() {
        let store = populated();
        assert_eq!(store.count(BitsMatch::Any), 4);
        assert_eq!(store.count(BitsMatch::AllSet(0b011)), 2);
        assert_eq!(store.count(BitsMatch::AnySet(0b110)), 3);
    }

    #[test]
    fn remove_ref_leaves_hole() {
        let mut store = BitsetStore::new();
        let t = tuple(9);
        store.insert(0b1, t.clone());
        store.insert(0b1, tuple(10));

        assert!(store.remove_ref(&t));
        assert!(!store.remove_ref(&t));
        assert_eq!(store.len(), 1);
        assert_eq!(collect(&store, BitsMatch::Any), [10]);
    }

    #[test]
    fn random_deterministic() {
        let store = populated();
        let a = store.random(5).unwrap().bytes().to_vec();
        let b = store.random(5).unwrap().bytes().to_vec();
        assert_eq!(a, b);
        assert!(BitsetStore::new().random(5).is_none());
    }
}
