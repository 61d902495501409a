//! Ordered tree index storage.
//!
//! Entries live in a `BTreeMap` keyed by the extracted key; duplicate
//! keys share a vector ordered by insertion, which is the documented
//! tie-break for iteration. Cursors never hold a borrow into the map
//! between calls: they remember the last yielded key and duplicate
//! offset and re-seek from there, which is safe because a structural
//! change bumps the generation and staleness is detected before the
//! re-seek.

use crate::index::cursor::IteratorType;
use crate::index::key::Key;
use crate::tuple::TupleRef;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound;
use tuplebox_codec::Value;

/// Traversal position of a tree cursor.
#[derive(Debug, Clone)]
pub struct TreePos {
    /// Last yielded (key, duplicate offset), `None` before the first call.
    last: Option<(Key, usize)>,
    /// Exclusive upper bound for reverse traversal.
    upper: Bound<Key>,
}

/// Tree-based index storage for ordered traversal and range queries.
#[derive(Debug)]
pub struct TreeStore {
    entries: BTreeMap<Key, Vec<TupleRef>>,
    live: usize,
    data_bytes: usize,
}

impl TreeStore {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
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
        self.entries.contains_key(key)
    }

    /// Returns the first-inserted entry matching the key.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&TupleRef> {
        self.entries.get(key)?.first()
    }

    /// Returns the first-inserted entry under the smallest key.
    #[must_use]
    pub fn min(&self) -> Option<&TupleRef> {
        self.entries.values().next()?.first()
    }

    /// Returns the first-inserted entry under the largest key.
    #[must_use]
    pub fn max(&self) -> Option<&TupleRef> {
        self.entries.values().next_back()?.first()
    }

    /// Inserts an entry; duplicates append in insertion order.
    pub fn insert(&mut self, key: Key, tuple: TupleRef) {
        self.data_bytes += key.bsize() + tuple.bsize();
        self.entries.entry(key).or_default().push(tuple);
        self.live += 1;
    }

    /// Removes and returns the first-inserted entry matching the key.
    pub fn take(&mut self, key: &Key) -> Option<TupleRef> {
        let dups = self.entries.get_mut(key)?;
        let tuple = dups.remove(0);
        if dups.is_empty() {
            self.entries.remove(key);
        }
        self.live -= 1;
        self.data_bytes -= key.bsize() + tuple.bsize();
        Some(tuple)
    }

    /// Removes the entry holding exactly this tuple.
    pub fn remove_ref(&mut self, key: &Key, tuple: &TupleRef) -> bool {
        let Some(dups) = self.entries.get_mut(key) else {
            return false;
        };
        let Some(idx) = dups.iter().position(|t| TupleRef::same_tuple(t, tuple)) else {
            return false;
        };
        let removed = dups.remove(idx);
        if dups.is_empty() {
            self.entries.remove(key);
        }
        self.live -= 1;
        self.data_bytes -= key.bsize() + removed.bsize();
        true
    }

    /// Returns a pseudo-random live entry: a uniform pick over entry
    /// positions in key order. Deterministic for a fixed seed and an
    /// unchanged tree.
    #[must_use]
    pub fn random(&self, seed: u64) -> Option<&TupleRef> {
        if self.live == 0 {
            return None;
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut remaining = rng.gen_range(0..self.live);
        for dups in self.entries.values() {
            if remaining < dups.len() {
                return Some(&dups[remaining]);
            }
            remaining -= dups.len();
        }
        None
    }

    /// Creates a traversal position for the given iterator type and probe.
    ///
    /// An empty probe turns every comparison type into a full traversal
    /// (forward or reverse depending on the type's direction).
    #[must_use]
    pub fn make_pos(&self, ty: IteratorType, probe: &[Value]) -> TreePos {
        let upper = if probe.is_empty() {
            Bound::Unbounded
        } else {
            match ty {
                IteratorType::Lt => Bound::Excluded(Key(probe.to_vec())),
                IteratorType::Le | IteratorType::Req => {
                    // First key past the probe prefix bounds the reverse walk.
                    match self
                        .entries
                        .range((Bound::Included(Key(probe.to_vec())), Bound::Unbounded))
                        .map(|(k, _)| k)
                        .find(|k| k.cmp_prefix(probe) == Ordering::Greater)
                    {
                        Some(k) => Bound::Excluded(k.clone()),
                        None => Bound::Unbounded,
                    }
                }
                _ => Bound::Unbounded,
            }
        };
        TreePos { last: None, upper }
    }

    /// Advances a traversal, yielding the next matching entry.
    pub fn advance(
        &self,
        pos: &mut TreePos,
        ty: IteratorType,
        probe: &[Value],
    ) -> Option<&TupleRef> {
        if ty.is_reverse() {
            self.advance_reverse(pos, ty, probe)
        } else {
            self.advance_forward(pos, ty, probe)
        }
    }

    /// Counts entries the traversal would yield, without materializing them.
    #[must_use]
    pub fn count(&self, ty: IteratorType, probe: &[Value]) -> usize {
        let mut pos = self.make_pos(ty, probe);
        let mut n = 0;
        while self.advance(&mut pos, ty, probe).is_some() {
            n += 1;
        }
        n
    }

    fn advance_forward(
        &self,
        pos: &mut TreePos,
        ty: IteratorType,
        probe: &[Value],
    ) -> Option<&TupleRef> {
        if let Some((key, dup)) = pos.last.clone() {
            if let Some(dups) = self.entries.get(&key) {
                if dup + 1 < dups.len() {
                    pos.last = Some((key, dup + 1));
                    return Some(&dups[dup + 1]);
                }
            }
            let (k, dups) = self
                .entries
                .range((Bound::Excluded(key), Bound::Unbounded))
                .next()?;
            if ty == IteratorType::Eq && !probe.is_empty() && k.cmp_prefix(probe) != Ordering::Equal
            {
                return None;
            }
            pos.last = Some((k.clone(), 0));
            return Some(&dups[0]);
        }

        let start = if probe.is_empty() || ty == IteratorType::All {
            Bound::Unbounded
        } else {
            Bound::Included(Key(probe.to_vec()))
        };
        let mut range = self.entries.range((start, Bound::Unbounded));
        loop {
            let (k, dups) = range.next()?;
            if ty == IteratorType::Gt && !probe.is_empty() && k.cmp_prefix(probe) == Ordering::Equal
            {
                continue;
            }
            if ty == IteratorType::Eq && !probe.is_empty() && k.cmp_prefix(probe) != Ordering::Equal
            {
                return None;
            }
            pos.last = Some((k.clone(), 0));
            return Some(&dups[0]);
        }
    }

    fn advance_reverse(
        &self,
        pos: &mut TreePos,
        ty: IteratorType,
        probe: &[Value],
    ) -> Option<&TupleRef> {
        let candidate = if let Some((key, dup)) = pos.last.clone() {
            if let Some(dups) = self.entries.get(&key) {
                if dup + 1 < dups.len() {
                    pos.last = Some((key, dup + 1));
                    return Some(&dups[dup + 1]);
                }
            }
            self.entries
                .range((Bound::Unbounded, Bound::Excluded(key)))
                .next_back()?
        } else {
            self.entries
                .range((Bound::Unbounded, pos.upper.clone()))
                .next_back()?
        };

        let (k, dups) = candidate;
        if ty == IteratorType::Req && !probe.is_empty() && k.cmp_prefix(probe) != Ordering::Equal {
            return None;
        }
        pos.last = Some((k.clone(), 0));
        Some(&dups[0])
    }
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}
