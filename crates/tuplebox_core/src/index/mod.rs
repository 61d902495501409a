//! Index structures over tuples.
//!
//! An index is a named, typed collection keyed by one or more tuple
//! fields. Every mutating operation bumps a structural generation
//! counter; iterators bind to the generation at creation and surface a
//! staleness condition instead of reconciling a structural change.

pub mod bitset;
pub mod cursor;
pub mod hash;
pub mod key;
pub mod tree;

pub use bitset::{BitsMatch, BitsetStore};
pub use cursor::{Cursor, CursorState, IteratorType};
pub use hash::{HashStore, SlotPos};
pub use key::{FieldType, Key, KeyDef, KeyPart};
pub use tree::{TreePos, TreeStore};

use crate::error::{CoreError, CoreResult};
use crate::tuple::TupleRef;
use crate::types::{Generation, IndexId, SpaceId};
use cursor::CursorPos;
use std::cell::RefCell;
use std::rc::Rc;
use tuplebox_codec::Value;

/// Type tag of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Hash index for O(1) equality lookups.
    Hash,
    /// Tree index for ordered traversal and range queries.
    Tree,
    /// Bitset index for bit-pattern matching.
    Bitset,
    /// Spatial index; the structure lives in an external engine and
    /// cannot be constructed here.
    Spatial,
}

/// Specification of an index within a space.
#[derive(Debug, Clone)]
pub struct IndexSpec {
    /// Space this index belongs to.
    pub space_id: SpaceId,
    /// Position of the index within the space; 0 is the primary.
    pub index_id: IndexId,
    /// Name of the index.
    pub name: String,
    /// Type tag.
    pub kind: IndexKind,
    /// Whether the index enforces key uniqueness.
    pub unique: bool,
    /// Fields the index is keyed by.
    pub key_def: KeyDef,
}

impl IndexSpec {
    /// Creates a non-unique index specification.
    pub fn new(
        space_id: SpaceId,
        index_id: IndexId,
        name: impl Into<String>,
        kind: IndexKind,
        key_def: KeyDef,
    ) -> Self {
        Self {
            space_id,
            index_id,
            name: name.into(),
            kind,
            unique: false,
            key_def,
        }
    }

    /// Makes this a unique index.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Storage variant behind an index.
#[derive(Debug)]
enum Store {
    Hash(HashStore),
    Tree(TreeStore),
    Bitset(BitsetStore),
}

/// A single index: spec, structural generation, and storage.
///
/// All operations run to completion without yielding, so the structure
/// needs no locking; interleaving of whole operations between fibers is
/// what the generation counter exists to surface.
#[derive(Debug)]
pub struct IndexCore {
    spec: IndexSpec,
    generation: Generation,
    store: Store,
}

/// Shared handle to an index, held by its space and by open cursors.
pub type SharedIndex = Rc<RefCell<IndexCore>>;

impl IndexCore {
    /// Creates an index from its specification.
    ///
    /// # Errors
    ///
    /// Reports Unsupported for the spatial tag and for bitset
    /// specifications that are unique or not keyed by a single unsigned
    /// field.
    pub fn new(spec: IndexSpec) -> CoreResult<Self> {
        let store = match spec.kind {
            IndexKind::Hash => Store::Hash(HashStore::new()),
            IndexKind::Tree => Store::Tree(TreeStore::new()),
            IndexKind::Bitset => {
                if spec.unique {
                    return Err(CoreError::unsupported("bitset index cannot be unique"));
                }
                let parts = spec.key_def.parts();
                if parts.len() != 1 || parts[0].field_type != FieldType::Unsigned {
                    return Err(CoreError::unsupported(
                        "bitset index requires a single unsigned key field",
                    ));
                }
                Store::Bitset(BitsetStore::new())
            }
            IndexKind::Spatial => {
                return Err(CoreError::unsupported(
                    "spatial index structure is provided by an external engine",
                ));
            }
        };
        Ok(Self {
            spec,
            generation: Generation::default(),
            store,
        })
    }

    /// Returns the index specification.
    #[must_use]
    pub fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    /// Returns the current structural generation.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns the logical number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.store {
            Store::Hash(s) => s.len(),
            Store::Tree(s) => s.len(),
            Store::Bitset(s) => s.len(),
        }
    }

    /// Returns true if the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the approximate memory footprint in bytes.
    #[must_use]
    pub fn bsize(&self) -> usize {
        match &self.store {
            Store::Hash(s) => s.bsize(),
            Store::Tree(s) => s.bsize(),
            Store::Bitset(s) => s.bsize(),
        }
    }

    /// Returns a pseudo-random entry, retained for the caller.
    ///
    /// Deterministic for a fixed seed and a fixed generation; the exact
    /// distribution is documented on each storage variant.
    #[must_use]
    pub fn random(&self, seed: u64) -> Option<TupleRef> {
        match &self.store {
            Store::Hash(s) => s.random(seed).cloned(),
            Store::Tree(s) => s.random(seed).cloned(),
            Store::Bitset(s) => s.random(seed).cloned(),
        }
    }

    /// Equality lookup by full key, retained for the caller.
    ///
    /// # Errors
    ///
    /// Reports Unsupported on bitset indexes and an invalid-key error for
    /// partial or mistyped probes.
    pub fn get(&self, probe: &[Value]) -> CoreResult<Option<TupleRef>> {
        self.spec.key_def.validate_probe(probe)?;
        if probe.len() != self.spec.key_def.part_count() {
            return Err(CoreError::invalid_key("get requires a full key"));
        }
        match &self.store {
            Store::Hash(s) => Ok(s.get(&Key(probe.to_vec())).cloned()),
            Store::Tree(s) => Ok(s.get(&Key(probe.to_vec())).cloned()),
            Store::Bitset(_) => Err(CoreError::unsupported(
                "bitset index has no point lookup",
            )),
        }
    }

    /// Returns the entry under the smallest key.
    ///
    /// # Errors
    ///
    /// Reports Unsupported for unordered index types.
    pub fn min(&self) -> CoreResult<Option<TupleRef>> {
        match &self.store {
            Store::Tree(s) => Ok(s.min().cloned()),
            _ => Err(CoreError::unsupported(format!(
                "min is not defined for {:?} index",
                self.spec.kind
            ))),
        }
    }

    /// Returns the entry under the largest key.
    ///
    /// # Errors
    ///
    /// Reports Unsupported for unordered index types.
    pub fn max(&self) -> CoreResult<Option<TupleRef>> {
        match &self.store {
            Store::Tree(s) => Ok(s.max().cloned()),
            _ => Err(CoreError::unsupported(format!(
                "max is not defined for {:?} index",
                self.spec.kind
            ))),
        }
    }

    /// Counts entries matching the comparison without materializing them.
    pub fn count(&self, ty: IteratorType, probe: &[Value]) -> CoreResult<usize> {
        self.spec.key_def.validate_probe(probe)?;
        match &self.store {
            Store::Hash(s) => match ty {
                IteratorType::All => Ok(s.len()),
                IteratorType::Eq => {
                    self.require_full_probe(probe)?;
                    Ok(s.count_eq(&Key(probe.to_vec())))
                }
                _ => Err(self.unsupported_iterator(ty)),
            },
            Store::Tree(s) => {
                if ty.is_bits() {
                    return Err(self.unsupported_iterator(ty));
                }
                Ok(s.count(ty, probe))
            }
            Store::Bitset(s) => Ok(s.count(Self::bits_pred(ty, probe)?)),
        }
    }

    /// Extracts this index's key from a tuple.
    pub fn extract_key(&self, tuple: &TupleRef) -> CoreResult<Key> {
        self.spec.key_def.extract(tuple)
    }

    /// Checks the uniqueness constraint for an incoming key.
    ///
    /// `exclude` names a tuple about to be replaced, which is allowed to
    /// occupy the key.
    pub fn check_unique(&self, key: &Key, exclude: Option<&TupleRef>) -> CoreResult<()> {
        if !self.spec.unique {
            return Ok(());
        }
        let existing = match &self.store {
            Store::Hash(s) => s.get(key),
            Store::Tree(s) => s.get(key),
            Store::Bitset(_) => None,
        };
        if let Some(existing) = existing {
            let replaced = exclude.is_some_and(|t| TupleRef::same_tuple(existing, t));
            if !replaced {
                return Err(CoreError::DuplicateKey {
                    space: self.spec.space_id.as_u32(),
                    index: self.spec.index_id.as_u32(),
                });
            }
        }
        Ok(())
    }

    /// Inserts an entry under a pre-extracted key and bumps the generation.
    pub fn insert(&mut self, key: Key, tuple: TupleRef) -> CoreResult<()> {
        match &mut self.store {
            Store::Hash(s) => s.insert(key, tuple),
            Store::Tree(s) => s.insert(key, tuple),
            Store::Bitset(s) => s.insert(Self::mask_of(&key)?, tuple),
        }
        self.generation = self.generation.next();
        Ok(())
    }

    /// Removes and returns the first entry under a full key, bumping the
    /// generation if anything was removed.
    pub fn take(&mut self, key: &Key) -> CoreResult<Option<TupleRef>> {
        let taken = match &mut self.store {
            Store::Hash(s) => s.take(key),
            Store::Tree(s) => s.take(key),
            Store::Bitset(_) => {
                return Err(CoreError::unsupported(
                    "bitset index cannot be deleted through",
                ));
            }
        };
        if taken.is_some() {
            self.generation = self.generation.next();
        }
        Ok(taken)
    }

    /// Removes the entry holding exactly this tuple, bumping the
    /// generation if it was present.
    pub fn remove_ref(&mut self, key: &Key, tuple: &TupleRef) -> bool {
        let removed = match &mut self.store {
            Store::Hash(s) => s.remove_ref(key, tuple),
            Store::Tree(s) => s.remove_ref(key, tuple),
            Store::Bitset(s) => s.remove_ref(tuple),
        };
        if removed {
            self.generation = self.generation.next();
        }
        removed
    }

    /// Builds a cursor position, validating the iterator type against the
    /// index variant and the probe against the key definition.
    pub(crate) fn make_pos(&self, ty: IteratorType, probe: &[Value]) -> CoreResult<CursorPos> {
        self.spec.key_def.validate_probe(probe)?;
        match &self.store {
            Store::Hash(_) => match ty {
                IteratorType::All => Ok(CursorPos::Slots(SlotPos::default())),
                IteratorType::Eq => {
                    self.require_full_probe(probe)?;
                    Ok(CursorPos::HashEq {
                        key: Key(probe.to_vec()),
                        next_dup: 0,
                    })
                }
                _ => Err(self.unsupported_iterator(ty)),
            },
            Store::Tree(s) => {
                if ty.is_bits() {
                    return Err(self.unsupported_iterator(ty));
                }
                Ok(CursorPos::Tree(s.make_pos(ty, probe)))
            }
            Store::Bitset(_) => {
                // Validates the predicate; the position is a plain scan.
                Self::bits_pred(ty, probe)?;
                Ok(CursorPos::Slots(SlotPos::default()))
            }
        }
    }

    /// Advances a cursor position, retaining the yielded tuple.
    pub(crate) fn advance(
        &self,
        pos: &mut CursorPos,
        ty: IteratorType,
        probe: &[Value],
    ) -> Option<TupleRef> {
        match (&self.store, pos) {
            (Store::Hash(s), CursorPos::Slots(p)) => s.advance_all(p).cloned(),
            (Store::Hash(s), CursorPos::HashEq { key, next_dup }) => {
                s.advance_eq(key, next_dup).cloned()
            }
            (Store::Tree(s), CursorPos::Tree(p)) => s.advance(p, ty, probe).cloned(),
            (Store::Bitset(s), CursorPos::Slots(p)) => {
                let pred = Self::bits_pred(ty, probe).ok()?;
                s.advance(p, pred).cloned()
            }
            _ => {
                debug_assert!(false, "cursor position does not match index variant");
                None
            }
        }
    }

    fn require_full_probe(&self, probe: &[Value]) -> CoreResult<()> {
        if probe.len() != self.spec.key_def.part_count() {
            return Err(CoreError::invalid_key(format!(
                "{:?} index requires a full key, got {} of {} part(s)",
                self.spec.kind,
                probe.len(),
                self.spec.key_def.part_count()
            )));
        }
        Ok(())
    }

    fn unsupported_iterator(&self, ty: IteratorType) -> CoreError {
        CoreError::unsupported(format!(
            "iterator type {ty:?} is not valid for {:?} index",
            self.spec.kind
        ))
    }

    fn bits_pred(ty: IteratorType, probe: &[Value]) -> CoreResult<BitsMatch> {
        let mask = || -> CoreResult<u64> {
            match probe {
                [Value::Unsigned(mask)] => Ok(*mask),
                _ => Err(CoreError::invalid_key(
                    "bitset probe must be a single unsigned mask",
                )),
            }
        };
        match ty {
            IteratorType::All => Ok(BitsMatch::Any),
            IteratorType::BitsAllSet => Ok(BitsMatch::AllSet(mask()?)),
            IteratorType::BitsAnySet => Ok(BitsMatch::AnySet(mask()?)),
            _ => Err(CoreError::unsupported(format!(
                "iterator type {ty:?} is not valid for Bitset index"
            ))),
        }
    }

    fn mask_of(key: &Key) -> CoreResult<u64> {
        match key.parts() {
            [Value::Unsigned(mask)] => Ok(*mask),
            _ => Err(CoreError::invalid_key(
                "bitset key must be a single unsigned mask",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_spec() -> IndexSpec {
        IndexSpec::new(
            SpaceId::new(1),
            IndexId::new(0),
            "primary",
            IndexKind::Tree,
            KeyDef::single(0, FieldType::Unsigned),
        )
        .unique()
    }

    fn tuple(id: u64) -> TupleRef {
        TupleRef::from_values(&[Value::Unsigned(id)]).unwrap()
    }

    fn insert(index: &mut IndexCore, id: u64) {
        let t = tuple(id);
        let key = index.extract_key(&t).unwrap();
        index.insert(key, t).unwrap();
    }

    #[test]
    fn generation_bumps_on_mutation() {
        let mut index = IndexCore::new(tree_spec()).unwrap();
        let g0 = index.generation();
        insert(&mut index, 1);
        let g1 = index.generation();
        assert!(g1 > g0);

        index.take(&Key(vec![Value::Unsigned(1)])).unwrap();
        assert!(index.generation() > g1);
    }

    #[test]
    fn take_of_missing_key_keeps_generation() {
        let mut index = IndexCore::new(tree_spec()).unwrap();
        let g0 = index.generation();
        assert!(index.take(&Key(vec![Value::Unsigned(9)])).unwrap().is_none());
        assert_eq!(index.generation(), g0);
    }

    #[test]
    fn min_max_ordering_invariant() {
        let mut index = IndexCore::new(tree_spec()).unwrap();
        for id in [42, 7, 99, 13] {
            insert(&mut index, id);
        }
        let min = index.min().unwrap().unwrap();
        let max = index.max().unwrap().unwrap();
        let min_key = index.extract_key(&min).unwrap();
        let max_key = index.extract_key(&max).unwrap();
        assert!(min_key <= max_key);
        assert_eq!(index.count(IteratorType::All, &[]).unwrap(), index.len());
    }

    #[test]
    fn unordered_min_max_unsupported() {
        let spec = IndexSpec::new(
            SpaceId::new(1),
            IndexId::new(1),
            "hash",
            IndexKind::Hash,
            KeyDef::single(0, FieldType::Unsigned),
        );
        let index = IndexCore::new(spec).unwrap();
        assert!(matches!(index.min(), Err(CoreError::Unsupported { .. })));
        assert!(matches!(index.max(), Err(CoreError::Unsupported { .. })));
    }

    #[test]
    fn hash_rejects_range_iterators() {
        let spec = IndexSpec::new(
            SpaceId::new(1),
            IndexId::new(1),
            "hash",
            IndexKind::Hash,
            KeyDef::single(0, FieldType::Unsigned),
        );
        let index = IndexCore::new(spec).unwrap();
        assert!(matches!(
            index.make_pos(IteratorType::Gt, &[Value::Unsigned(1)]),
            Err(CoreError::Unsupported { .. })
        ));
    }

    #[test]
    fn bitset_spec_validation() {
        let bad = IndexSpec::new(
            SpaceId::new(1),
            IndexId::new(1),
            "bits",
            IndexKind::Bitset,
            KeyDef::single(0, FieldType::Str),
        );
        assert!(IndexCore::new(bad).is_err());

        let good = IndexSpec::new(
            SpaceId::new(1),
            IndexId::new(1),
            "bits",
            IndexKind::Bitset,
            KeyDef::single(0, FieldType::Unsigned),
        );
        assert!(IndexCore::new(good).is_ok());
    }

    #[test]
    fn spatial_cannot_be_constructed() {
        let spec = IndexSpec::new(
            SpaceId::new(1),
            IndexId::new(1),
            "spatial",
            IndexKind::Spatial,
            KeyDef::single(0, FieldType::Unsigned),
        );
        assert!(matches!(
            IndexCore::new(spec),
            Err(CoreError::Unsupported { .. })
        ));
    }

    #[test]
    fn unique_check_allows_replaced_tuple() {
        let mut index = IndexCore::new(tree_spec()).unwrap();
        let old = tuple(1);
        let key = index.extract_key(&old).unwrap();
        index.insert(key.clone(), old.clone()).unwrap();

        assert!(index.check_unique(&key, None).is_err());
        assert!(index.check_unique(&key, Some(&old)).is_ok());
    }

    #[test]
    fn random_deterministic_per_generation() {
        let mut index = IndexCore::new(tree_spec()).unwrap();
        for id in 0..10 {
            insert(&mut index, id);
        }
        let a = index.random(3).unwrap();
        let b = index.random(3).unwrap();
        assert!(TupleRef::same_tuple(&a, &b));
    }
}
