//! Spaces and the space registry.
//!
//! A space is a named tuple container with one primary index and any
//! number of secondary indexes over the same tuples. Mutations go through
//! the space so that every index observes the same change; each mutation
//! validates keys and uniqueness across all indexes before touching any
//! of them, so a failed operation leaves the space unchanged.

use crate::error::{CoreError, CoreResult};
use crate::index::{Cursor, IndexCore, IndexKind, IndexSpec, IteratorType, Key, SharedIndex};
use crate::tuple::TupleRef;
use crate::types::{IndexId, SpaceId};
use crate::update::{self, UpdateOp};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;
use tuplebox_codec::Value;

/// A named tuple container.
pub struct Space {
    id: SpaceId,
    name: String,
    indexes: RefCell<Vec<SharedIndex>>,
}

impl Space {
    fn new(id: SpaceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            indexes: RefCell::new(Vec::new()),
        }
    }

    /// Returns the space ID.
    #[must_use]
    pub fn id(&self) -> SpaceId {
        self.id
    }

    /// Returns the space name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of tuples, as counted by the primary index.
    pub fn len(&self) -> CoreResult<usize> {
        Ok(self.primary()?.borrow().len())
    }

    /// Returns true if the space holds no tuples.
    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Creates the next index of the space.
    ///
    /// Indexes are created in ID order; index 0 is the primary and must be
    /// a unique hash or tree index, since every mutation resolves tuples
    /// through it.
    pub fn create_index(&self, spec: IndexSpec) -> CoreResult<SharedIndex> {
        let mut indexes = self.indexes.borrow_mut();
        if spec.space_id != self.id {
            return Err(CoreError::invalid_operation(format!(
                "index spec names {}, created in {}",
                spec.space_id, self.id
            )));
        }
        if spec.index_id.as_u32() as usize != indexes.len() {
            return Err(CoreError::invalid_operation(format!(
                "index IDs are assigned in order; next is index:{}",
                indexes.len()
            )));
        }
        if spec.index_id.is_primary() {
            let lookup_capable = matches!(spec.kind, IndexKind::Hash | IndexKind::Tree);
            if !lookup_capable || !spec.unique {
                return Err(CoreError::invalid_operation(
                    "primary index must be a unique hash or tree index",
                ));
            }
        }
        debug!(space = %self.id, index = %spec.index_id, name = %spec.name, "creating index");
        let mut index = IndexCore::new(spec)?;
        if let Some(primary) = indexes.first() {
            Self::backfill(primary, &mut index)?;
        }
        let index = Rc::new(RefCell::new(index));
        indexes.push(Rc::clone(&index));
        Ok(index)
    }

    /// Fills a new secondary index from the tuples the primary already
    /// holds, so every index observes the same tuple set from the moment
    /// it exists. Any failure leaves the space without the new index.
    fn backfill(primary: &SharedIndex, index: &mut IndexCore) -> CoreResult<()> {
        let primary = primary.borrow();
        let mut pos = primary.make_pos(IteratorType::All, &[])?;
        while let Some(tuple) = primary.advance(&mut pos, IteratorType::All, &[]) {
            let key = index.extract_key(&tuple)?;
            index.check_unique(&key, None)?;
            index.insert(key, tuple)?;
        }
        Ok(())
    }

    /// Resolves an index by ID.
    pub fn index(&self, id: IndexId) -> CoreResult<SharedIndex> {
        self.indexes
            .borrow()
            .get(id.as_u32() as usize)
            .cloned()
            .ok_or(CoreError::IndexNotFound {
                space: self.id.as_u32(),
                index: id.as_u32(),
            })
    }

    /// Resolves the primary index.
    pub fn primary(&self) -> CoreResult<SharedIndex> {
        self.index(IndexId::new(0))
    }

    fn all_indexes(&self) -> Vec<SharedIndex> {
        self.indexes.borrow().clone()
    }

    /// Extracts this tuple's key for every index, validating them all
    /// before anything is mutated.
    fn extract_all(&self, tuple: &TupleRef) -> CoreResult<Vec<(SharedIndex, Key)>> {
        let mut keys = Vec::new();
        for index in self.all_indexes() {
            let key = index.borrow().extract_key(tuple)?;
            keys.push((index, key));
        }
        Ok(keys)
    }

    /// Inserts a tuple into every index.
    ///
    /// # Errors
    ///
    /// Reports a duplicate-key error if any unique index already holds an
    /// entry under the tuple's key; the space is unchanged in that case.
    pub fn insert(&self, tuple: TupleRef) -> CoreResult<()> {
        let keys = self.extract_all(&tuple)?;
        for (index, key) in &keys {
            index.borrow().check_unique(key, None)?;
        }
        for (index, key) in keys {
            index.borrow_mut().insert(key, tuple.clone())?;
        }
        Ok(())
    }

    /// Inserts a tuple, replacing any tuple under the same primary key.
    ///
    /// Returns the replaced tuple, still retained, if there was one.
    pub fn replace(&self, tuple: TupleRef) -> CoreResult<Option<TupleRef>> {
        let primary = self.primary()?;
        let primary_key = primary.borrow().extract_key(&tuple)?;
        let old = primary.borrow().get(primary_key.parts())?;

        let keys = self.extract_all(&tuple)?;
        for (index, key) in &keys {
            index.borrow().check_unique(key, old.as_ref())?;
        }
        if let Some(old) = &old {
            self.detach(old)?;
        }
        for (index, key) in keys {
            index.borrow_mut().insert(key, tuple.clone())?;
        }
        Ok(old)
    }

    /// Deletes the tuple under a full primary key.
    ///
    /// Returns the deleted tuple, still retained, or `None` if the key
    /// matched nothing.
    pub fn delete(&self, probe: &[Value]) -> CoreResult<Option<TupleRef>> {
        let primary = self.primary()?;
        let Some(old) = primary.borrow().get(probe)? else {
            return Ok(None);
        };
        self.detach(&old)?;
        Ok(Some(old))
    }

    /// Applies update operations to the tuple found under `probe` in the
    /// named index.
    ///
    /// Returns the new tuple, or `None` if the probe matched nothing. The
    /// primary key of the tuple must survive the update unchanged.
    pub fn update(
        &self,
        index_id: IndexId,
        probe: &[Value],
        ops: &[UpdateOp],
    ) -> CoreResult<Option<TupleRef>> {
        let lookup = self.index(index_id)?;
        let Some(old) = lookup.borrow().get(probe)? else {
            return Ok(None);
        };
        let new_values = update::apply(ops, &old.decode()?)?;
        let new = TupleRef::from_values(&new_values)?;

        let primary = self.primary()?;
        let old_pk = primary.borrow().extract_key(&old)?;
        let new_pk = primary.borrow().extract_key(&new)?;
        if old_pk != new_pk {
            return Err(CoreError::update_failed(
                "update must not change the primary key",
            ));
        }

        let keys = self.extract_all(&new)?;
        for (index, key) in &keys {
            index.borrow().check_unique(key, Some(&old))?;
        }
        self.detach(&old)?;
        for (index, key) in keys {
            index.borrow_mut().insert(key, new.clone())?;
        }
        Ok(Some(new))
    }

    /// Opens a cursor over one of the space's indexes.
    pub fn cursor(
        &self,
        index_id: IndexId,
        ty: IteratorType,
        probe: Vec<Value>,
    ) -> CoreResult<Cursor> {
        let index = self.index(index_id)?;
        Cursor::open(&index, ty, probe)
    }

    /// Removes a tuple from every index it appears in.
    fn detach(&self, tuple: &TupleRef) -> CoreResult<()> {
        for index in self.all_indexes() {
            let key = index.borrow().extract_key(tuple)?;
            index.borrow_mut().remove_ref(&key, tuple);
        }
        Ok(())
    }
}

/// Registry of spaces by ID.
#[derive(Default)]
pub struct Registry {
    spaces: RefCell<HashMap<SpaceId, Rc<Space>>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new space under an unused ID.
    pub fn create_space(&self, id: SpaceId, name: impl Into<String>) -> CoreResult<Rc<Space>> {
        let mut spaces = self.spaces.borrow_mut();
        if spaces.contains_key(&id) {
            return Err(CoreError::invalid_operation(format!(
                "{id} already exists"
            )));
        }
        let space = Rc::new(Space::new(id, name));
        debug!(space = %id, name = %space.name(), "creating space");
        spaces.insert(id, Rc::clone(&space));
        Ok(space)
    }

    /// Resolves a space by ID.
    pub fn space(&self, id: SpaceId) -> CoreResult<Rc<Space>> {
        self.spaces
            .borrow()
            .get(&id)
            .cloned()
            .ok_or(CoreError::SpaceNotFound { id: id.as_u32() })
    }

    /// Removes a space from the registry.
    ///
    /// Outstanding tuple handles stay valid; only the registration goes.
    pub fn drop_space(&self, id: SpaceId) -> CoreResult<()> {
        self.spaces
            .borrow_mut()
            .remove(&id)
            .map(|_| ())
            .ok_or(CoreError::SpaceNotFound { id: id.as_u32() })
    }

    /// Resolves a space and one of its indexes in a single step.
    pub fn resolve(&self, space: SpaceId, index: IndexId) -> CoreResult<(Rc<Space>, SharedIndex)> {
        let space = self.space(space)?;
        let idx = space.index(index)?;
        Ok((space, idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::FieldType;
    use crate::index::KeyDef;

    fn space_with_secondary() -> (Registry, Rc<Space>) {
        let registry = Registry::new();
        let space = registry.create_space(SpaceId::new(1), "users").unwrap();
        space
            .create_index(
                IndexSpec::new(
                    SpaceId::new(1),
                    IndexId::new(0),
                    "primary",
                    IndexKind::Tree,
                    KeyDef::single(0, FieldType::Unsigned),
                )
                .unique(),
            )
            .unwrap();
        space
            .create_index(IndexSpec::new(
                SpaceId::new(1),
                IndexId::new(1),
                "by_name",
                IndexKind::Hash,
                KeyDef::single(1, FieldType::Str),
            ))
            .unwrap();
        (registry, space)
    }

    fn user(id: u64, name: &str) -> TupleRef {
        TupleRef::from_values(&[Value::Unsigned(id), Value::from(name)]).unwrap()
    }

    #[test]
    fn insert_visible_in_all_indexes() {
        let (_registry, space) = space_with_secondary();
        space.insert(user(1, "ada")).unwrap();

        let primary = space.primary().unwrap();
        let by_name = space.index(IndexId::new(1)).unwrap();
        assert!(primary.borrow().get(&[Value::Unsigned(1)]).unwrap().is_some());
        assert!(by_name.borrow().get(&[Value::from("ada")]).unwrap().is_some());
    }

    #[test]
    fn duplicate_primary_key_rejected_atomically() {
        let (_registry, space) = space_with_secondary();
        space.insert(user(1, "ada")).unwrap();

        let err = space.insert(user(1, "bob")).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey { .. }));

        // Nothing of the rejected tuple leaked into the secondary.
        let by_name = space.index(IndexId::new(1)).unwrap();
        assert!(by_name.borrow().get(&[Value::from("bob")]).unwrap().is_none());
    }

    #[test]
    fn replace_swaps_tuple_under_same_key() {
        let (_registry, space) = space_with_secondary();
        space.insert(user(1, "ada")).unwrap();

        let old = space.replace(user(1, "grace")).unwrap().unwrap();
        assert_eq!(old.decode().unwrap()[1], Value::from("ada"));
        assert_eq!(space.len().unwrap(), 1);

        let by_name = space.index(IndexId::new(1)).unwrap();
        assert!(by_name.borrow().get(&[Value::from("ada")]).unwrap().is_none());
        assert!(by_name.borrow().get(&[Value::from("grace")]).unwrap().is_some());
    }

    #[test]
    fn replace_without_existing_is_insert() {
        let (_registry, space) = space_with_secondary();
        assert!(space.replace(user(1, "ada")).unwrap().is_none());
        assert_eq!(space.len().unwrap(), 1);
    }

    #[test]
    fn delete_detaches_everywhere() {
        let (_registry, space) = space_with_secondary();
        space.insert(user(1, "ada")).unwrap();

        let old = space.delete(&[Value::Unsigned(1)]).unwrap().unwrap();
        assert_eq!(old.decode().unwrap()[0], Value::Unsigned(1));
        assert_eq!(space.len().unwrap(), 0);

        let by_name = space.index(IndexId::new(1)).unwrap();
        assert!(by_name.borrow().get(&[Value::from("ada")]).unwrap().is_none());
        assert!(space.delete(&[Value::Unsigned(1)]).unwrap().is_none());
    }

    #[test]
    fn update_rewrites_secondary_entries() {
        let (_registry, space) = space_with_secondary();
        space.insert(user(1, "ada")).unwrap();

        let new = space
            .update(
                IndexId::new(0),
                &[Value::Unsigned(1)],
                &[UpdateOp::assign(1, Value::from("ada lovelace"))],
            )
            .unwrap()
            .unwrap();
        assert_eq!(new.decode().unwrap()[1], Value::from("ada lovelace"));

        let by_name = space.index(IndexId::new(1)).unwrap();
        assert!(by_name.borrow().get(&[Value::from("ada")]).unwrap().is_none());
        assert!(by_name
            .borrow()
            .get(&[Value::from("ada lovelace")])
            .unwrap()
            .is_some());
    }

    #[test]
    fn update_cannot_change_primary_key() {
        let (_registry, space) = space_with_secondary();
        space.insert(user(1, "ada")).unwrap();

        let err = space
            .update(
                IndexId::new(0),
                &[Value::Unsigned(1)],
                &[UpdateOp::assign(0, Value::Unsigned(2))],
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::UpdateFailed { .. }));

        // The original tuple is untouched.
        assert!(space
            .primary()
            .unwrap()
            .borrow()
            .get(&[Value::Unsigned(1)])
            .unwrap()
            .is_some());
    }

    #[test]
    fn update_missing_key_is_none() {
        let (_registry, space) = space_with_secondary();
        let result = space
            .update(IndexId::new(0), &[Value::Unsigned(9)], &[])
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn primary_must_be_unique_and_ordered_or_hashed() {
        let registry = Registry::new();
        let space = registry.create_space(SpaceId::new(2), "bad").unwrap();
        let err = space
            .create_index(IndexSpec::new(
                SpaceId::new(2),
                IndexId::new(0),
                "primary",
                IndexKind::Tree,
                KeyDef::single(0, FieldType::Unsigned),
            ))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation { .. }));
    }

    #[test]
    fn index_ids_assigned_in_order() {
        let (_registry, space) = space_with_secondary();
        let err = space
            .create_index(IndexSpec::new(
                SpaceId::new(1),
                IndexId::new(5),
                "gap",
                IndexKind::Hash,
                KeyDef::single(0, FieldType::Unsigned),
            ))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation { .. }));
    }

    fn space_with_primary(registry: &Registry, id: u32) -> Rc<Space> {
        let space = registry.create_space(SpaceId::new(id), "late").unwrap();
        space
            .create_index(
                IndexSpec::new(
                    SpaceId::new(id),
                    IndexId::new(0),
                    "primary",
                    IndexKind::Tree,
                    KeyDef::single(0, FieldType::Unsigned),
                )
                .unique(),
            )
            .unwrap();
        space
    }

    #[test]
    fn late_secondary_index_backfills_existing_tuples() {
        let registry = Registry::new();
        let space = space_with_primary(&registry, 3);
        space.insert(user(1, "ada")).unwrap();
        space.insert(user(2, "bob")).unwrap();

        let by_name = space
            .create_index(IndexSpec::new(
                SpaceId::new(3),
                IndexId::new(1),
                "by_name",
                IndexKind::Hash,
                KeyDef::single(1, FieldType::Str),
            ))
            .unwrap();
        assert_eq!(by_name.borrow().len(), 2);
        assert!(by_name.borrow().get(&[Value::from("ada")]).unwrap().is_some());
        assert!(by_name.borrow().get(&[Value::from("bob")]).unwrap().is_some());

        // Later mutations keep flowing into the backfilled index.
        space.delete(&[Value::Unsigned(1)]).unwrap();
        assert!(by_name.borrow().get(&[Value::from("ada")]).unwrap().is_none());
        assert_eq!(by_name.borrow().len(), 1);
    }

    #[test]
    fn backfill_conflict_leaves_space_without_the_index() {
        let registry = Registry::new();
        let space = space_with_primary(&registry, 4);
        space.insert(user(1, "dup")).unwrap();
        space.insert(user(2, "dup")).unwrap();

        let err = space
            .create_index(
                IndexSpec::new(
                    SpaceId::new(4),
                    IndexId::new(1),
                    "by_name",
                    IndexKind::Hash,
                    KeyDef::single(1, FieldType::Str),
                )
                .unique(),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey { .. }));
        assert!(space.index(IndexId::new(1)).is_err());

        // A non-unique index over the same field backfills both rows.
        let by_name = space
            .create_index(IndexSpec::new(
                SpaceId::new(4),
                IndexId::new(1),
                "by_name",
                IndexKind::Hash,
                KeyDef::single(1, FieldType::Str),
            ))
            .unwrap();
        assert_eq!(by_name.borrow().len(), 2);
    }

    #[test]
    fn registry_resolution() {
        let (registry, _space) = space_with_secondary();
        assert!(registry.space(SpaceId::new(1)).is_ok());
        assert!(matches!(
            registry.space(SpaceId::new(9)),
            Err(CoreError::SpaceNotFound { id: 9 })
        ));
        assert!(registry.resolve(SpaceId::new(1), IndexId::new(1)).is_ok());
        assert!(matches!(
            registry.resolve(SpaceId::new(1), IndexId::new(9)),
            Err(CoreError::IndexNotFound { .. })
        ));
    }

    #[test]
    fn drop_space_unregisters() {
        let (registry, _space) = space_with_secondary();
        registry.drop_space(SpaceId::new(1)).unwrap();
        assert!(registry.space(SpaceId::new(1)).is_err());
        assert!(registry.drop_space(SpaceId::new(1)).is_err());
    }

    #[test]
    fn duplicate_space_id_rejected() {
        let registry = Registry::new();
        registry.create_space(SpaceId::new(1), "a").unwrap();
        assert!(registry.create_space(SpaceId::new(1), "b").is_err());
    }
}
