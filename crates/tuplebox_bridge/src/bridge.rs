//! The flat entry-point surface.
//!
//! A [`Bridge`] wraps the space registry and exposes every operation an
//! embedder needs as a narrow, stable set of methods: tuple field access,
//! index queries, cursor iteration, select, and update. Arguments that
//! cross the boundary as bytes (search keys) are decoded here; everything
//! past this layer works on typed values.

use crate::result::BridgeResult;
use std::rc::Rc;
use tracing::trace;
use tuplebox_codec::decode_key;
use tuplebox_core::{
    Cursor, CoreResult, FieldCursor, IndexId, IteratorType, Port, Registry, SpaceId, TupleRef,
    UpdateOp,
};

/// Capability handle over a space registry.
///
/// Cloning the bridge clones the handle, not the registry.
#[derive(Clone)]
pub struct Bridge {
    registry: Rc<Registry>,
}

impl Bridge {
    /// Creates a bridge over a registry.
    #[must_use]
    pub fn new(registry: Rc<Registry>) -> Self {
        Self { registry }
    }

    /// Returns the underlying registry, for schema management.
    #[must_use]
    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    // -- Tuple field access ------------------------------------------------

    /// Builds a retained tuple from encoded bytes.
    pub fn tuple_new(&self, bytes: Vec<u8>) -> CoreResult<TupleRef> {
        TupleRef::new(bytes)
    }

    /// Returns the number of fields in a tuple.
    #[must_use]
    pub fn tuple_field_count(&self, tuple: &TupleRef) -> u32 {
        tuple.field_count()
    }

    /// Returns the raw bytes of one field, or `None` past the end.
    #[must_use]
    pub fn tuple_field<'t>(&self, tuple: &'t TupleRef, position: u32) -> Option<&'t [u8]> {
        tuple.field(position)
    }

    /// Opens a field cursor over a tuple.
    #[must_use]
    pub fn tuple_cursor(&self, tuple: &TupleRef) -> FieldCursor {
        tuple.cursor()
    }

    // -- Index queries -----------------------------------------------------

    /// Returns the number of entries in an index.
    pub fn index_len(&self, space: SpaceId, index: IndexId) -> CoreResult<usize> {
        let (_, idx) = self.registry.resolve(space, index)?;
        let len = idx.borrow().len();
        Ok(len)
    }

    /// Returns the approximate memory footprint of an index in bytes.
    pub fn index_bsize(&self, space: SpaceId, index: IndexId) -> CoreResult<usize> {
        let (_, idx) = self.registry.resolve(space, index)?;
        let bsize = idx.borrow().bsize();
        Ok(bsize)
    }

    /// Returns a pseudo-random entry, deterministic for a fixed seed and
    /// an unchanged index.
    pub fn index_random(
        &self,
        space: SpaceId,
        index: IndexId,
        seed: u64,
    ) -> CoreResult<Option<TupleRef>> {
        let (_, idx) = self.registry.resolve(space, index)?;
        let picked = idx.borrow().random(seed);
        Ok(picked)
    }

    /// Equality lookup by encoded full key.
    pub fn index_get(
        &self,
        space: SpaceId,
        index: IndexId,
        key_bytes: &[u8],
    ) -> CoreResult<Option<TupleRef>> {
        let probe = decode_key(key_bytes)?;
        let (_, idx) = self.registry.resolve(space, index)?;
        let found = idx.borrow().get(&probe)?;
        Ok(found)
    }

    /// Returns the entry under the smallest key of an ordered index.
    pub fn index_min(&self, space: SpaceId, index: IndexId) -> CoreResult<Option<TupleRef>> {
        let (_, idx) = self.registry.resolve(space, index)?;
        let min = idx.borrow().min()?;
        Ok(min)
    }

    /// Returns the entry under the largest key of an ordered index.
    pub fn index_max(&self, space: SpaceId, index: IndexId) -> CoreResult<Option<TupleRef>> {
        let (_, idx) = self.registry.resolve(space, index)?;
        let max = idx.borrow().max()?;
        Ok(max)
    }

    /// Counts entries matching an encoded key under a comparison relation.
    pub fn index_count(
        &self,
        space: SpaceId,
        index: IndexId,
        ty: IteratorType,
        key_bytes: &[u8],
    ) -> CoreResult<usize> {
        let probe = decode_key(key_bytes)?;
        let (_, idx) = self.registry.resolve(space, index)?;
        let count = idx.borrow().count(ty, &probe)?;
        Ok(count)
    }

    // -- Iteration ---------------------------------------------------------

    /// Opens a generation-bound cursor over an index.
    pub fn index_iterator(
        &self,
        space: SpaceId,
        index: IndexId,
        ty: IteratorType,
        key_bytes: &[u8],
    ) -> CoreResult<Cursor> {
        let probe = decode_key(key_bytes)?;
        let (_, idx) = self.registry.resolve(space, index)?;
        Cursor::open(&idx, ty, probe)
    }

    /// Advances a cursor, retaining the yielded tuple for the caller.
    ///
    /// `Ok(None)` marks exhaustion; a stale cursor reports its staleness
    /// on this and every later call.
    pub fn iterator_next(&self, cursor: &mut Cursor) -> CoreResult<Option<TupleRef>> {
        cursor.next()
    }

    // -- Query execution ---------------------------------------------------

    /// Runs a bounded range query and collects the results into a port.
    ///
    /// The first `offset` matching tuples are skipped, then up to `limit`
    /// tuples are appended to the port in iteration order.
    pub fn select(
        &self,
        space: SpaceId,
        index: IndexId,
        ty: IteratorType,
        key_bytes: &[u8],
        limit: u32,
        offset: u32,
    ) -> CoreResult<Port> {
        let mut cursor = self.index_iterator(space, index, ty, key_bytes)?;
        let mut port = Port::new();
        let mut skipped = 0u32;
        while port.len() < limit as usize {
            let Some(tuple) = cursor.next()? else {
                break;
            };
            if skipped < offset {
                skipped += 1;
                continue;
            }
            port.append(tuple);
        }
        trace!(
            %space,
            %index,
            ?ty,
            limit,
            offset,
            yielded = port.len(),
            "select executed",
        );
        Ok(port)
    }

    // -- Mutation ----------------------------------------------------------

    /// Applies update operations to the tuple under an encoded key.
    ///
    /// Returns the replacement tuple, or `None` if the key matched
    /// nothing.
    pub fn update(
        &self,
        space: SpaceId,
        index: IndexId,
        key_bytes: &[u8],
        ops: &[UpdateOp],
    ) -> CoreResult<Option<TupleRef>> {
        let probe = decode_key(key_bytes)?;
        let sp = self.registry.space(space)?;
        sp.update(index, &probe, ops)
    }

    /// Maps an operation outcome to its stable result code.
    #[must_use]
    pub fn code_of<T>(result: &CoreResult<T>) -> BridgeResult {
        crate::result::code_of(result)
    }
}
