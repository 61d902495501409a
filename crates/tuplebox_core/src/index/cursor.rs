//! Generation-bound cursors over an index.
//!
//! A cursor captures the index generation when it is opened and checks it
//! before every advancement. Any mutation of the index in between turns
//! the cursor stale: instead of guessing a position in a changed
//! structure, it reports the staleness and stays in that state until
//! dropped. Exhaustion is likewise sticky, so driving a finished cursor
//! keeps yielding nothing.

use crate::error::{CoreError, CoreResult};
use crate::index::hash::SlotPos;
use crate::index::key::Key;
use crate::index::tree::TreePos;
use crate::index::SharedIndex;
use crate::tuple::TupleRef;
use crate::types::Generation;
use std::rc::Rc;
use tracing::warn;
use tuplebox_codec::Value;

/// Comparison relation a cursor iterates under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IteratorType {
    /// Keys equal to the probe, oldest duplicate first.
    Eq,
    /// Keys equal to the probe, newest key first.
    Req,
    /// Every entry.
    All,
    /// Keys strictly below the probe, descending.
    Lt,
    /// Keys at or below the probe, descending.
    Le,
    /// Keys at or above the probe, ascending.
    Ge,
    /// Keys strictly above the probe, ascending.
    Gt,
    /// Entries whose bit mask contains every probe bit.
    BitsAllSet,
    /// Entries whose bit mask shares at least one probe bit.
    BitsAnySet,
}

impl IteratorType {
    /// Returns true for types that traverse keys in descending order.
    #[must_use]
    pub fn is_reverse(self) -> bool {
        matches!(self, Self::Req | Self::Lt | Self::Le)
    }

    /// Returns true for bit-matching types, valid only on bitset indexes.
    #[must_use]
    pub fn is_bits(self) -> bool {
        matches!(self, Self::BitsAllSet | Self::BitsAnySet)
    }
}

/// Lifecycle state of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// The cursor can still yield entries.
    Active,
    /// The cursor ran off the end of its range.
    Exhausted,
    /// The index mutated underneath the cursor.
    Stale,
}

/// Storage-specific resumption point.
///
/// Positions hold owned keys and slot offsets, never references into the
/// index, so a cursor borrows its index only for the duration of one
/// advancement.
#[derive(Debug, Clone)]
pub(crate) enum CursorPos {
    /// Offset into an insertion-ordered slot log.
    Slots(SlotPos),
    /// Duplicate offset within one hash bucket.
    HashEq {
        /// Full key of the bucket.
        key: Key,
        /// Next duplicate to yield.
        next_dup: usize,
    },
    /// Re-seek state for a tree range.
    Tree(TreePos),
}

/// A generation-bound iterator over one index.
///
/// The cursor keeps the index alive through a shared handle but retains no
/// tuples of its own; every yielded tuple is retained for the caller.
pub struct Cursor {
    index: SharedIndex,
    bound: Generation,
    ty: IteratorType,
    probe: Vec<Value>,
    pos: CursorPos,
    state: CursorState,
}

impl Cursor {
    /// Opens a cursor over `index`, binding it to the current generation.
    ///
    /// # Errors
    ///
    /// Reports Unsupported when the iterator type is not valid for the
    /// index variant, and an invalid-key error when the probe does not
    /// match the key definition.
    pub fn open(index: &SharedIndex, ty: IteratorType, probe: Vec<Value>) -> CoreResult<Self> {
        let (pos, bound) = {
            let idx = index.borrow();
            (idx.make_pos(ty, &probe)?, idx.generation())
        };
        Ok(Self {
            index: Rc::clone(index),
            bound,
            ty,
            probe,
            pos,
            state: CursorState::Active,
        })
    }

    /// Returns the next entry, retained for the caller.
    ///
    /// Yields `Ok(None)` once the range is exhausted and on every call
    /// after that. Reports staleness if the index mutated since the cursor
    /// was opened; the staleness is sticky and every further call reports
    /// it again.
    pub fn next(&mut self) -> CoreResult<Option<TupleRef>> {
        match self.state {
            CursorState::Exhausted => Ok(None),
            CursorState::Stale => Err(CoreError::StaleIterator {
                bound: self.bound.as_u64(),
                current: self.index.borrow().generation().as_u64(),
            }),
            CursorState::Active => {
                let idx = self.index.borrow();
                let current = idx.generation();
                if current != self.bound {
                    drop(idx);
                    self.state = CursorState::Stale;
                    warn!(
                        index = %self.index.borrow().spec().index_id,
                        bound = %self.bound,
                        current = %current,
                        "cursor went stale",
                    );
                    return Err(CoreError::StaleIterator {
                        bound: self.bound.as_u64(),
                        current: current.as_u64(),
                    });
                }
                match idx.advance(&mut self.pos, self.ty, &self.probe) {
                    Some(tuple) => Ok(Some(tuple)),
                    None => {
                        self.state = CursorState::Exhausted;
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Returns the cursor's lifecycle state.
    #[must_use]
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Returns the comparison relation the cursor iterates under.
    #[must_use]
    pub fn iterator_type(&self) -> IteratorType {
        self.ty
    }

    /// Returns the generation the cursor is bound to.
    #[must_use]
    pub fn bound_generation(&self) -> Generation {
        self.bound
    }
}
