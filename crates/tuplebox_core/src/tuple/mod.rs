//! Tuple lifetime management.
//!
//! A tuple is an immutable encoded record shared by reference counting.
//! [`TupleRef`] is the clonable handle: cloning retains, dropping releases,
//! and the payload is freed exactly once when the last handle goes away.
//! Counts are plain non-atomic — all mutation happens on the single
//! scheduling thread, so no concurrent writers ever overlap a counter
//! update.
//!
//! The encoded bytes are never modified after creation. The field-offset
//! table used for random access is computed lazily on the first positional
//! lookup and cached for the tuple's remaining lifetime.

mod cursor;

pub use cursor::FieldCursor;

use crate::error::CoreResult;
use std::cell::{Cell, OnceCell};
use std::fmt;
use std::rc::Rc;
use tuplebox_codec::{decode_tuple, split_fields, Value};

thread_local! {
    static LIVE_TUPLES: Cell<usize> = const { Cell::new(0) };
}

/// Returns the number of tuple payloads currently alive on this thread.
///
/// This is a leak canary for tests: a balanced retain/release history
/// brings the count back to where it started, and a payload freed twice
/// would drive it below zero (which underflow-panics in debug builds).
#[must_use]
pub fn live_tuple_count() -> usize {
    LIVE_TUPLES.with(|c| c.get())
}

/// The shared payload behind a [`TupleRef`].
struct TupleData {
    /// Encoded tuple bytes, immutable after creation.
    bytes: Box<[u8]>,
    /// Field count, parsed from the header at creation.
    field_count: u32,
    /// Lazily computed (offset, length) per field, tag byte included.
    offsets: OnceCell<Box<[(u32, u32)]>>,
}

impl Drop for TupleData {
    fn drop(&mut self) {
        LIVE_TUPLES.with(|c| c.set(c.get() - 1));
    }
}

/// A reference-counted handle to an immutable tuple.
///
/// Clone increments the reference count, drop decrements it; the pairing
/// is enforced by ownership, so a release without a matching retain cannot
/// be expressed. The handle is deliberately `!Send`: tuples live inside
/// one cooperatively scheduled thread.
pub struct TupleRef {
    inner: Rc<TupleData>,
}

impl TupleRef {
    /// Creates a tuple from encoded bytes.
    ///
    /// The encoding is validated eagerly: the field count and every field
    /// length must parse, and no trailing bytes are tolerated. The
    /// field-offset table itself is still built lazily.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the bytes are not a well-formed tuple.
    pub fn new(bytes: Vec<u8>) -> CoreResult<Self> {
        let field_count = split_fields(&bytes)?.len() as u32;
        LIVE_TUPLES.with(|c| c.set(c.get() + 1));
        Ok(Self {
            inner: Rc::new(TupleData {
                bytes: bytes.into_boxed_slice(),
                field_count,
                offsets: OnceCell::new(),
            }),
        })
    }

    /// Encodes field values and creates a tuple from them.
    pub fn from_values(values: &[Value]) -> CoreResult<Self> {
        Self::new(tuplebox_codec::encode_tuple(values))
    }

    /// Explicitly retains the tuple, returning a new handle.
    ///
    /// Equivalent to `clone`; named for legibility at the bridge surface,
    /// where the retain/release contract is part of the call convention.
    #[must_use]
    pub fn retain(&self) -> Self {
        self.clone()
    }

    /// Returns the current reference count.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Returns the number of fields in the tuple.
    #[must_use]
    pub fn field_count(&self) -> u32 {
        self.inner.field_count
    }

    /// Returns the encoded bytes of the field at `position`, tag included.
    ///
    /// Returns `None` for `position >= field_count()`; an out-of-range
    /// position is a not-found condition, never a fault.
    #[must_use]
    pub fn field(&self, position: u32) -> Option<&[u8]> {
        let (start, len) = *self.offsets().get(position as usize)?;
        Some(&self.inner.bytes[start as usize..(start + len) as usize])
    }

    /// Returns the raw encoded tuple bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.inner.bytes
    }

    /// Returns the memory footprint of the payload in bytes.
    #[must_use]
    pub fn bsize(&self) -> usize {
        self.inner.bytes.len()
    }

    /// Decodes every field into its value.
    pub fn decode(&self) -> CoreResult<Vec<Value>> {
        Ok(decode_tuple(&self.inner.bytes)?)
    }

    /// Opens a stateful field cursor over this tuple.
    ///
    /// Cursor state is per-cursor, not per-tuple; any number of cursors
    /// may traverse one tuple concurrently since the bytes are read-only.
    #[must_use]
    pub fn cursor(&self) -> FieldCursor {
        FieldCursor::new(self)
    }

    /// Returns true if both handles refer to the same payload.
    #[must_use]
    pub fn same_tuple(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Returns the lazily built field-offset table.
    fn offsets(&self) -> &[(u32, u32)] {
        self.inner.offsets.get_or_init(|| {
            let bytes = &self.inner.bytes;
            // Cannot fail: the same walk succeeded in `new`.
            let fields = split_fields(bytes).expect("tuple bytes validated at creation");
            fields
                .iter()
                .map(|f| {
                    let start = f.as_ptr() as usize - bytes.as_ptr() as usize;
                    (start as u32, f.len() as u32)
                })
                .collect()
        })
    }
}

impl Clone for TupleRef {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for TupleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TupleRef")
            .field("fields", &self.field_count())
            .field("bsize", &self.bsize())
            .field("refs", &self.ref_count())
            .finish()
    }
}
