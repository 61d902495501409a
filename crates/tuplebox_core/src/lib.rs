//! # Tuplebox Core
//!
//! In-memory tuple storage engine.
//!
//! This crate provides:
//! - Reference-counted tuple handles over immutable encoded bytes
//! - Hash, tree, and bitset indexes with generation-bound cursors
//! - Spaces tying a primary and secondary indexes to one tuple set
//! - Field-level updates, input buffers, and result ports
//!
//! Everything here assumes cooperative single-threaded scheduling: each
//! operation runs to completion without yielding, and nothing is safe to
//! share across threads. Concurrent logical tasks interleave between
//! operations, which is why cursors carry generation staleness detection
//! instead of locks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod fiber;
pub mod ibuf;
pub mod index;
pub mod port;
pub mod space;
pub mod tuple;
pub mod types;
pub mod update;

pub use error::{CoreError, CoreResult};
pub use fiber::Deadline;
pub use ibuf::InputBuf;
pub use index::{
    Cursor, CursorState, FieldType, IndexCore, IndexKind, IndexSpec, IteratorType, Key, KeyDef,
    KeyPart, SharedIndex,
};
pub use port::Port;
pub use space::{Registry, Space};
pub use tuple::{live_tuple_count, FieldCursor, TupleRef};
pub use types::{Generation, IndexId, SpaceId};
pub use update::{apply as apply_update, UpdateOp};
