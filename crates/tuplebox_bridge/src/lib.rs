//! # Tuplebox Bridge
//!
//! Flat entry-point surface over the tuplebox core engine.
//!
//! Embedders talk to the engine through a [`Bridge`]: a narrow, stable
//! set of methods covering tuple field access, index queries, cursor
//! iteration, bounded selects, and updates. Errors stay typed inside the
//! crate boundary; [`BridgeResult`] provides the stable numeric taxonomy
//! for callers that cannot carry a Rust error type.
//!
//! Like the core, the bridge assumes cooperative single-threaded
//! scheduling and is not safe to share across threads.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
mod result;

pub use bridge::Bridge;
pub use result::{code_of, BridgeResult, ErrorCode};

// Buffer and port lifecycle cross the boundary as plain values.
pub use tuplebox_core::{
    Cursor, CursorState, InputBuf, IndexId, IteratorType, Port, SpaceId, TupleRef, UpdateOp,
};
