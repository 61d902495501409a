//! # tuplebox codec
//!
//! Positional tuple encoding and decoding for tuplebox.
//!
//! An encoded tuple is self-describing and positionally addressable: a
//! varint field count followed by length-prefixed fields, each a tagged
//! value payload. The same wire shape carries search keys crossing the
//! bridge layer.
//!
//! ## Usage
//!
//! ```
//! use tuplebox_codec::{encode_tuple, decode_tuple, Value};
//!
//! let bytes = encode_tuple(&[Value::Unsigned(42), Value::from("answer")]);
//! let values = decode_tuple(&bytes).unwrap();
//! assert_eq!(values[0], Value::Unsigned(42));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::{decode_key, decode_tuple, decode_value, read_varint_u32, split_fields};
pub use encoder::{encode_key, encode_tuple, encode_value, write_varint_u32, MAX_VARINT_LEN};
pub use error::{CodecError, CodecResult};
pub use value::{Value, TAG_BYTES, TAG_STR, TAG_UNSIGNED};
