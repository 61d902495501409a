//! Tuple and key encoding.
//!
//! Wire shape of an encoded tuple:
//!
//! ```text
//! varint(field_count) [ varint(field_len) field_bytes ]*
//! ```
//!
//! where `field_bytes` is a one-byte value tag followed by the payload
//! (see [`Value`]). Keys use the identical shape; a key is just a short
//! tuple of the probed parts. Fields are length-prefixed so a reader can
//! skip to any position without understanding the payloads.

use crate::value::{Value, TAG_BYTES, TAG_STR, TAG_UNSIGNED};
use bytes::BufMut;

/// Maximum encoded length of a u32 varint (LEB128).
pub const MAX_VARINT_LEN: usize = 5;

/// Writes a u32 as a LEB128 varint.
pub fn write_varint_u32(buf: &mut impl BufMut, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

/// Encodes a single field value to its tagged wire bytes.
#[must_use]
pub fn encode_value(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    match value {
        Value::Unsigned(v) => {
            out.put_u8(TAG_UNSIGNED);
            out.put_u64_le(*v);
        }
        Value::Str(s) => {
            out.put_u8(TAG_STR);
            out.put_slice(s.as_bytes());
        }
        Value::Bytes(b) => {
            out.put_u8(TAG_BYTES);
            out.put_slice(b);
        }
    }
    out
}

/// Encodes a sequence of values as a tuple.
#[must_use]
pub fn encode_tuple(values: &[Value]) -> Vec<u8> {
    let mut out = Vec::new();
    write_varint_u32(&mut out, values.len() as u32);
    for value in values {
        let field = encode_value(value);
        write_varint_u32(&mut out, field.len() as u32);
        out.put_slice(&field);
    }
    out
}

/// Encodes a search key.
///
/// Keys share the tuple wire shape; the parts are the probed values in
/// key-definition order. A partial key simply carries fewer parts.
#[must_use]
pub fn encode_key(parts: &[Value]) -> Vec<u8> {
    encode_tuple(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_single_byte() {
        let mut buf = Vec::new();
        write_varint_u32(&mut buf, 0);
        assert_eq!(buf, [0]);

        buf.clear();
        write_varint_u32(&mut buf, 127);
        assert_eq!(buf, [127]);
    }

    #[test]
    fn varint_multi_byte() {
        let mut buf = Vec::new();
        write_varint_u32(&mut buf, 300);
        assert_eq!(buf, [0xac, 0x02]);

        buf.clear();
        write_varint_u32(&mut buf, u32::MAX);
        assert_eq!(buf.len(), MAX_VARINT_LEN);
    }

    #[test]
    fn empty_tuple_is_one_byte() {
        assert_eq!(encode_tuple(&[]), [0]);
    }

    #[test]
    fn unsigned_field_layout() {
        let bytes = encode_tuple(&[Value::Unsigned(1)]);
        // count=1, len=9, tag=0, 8 LE payload bytes
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[1], 9);
        assert_eq!(bytes[2], TAG_UNSIGNED);
        assert_eq!(&bytes[3..11], &[1, 0, 0, 0, 0, 0, 0, 0]);
    }
}
