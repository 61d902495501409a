//! Tuple and key decoding.

use crate::error::{CodecError, CodecResult};
use crate::value::{Value, TAG_BYTES, TAG_STR, TAG_UNSIGNED};

/// Reads a LEB128 u32 varint, advancing `pos`.
pub fn read_varint_u32(bytes: &[u8], pos: &mut usize) -> CodecResult<u32> {
    let start = *pos;
    let mut value: u32 = 0;
    let mut shift = 0u32;
    loop {
        let byte = *bytes
            .get(*pos)
            .ok_or(CodecError::truncated(*pos, 1))?;
        *pos += 1;
        if shift == 28 && byte > 0x0f {
            return Err(CodecError::VarintOverflow { offset: start });
        }
        value |= u32::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
        if shift > 28 {
            return Err(CodecError::VarintOverflow { offset: start });
        }
    }
}

/// Decodes a single tagged field from its wire bytes.
///
/// The entire slice must be consumed by the field.
pub fn decode_value(field: &[u8]) -> CodecResult<Value> {
    let (&tag, payload) = field
        .split_first()
        .ok_or(CodecError::truncated(0, 1))?;
    match tag {
        TAG_UNSIGNED => {
            let arr: [u8; 8] = payload.try_into().map_err(|_| {
                CodecError::invalid_field(format!(
                    "unsigned field needs 8 payload bytes, got {}",
                    payload.len()
                ))
            })?;
            Ok(Value::Unsigned(u64::from_le_bytes(arr)))
        }
        TAG_STR => {
            let text = std::str::from_utf8(payload).map_err(|_| CodecError::InvalidUtf8)?;
            Ok(Value::Str(text.to_string()))
        }
        TAG_BYTES => Ok(Value::Bytes(payload.to_vec())),
        other => Err(CodecError::UnknownTag { tag: other }),
    }
}

/// Splits an encoded tuple into raw field slices without decoding payloads.
///
/// This is the cheap pass the tuple store uses to build its field-offset
/// table; each returned slice includes the field's tag byte.
pub fn split_fields(bytes: &[u8]) -> CodecResult<Vec<&[u8]>> {
    let mut pos = 0usize;
    let count = read_varint_u32(bytes, &mut pos)? as usize;
    // Each field costs at least its length byte, so a count beyond the
    // remaining bytes is a lie; size the allocation by what can exist.
    let mut fields = Vec::with_capacity(count.min(bytes.len().saturating_sub(pos)));
    for _ in 0..count {
        let len = read_varint_u32(bytes, &mut pos)? as usize;
        let end = pos
            .checked_add(len)
            .filter(|&e| e <= bytes.len())
            .ok_or_else(|| CodecError::truncated(pos, len))?;
        fields.push(&bytes[pos..end]);
        pos = end;
    }
    if pos != bytes.len() {
        return Err(CodecError::TrailingBytes {
            remaining: bytes.len() - pos,
        });
    }
    Ok(fields)
}

/// Decodes an encoded tuple into its field values.
pub fn decode_tuple(bytes: &[u8]) -> CodecResult<Vec<Value>> {
    split_fields(bytes)?
        .into_iter()
        .map(decode_value)
        .collect()
}

/// Decodes an encoded search key into its parts.
pub fn decode_key(bytes: &[u8]) -> CodecResult<Vec<Value>> {
    decode_tuple(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode_tuple, encode_value, write_varint_u32};

    #[test]
    fn varint_roundtrip_boundaries() {
        for v in [0u32, 1, 127, 128, 300, 16383, 16384, u32::MAX] {
            let mut buf = Vec::new();
            write_varint_u32(&mut buf, v);
            let mut pos = 0;
            assert_eq!(read_varint_u32(&buf, &mut pos).unwrap(), v);
            assert_eq!(pos, buf.len());
        }
    }

    #[test]
    fn varint_overflow_rejected() {
        let mut pos = 0;
        let err = read_varint_u32(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x01], &mut pos);
        assert!(matches!(err, Err(CodecError::VarintOverflow { .. })));
    }

    #[test]
    fn tuple_roundtrip() {
        let values = vec![
            Value::Unsigned(42),
            Value::Str("hello".into()),
            Value::Bytes(vec![0, 1, 2]),
        ];
        let bytes = encode_tuple(&values);
        assert_eq!(decode_tuple(&bytes).unwrap(), values);
    }

    #[test]
    fn empty_tuple_roundtrip() {
        let bytes = encode_tuple(&[]);
        assert!(decode_tuple(&bytes).unwrap().is_empty());
    }

    #[test]
    fn truncation_detected_at_every_prefix() {
        let bytes = encode_tuple(&[Value::Unsigned(7), Value::Str("abc".into())]);
        for cut in 0..bytes.len() {
            assert!(
                decode_tuple(&bytes[..cut]).is_err(),
                "prefix of {cut} bytes decoded"
            );
        }
        assert!(decode_tuple(&bytes).is_ok());
    }

    #[test]
    fn huge_field_count_is_an_error_not_an_allocation() {
        // Five bytes claiming u32::MAX fields must fail cleanly on the
        // missing length bytes, never reserve memory for the claim.
        let bytes = [0xff, 0xff, 0xff, 0xff, 0x0f];
        assert!(matches!(
            decode_tuple(&bytes),
            Err(CodecError::Truncated { .. })
        ));

        // Same claim with one length byte present: still truncated.
        let bytes = [0xff, 0xff, 0xff, 0xff, 0x0f, 0x00];
        assert!(decode_tuple(&bytes).is_err());
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = encode_tuple(&[Value::Unsigned(7)]);
        bytes.push(0);
        assert!(matches!(
            decode_tuple(&bytes),
            Err(CodecError::TrailingBytes { remaining: 1 })
        ));
    }

    #[test]
    fn unsigned_payload_length_enforced() {
        let mut field = encode_value(&Value::Unsigned(1));
        field.pop();
        assert!(matches!(
            decode_value(&field),
            Err(CodecError::InvalidField { .. })
        ));
    }

    #[test]
    fn unknown_tag_rejected() {
        assert!(matches!(
            decode_value(&[9, 0, 0]),
            Err(CodecError::UnknownTag { tag: 9 })
        ));
    }

    #[test]
    fn invalid_utf8_rejected() {
        assert!(matches!(
            decode_value(&[crate::value::TAG_STR, 0xff, 0xfe]),
            Err(CodecError::InvalidUtf8)
        ));
    }
}
