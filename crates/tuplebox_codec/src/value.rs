//! Dynamic field value type.

use std::cmp::Ordering;
use std::fmt;

/// Tag byte for an unsigned integer field.
pub const TAG_UNSIGNED: u8 = 0;
/// Tag byte for a UTF-8 string field.
pub const TAG_STR: u8 = 1;
/// Tag byte for an opaque byte-string field.
pub const TAG_BYTES: u8 = 2;

/// A dynamic tuple field value.
///
/// Fields are self-describing on the wire: a one-byte tag followed by the
/// payload. The ordering implemented here is the ordering indexes use for
/// key comparison: values sort by tag first, then by content. `Unsigned`
/// compares numerically; `Str` and `Bytes` compare bytewise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Unsigned 64-bit integer. Encoded as 8 little-endian bytes.
    Unsigned(u64),
    /// UTF-8 text.
    Str(String),
    /// Opaque bytes.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns the wire tag for this value.
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            Value::Unsigned(_) => TAG_UNSIGNED,
            Value::Str(_) => TAG_STR,
            Value::Bytes(_) => TAG_BYTES,
        }
    }

    /// Returns the unsigned payload, if this is an `Unsigned` value.
    #[must_use]
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            Value::Unsigned(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a `Str` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Unsigned(a), Value::Unsigned(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            _ => self.tag().cmp(&other.tag()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unsigned(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "bytes[{}]", b.len()),
        }
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Unsigned(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}
