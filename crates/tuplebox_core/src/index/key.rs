//! Index key definitions and extracted keys.

use crate::error::{CoreError, CoreResult};
use crate::tuple::TupleRef;
use std::cmp::Ordering;
use tuplebox_codec::{decode_value, Value};

/// Type of a key part, declared when the index is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Unsigned 64-bit integer field.
    Unsigned,
    /// UTF-8 string field.
    Str,
    /// Opaque byte-string field.
    Bytes,
}

impl FieldType {
    /// Returns true if `value` has this type.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::Unsigned, Value::Unsigned(_))
                | (FieldType::Str, Value::Str(_))
                | (FieldType::Bytes, Value::Bytes(_))
        )
    }
}

/// One part of a key definition: a field position and its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPart {
    /// Tuple field position this part is extracted from.
    pub field_no: u32,
    /// Declared type of the field.
    pub field_type: FieldType,
}

impl KeyPart {
    /// Creates a key part.
    #[must_use]
    pub const fn new(field_no: u32, field_type: FieldType) -> Self {
        Self {
            field_no,
            field_type,
        }
    }
}

/// Ordered description of the fields an index is keyed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDef {
    parts: Vec<KeyPart>,
}

impl KeyDef {
    /// Creates a key definition from its parts.
    #[must_use]
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self { parts }
    }

    /// Shorthand for a single-part definition.
    #[must_use]
    pub fn single(field_no: u32, field_type: FieldType) -> Self {
        Self::new(vec![KeyPart::new(field_no, field_type)])
    }

    /// Returns the number of parts.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Returns the parts.
    #[must_use]
    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    /// Extracts this key from a tuple, validating field presence and types.
    pub fn extract(&self, tuple: &TupleRef) -> CoreResult<Key> {
        let mut values = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            let span = tuple.field(part.field_no).ok_or_else(|| {
                CoreError::invalid_key(format!(
                    "tuple has no field {} required by key definition",
                    part.field_no
                ))
            })?;
            let value = decode_value(span)?;
            if !part.field_type.matches(&value) {
                return Err(CoreError::invalid_key(format!(
                    "field {} is {value}, expected {:?}",
                    part.field_no, part.field_type
                )));
            }
            values.push(value);
        }
        Ok(Key(values))
    }

    /// Validates a search probe against this definition.
    ///
    /// A probe may carry fewer parts than the definition (a partial key);
    /// the parts it does carry must match the declared types in order.
    pub fn validate_probe(&self, probe: &[Value]) -> CoreResult<()> {
        if probe.len() > self.parts.len() {
            return Err(CoreError::invalid_key(format!(
                "probe has {} part(s), key definition has {}",
                probe.len(),
                self.parts.len()
            )));
        }
        for (part, value) in self.parts.iter().zip(probe) {
            if !part.field_type.matches(value) {
                return Err(CoreError::invalid_key(format!(
                    "probe part for field {} is {value}, expected {:?}",
                    part.field_no, part.field_type
                )));
            }
        }
        Ok(())
    }
}

/// A key extracted from a tuple.
///
/// Keys order lexicographically part by part using the value ordering from
/// the codec. Entry keys always carry the full part count of their
/// definition; probes may be shorter, which is what
/// [`Key::cmp_prefix`] exists for.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(pub Vec<Value>);

impl Key {
    /// Returns the key parts.
    #[must_use]
    pub fn parts(&self) -> &[Value] {
        &self.0
    }

    /// Compares only the first `probe.len()` parts of this key against the
    /// probe.
    ///
    /// This is the comparison range and equality iterators use: a partial
    /// probe matches every entry key sharing its prefix.
    #[must_use]
    pub fn cmp_prefix(&self, probe: &[Value]) -> Ordering {
        for (own, other) in self.0.iter().zip(probe) {
            match own.cmp(other) {
                Ordering::Equal => {}
                other_ord => return other_ord,
            }
        }
        // Entry keys are at least as long as any valid probe.
        Ordering::Equal
    }

    /// Returns the approximate encoded size of the key in bytes.
    #[must_use]
    pub fn bsize(&self) -> usize {
        self.0
            .iter()
            .map(|v| match v {
                Value::Unsigned(_) => 9,
                Value::Str(s) => 1 + s.len(),
                Value::Bytes(b) => 1 + b.len(),
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(values: &[Value]) -> TupleRef {
        TupleRef::from_values(values).unwrap()
    }

    #[test]
    fn extract_single_part() {
        let def = KeyDef::single(0, FieldType::Unsigned);
        let t = tuple(&[Value::Unsigned(7), Value::from("x")]);
        assert_eq!(def.extract(&t).unwrap(), Key(vec![Value::Unsigned(7)]));
    }

    #[test]
    fn extract_composite_key() {
        let def = KeyDef::new(vec![
            KeyPart::new(1, FieldType::Str),
            KeyPart::new(0, FieldType::Unsigned),
        ]);
        let t = tuple(&[Value::Unsigned(7), Value::from("x")]);
        let key = def.extract(&t).unwrap();
        assert_eq!(key.parts(), &[Value::from("x"), Value::Unsigned(7)]);
    }

    #[test]
    fn extract_missing_field_fails() {
        let def = KeyDef::single(3, FieldType::Unsigned);
        let t = tuple(&[Value::Unsigned(7)]);
        assert!(matches!(
            def.extract(&t),
            Err(CoreError::InvalidKey { .. })
        ));
    }

    #[test]
    fn extract_type_mismatch_fails() {
        let def = KeyDef::single(0, FieldType::Str);
        let t = tuple(&[Value::Unsigned(7)]);
        assert!(def.extract(&t).is_err());
    }

    #[test]
    fn probe_arity_checked() {
        let def = KeyDef::single(0, FieldType::Unsigned);
        assert!(def.validate_probe(&[]).is_ok());
        assert!(def.validate_probe(&[Value::Unsigned(1)]).is_ok());
        assert!(def
            .validate_probe(&[Value::Unsigned(1), Value::Unsigned(2)])
            .is_err());
    }

    #[test]
    fn prefix_comparison() {
        let key = Key(vec![Value::from("b"), Value::Unsigned(5)]);
        assert_eq!(key.cmp_prefix(&[Value::from("b")]), Ordering::Equal);
        assert_eq!(key.cmp_prefix(&[Value::from("a")]), Ordering::Greater);
        assert_eq!(
            key.cmp_prefix(&[Value::from("b"), Value::Unsigned(9)]),
            Ordering::Less
        );
    }

    #[test]
    fn full_key_ordering_is_lexicographic() {
        let a = Key(vec![Value::Unsigned(1), Value::Unsigned(9)]);
        let b = Key(vec![Value::Unsigned(2), Value::Unsigned(0)]);
        assert!(a < b);
    }
}
