//! Stateful field cursor over a single tuple.

use crate::tuple::TupleRef;

/// A cursor over the fields of one tuple.
///
/// The cursor retains the tuple for its own lifetime, so it stays valid
/// even if every other handle is dropped mid-traversal. State lives in the
/// cursor, not the tuple: concurrent cursors over the same tuple never
/// interfere.
pub struct FieldCursor {
    tuple: TupleRef,
    position: u32,
}

impl FieldCursor {
    /// Opens a cursor positioned before the first field.
    #[must_use]
    pub fn new(tuple: &TupleRef) -> Self {
        Self {
            tuple: tuple.retain(),
            position: 0,
        }
    }

    /// Resets the cursor to the first field.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Positions the cursor at `position`.
    ///
    /// Seeking past the end is allowed; the following `next` simply
    /// reports the end of the tuple.
    pub fn seek(&mut self, position: u32) {
        self.position = position;
    }

    /// Returns the field at the cursor and advances past it.
    ///
    /// Returns `None` once the fields are exhausted; that is an end
    /// marker, not a fault, and further calls keep returning `None`.
    pub fn next(&mut self) -> Option<&[u8]> {
        if self.position >= self.tuple.field_count() {
            return None;
        }
        let position = self.position;
        self.position += 1;
        self.tuple.field(position)
    }

    /// Returns the position of the field `next` would yield.
    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuplebox_codec::{decode_value, Value};

    fn three_field_tuple() -> TupleRef {
        TupleRef::from_values(&[
            Value::Unsigned(1),
            Value::Unsigned(2),
            Value::Unsigned(3),
        ])
        .unwrap()
    }

    fn unsigned(span: &[u8]) -> u64 {
        decode_value(span).unwrap().as_unsigned().unwrap()
    }

    #[test]
    fn walks_fields_in_order() {
        let t = three_field_tuple();
        let mut cursor = t.cursor();
        assert_eq!(unsigned(cursor.next().unwrap()), 1);
        assert_eq!(unsigned(cursor.next().unwrap()), 2);
        assert_eq!(unsigned(cursor.next().unwrap()), 3);
        assert!(cursor.next().is_none());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn rewind_restarts() {
        let t = three_field_tuple();
        let mut cursor = t.cursor();
        cursor.next();
        cursor.next();
        cursor.rewind();
        assert_eq!(unsigned(cursor.next().unwrap()), 1);
    }

    #[test]
    fn seek_repositions() {
        let t = three_field_tuple();
        let mut cursor = t.cursor();
        cursor.seek(2);
        assert_eq!(unsigned(cursor.next().unwrap()), 3);
        assert!(cursor.next().is_none());

        cursor.seek(100);
        assert!(cursor.next().is_none());
    }

    #[test]
    fn concurrent_cursors_are_independent() {
        let t = three_field_tuple();
        let mut a = t.cursor();
        let mut b = t.cursor();

        assert_eq!(unsigned(a.next().unwrap()), 1);
        assert_eq!(unsigned(a.next().unwrap()), 2);
        assert_eq!(unsigned(b.next().unwrap()), 1);
        assert_eq!(a.position(), 2);
        assert_eq!(b.position(), 1);
    }

    #[test]
    fn cursor_keeps_tuple_alive() {
        let t = three_field_tuple();
        let mut cursor = t.cursor();
        drop(t);
        assert_eq!(unsigned(cursor.next().unwrap()), 1);
    }
}
