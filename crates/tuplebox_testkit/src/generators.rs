//! Property-based test generators using proptest.

use proptest::collection::vec;
use proptest::prelude::*;
use tuplebox_codec::Value;
use tuplebox_core::{FieldType, KeyDef, KeyPart, TupleRef};

/// Strategy for an arbitrary field value.
pub fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<u64>().prop_map(Value::Unsigned),
        ".{0,24}".prop_map(Value::Str),
        vec(any::<u8>(), 0..24).prop_map(Value::Bytes),
    ]
}

/// Strategy for a field list of up to `max_fields` values.
pub fn arb_fields(max_fields: usize) -> impl Strategy<Value = Vec<Value>> {
    vec(arb_value(), 0..=max_fields)
}

/// Strategy for an encodable tuple of up to `max_fields` values.
pub fn arb_tuple(max_fields: usize) -> impl Strategy<Value = TupleRef> {
    arb_fields(max_fields).prop_map(|values| {
        TupleRef::from_values(&values).expect("generated values always encode")
    })
}

/// Strategy for a key definition over the first `field_count` fields.
pub fn arb_key_def(field_count: u32) -> impl Strategy<Value = KeyDef> {
    let part = (0..field_count, arb_field_type())
        .prop_map(|(field_no, field_type)| KeyPart::new(field_no, field_type));
    vec(part, 1..=field_count as usize).prop_map(KeyDef::new)
}

fn arb_field_type() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::Unsigned),
        Just(FieldType::Str),
        Just(FieldType::Bytes),
    ]
}
