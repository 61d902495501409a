//! Bounded select semantics through the bridge.

use std::rc::Rc;
use tuplebox_bridge::{Bridge, IteratorType};
use tuplebox_codec::{encode_key, Value};
use tuplebox_core::IndexId;
use tuplebox_testkit::prelude::*;

fn bridge_over(fixture: &TestSpace) -> Bridge {
    Bridge::new(Rc::clone(&fixture.registry))
}

fn ids(port: tuplebox_bridge::Port) -> Vec<u64> {
    port.into_iter().map(|t| row_id(&t)).collect()
}

#[test]
fn limit_and_offset_apply_after_matching() {
    // Four rows in key order; skip one, take three.
    let fixture = populated_space(4);
    let bridge = bridge_over(&fixture);

    let port = bridge
        .select(
            FIXTURE_SPACE,
            IndexId::new(0),
            IteratorType::All,
            &encode_key(&[]),
            3,
            1,
        )
        .unwrap();
    assert_eq!(ids(port), [1, 2, 3]);
}

#[test]
fn limit_zero_yields_empty_port() {
    let fixture = populated_space(4);
    let bridge = bridge_over(&fixture);

    let port = bridge
        .select(
            FIXTURE_SPACE,
            IndexId::new(0),
            IteratorType::All,
            &encode_key(&[]),
            0,
            0,
        )
        .unwrap();
    assert!(port.is_empty());
}

#[test]
fn offset_past_end_yields_empty_port() {
    let fixture = populated_space(2);
    let bridge = bridge_over(&fixture);

    let port = bridge
        .select(
            FIXTURE_SPACE,
            IndexId::new(0),
            IteratorType::All,
            &encode_key(&[]),
            10,
            5,
        )
        .unwrap();
    assert!(port.is_empty());
}

#[test]
fn range_select_over_probe() {
    let fixture = populated_space(8);
    let bridge = bridge_over(&fixture);

    let port = bridge
        .select(
            FIXTURE_SPACE,
            IndexId::new(0),
            IteratorType::Ge,
            &encode_key(&[Value::Unsigned(5)]),
            10,
            0,
        )
        .unwrap();
    assert_eq!(ids(port), [5, 6, 7]);

    let port = bridge
        .select(
            FIXTURE_SPACE,
            IndexId::new(0),
            IteratorType::Lt,
            &encode_key(&[Value::Unsigned(3)]),
            10,
            0,
        )
        .unwrap();
    assert_eq!(ids(port), [2, 1, 0]);
}

#[test]
fn select_on_secondary_hash_index() {
    let fixture = populated_space(4);
    let bridge = bridge_over(&fixture);

    let port = bridge
        .select(
            FIXTURE_SPACE,
            IndexId::new(1),
            IteratorType::Eq,
            &encode_key(&[Value::from("row-2")]),
            10,
            0,
        )
        .unwrap();
    assert_eq!(ids(port), [2]);
}

#[test]
fn select_on_bitset_index() {
    // Flag masks are id % 8, so AllSet(0b100) matches ids 4..8 with that bit.
    let fixture = populated_space(8);
    let bridge = bridge_over(&fixture);

    let port = bridge
        .select(
            FIXTURE_SPACE,
            IndexId::new(2),
            IteratorType::BitsAllSet,
            &encode_key(&[Value::Unsigned(0b100)]),
            10,
            0,
        )
        .unwrap();
    assert_eq!(ids(port), [4, 5, 6, 7]);
}

#[test]
fn select_results_are_retained() {
    let fixture = populated_space(1);
    let bridge = bridge_over(&fixture);

    let port = bridge
        .select(
            FIXTURE_SPACE,
            IndexId::new(0),
            IteratorType::All,
            &encode_key(&[]),
            1,
            0,
        )
        .unwrap();
    let tuple = port.into_iter().next().unwrap();
    // Three indexes plus the handle we now hold.
    assert!(tuple.ref_count() >= 4);
}
