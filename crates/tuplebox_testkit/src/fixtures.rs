//! Test fixtures and space helpers.
//!
//! Provides convenience builders for the space shape most tests want: a
//! unique tree primary over an unsigned ID, a hash secondary over a
//! string name, and a bitset secondary over an unsigned flag mask.

use std::rc::Rc;
use tuplebox_codec::Value;
use tuplebox_core::{
    FieldType, IndexId, IndexKind, IndexSpec, KeyDef, Registry, Space, SpaceId, TupleRef,
};

/// Space ID the fixtures register under.
pub const FIXTURE_SPACE: SpaceId = SpaceId::new(512);

/// A registry with one fully indexed space, ready for population.
pub struct TestSpace {
    /// The registry holding the space.
    pub registry: Rc<Registry>,
    /// The space itself.
    pub space: Rc<Space>,
}

impl TestSpace {
    /// Creates the standard three-index test space.
    ///
    /// Index 0: unique tree over field 0 (unsigned ID). Index 1: hash
    /// over field 1 (string name). Index 2: bitset over field 2
    /// (unsigned flag mask).
    pub fn new() -> Self {
        let registry = Rc::new(Registry::new());
        let space = registry
            .create_space(FIXTURE_SPACE, "fixture")
            .expect("fresh registry accepts the fixture space");
        space
            .create_index(
                IndexSpec::new(
                    FIXTURE_SPACE,
                    IndexId::new(0),
                    "primary",
                    IndexKind::Tree,
                    KeyDef::single(0, FieldType::Unsigned),
                )
                .unique(),
            )
            .expect("primary spec is valid");
        space
            .create_index(IndexSpec::new(
                FIXTURE_SPACE,
                IndexId::new(1),
                "by_name",
                IndexKind::Hash,
                KeyDef::single(1, FieldType::Str),
            ))
            .expect("hash secondary spec is valid");
        space
            .create_index(IndexSpec::new(
                FIXTURE_SPACE,
                IndexId::new(2),
                "by_flags",
                IndexKind::Bitset,
                KeyDef::single(2, FieldType::Unsigned),
            ))
            .expect("bitset secondary spec is valid");
        Self { registry, space }
    }

    /// Inserts `count` rows with IDs `0..count`, names `row-<id>`, and
    /// flag mask `id % 8`.
    pub fn populate(&self, count: u64) {
        for id in 0..count {
            self.space
                .insert(row(id, &format!("row-{id}"), id % 8))
                .expect("fixture rows are unique");
        }
    }
}

impl Default for TestSpace {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the standard three-field test tuple.
pub fn row(id: u64, name: &str, flags: u64) -> TupleRef {
    TupleRef::from_values(&[
        Value::Unsigned(id),
        Value::from(name),
        Value::Unsigned(flags),
    ])
    .expect("fixture values always encode")
}

/// Creates a populated test space in one step.
pub fn populated_space(count: u64) -> TestSpace {
    let fixture = TestSpace::new();
    fixture.populate(count);
    fixture
}

/// Decodes the ID field of a fixture row.
pub fn row_id(tuple: &TupleRef) -> u64 {
    tuple
        .decode()
        .expect("fixture tuples decode")
        .first()
        .and_then(Value::as_unsigned)
        .expect("fixture tuples start with an unsigned ID")
}
