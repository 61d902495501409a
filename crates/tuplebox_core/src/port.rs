//! Result ports: ordered batches of retained tuples.
//!
//! A port accumulates query results and hands them off as one unit.
//! Every tuple in a port is retained by it; dropping the port releases
//! them all, and transferring a port moves the retentions to the
//! destination without touching any reference count.

use crate::tuple::TupleRef;

/// An ordered collection of retained result tuples.
#[derive(Debug, Default)]
pub struct Port {
    refs: Vec<TupleRef>,
}

impl Port {
    /// Creates an empty port.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a tuple, taking over its retention.
    pub fn append(&mut self, tuple: TupleRef) {
        self.refs.push(tuple);
    }

    /// Returns the number of tuples held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Returns true if the port holds no tuples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Moves every tuple into `dest`, preserving order.
    ///
    /// The source is left empty and reusable.
    pub fn transfer(&mut self, dest: &mut Port) {
        dest.refs.append(&mut self.refs);
    }

    /// Iterates over the held tuples in append order.
    pub fn iter(&self) -> impl Iterator<Item = &TupleRef> {
        self.refs.iter()
    }
}

impl IntoIterator for Port {
    type Item = TupleRef;
    type IntoIter = std::vec::IntoIter<TupleRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.refs.into_iter()
    }
}
