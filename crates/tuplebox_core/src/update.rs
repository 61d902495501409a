//! Field-level update operations.
//!
//! An update is a sequence of operations applied in order to the decoded
//! fields of a tuple, producing the field list for a replacement tuple.
//! Application is all-or-nothing: any failing operation aborts the whole
//! update before a new tuple is built.

use crate::error::{CoreError, CoreResult};
use tuplebox_codec::Value;

/// One update operation addressing a field by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOp {
    /// Overwrite the field with a new value.
    Assign {
        /// Field position.
        field: u32,
        /// Replacement value.
        value: Value,
    },
    /// Insert a new field before the position, shifting later fields.
    Insert {
        /// Position the new field takes.
        field: u32,
        /// Value of the new field.
        value: Value,
    },
    /// Remove the field, shifting later fields down.
    Delete {
        /// Field position.
        field: u32,
    },
    /// Add a delta to an unsigned field.
    Add {
        /// Field position.
        field: u32,
        /// Amount to add.
        delta: u64,
    },
}

impl UpdateOp {
    /// Shorthand for an assignment.
    #[must_use]
    pub fn assign(field: u32, value: impl Into<Value>) -> Self {
        Self::Assign {
            field,
            value: value.into(),
        }
    }

    /// Shorthand for an insertion.
    #[must_use]
    pub fn insert(field: u32, value: impl Into<Value>) -> Self {
        Self::Insert {
            field,
            value: value.into(),
        }
    }

    /// Shorthand for a deletion.
    #[must_use]
    pub const fn delete(field: u32) -> Self {
        Self::Delete { field }
    }

    /// Shorthand for an addition.
    #[must_use]
    pub const fn add(field: u32, delta: u64) -> Self {
        Self::Add { field, delta }
    }
}

/// Applies update operations to a field list.
///
/// # Errors
///
/// Reports an update failure for out-of-range field positions, additions
/// to non-unsigned fields, and arithmetic overflow. No partial result is
/// ever returned.
pub fn apply(ops: &[UpdateOp], fields: &[Value]) -> CoreResult<Vec<Value>> {
    let mut out = fields.to_vec();
    for op in ops {
        match op {
            UpdateOp::Assign { field, value } => {
                let slot = existing_field(&mut out, *field)?;
                *slot = value.clone();
            }
            UpdateOp::Insert { field, value } => {
                let at = *field as usize;
                if at > out.len() {
                    return Err(out_of_range(*field, out.len()));
                }
                out.insert(at, value.clone());
            }
            UpdateOp::Delete { field } => {
                let at = *field as usize;
                if at >= out.len() {
                    return Err(out_of_range(*field, out.len()));
                }
                out.remove(at);
            }
            UpdateOp::Add { field, delta } => {
                let slot = existing_field(&mut out, *field)?;
                let Value::Unsigned(current) = slot else {
                    return Err(CoreError::update_failed(format!(
                        "field {field} is {slot}, add requires an unsigned field"
                    )));
                };
                *current = current.checked_add(*delta).ok_or_else(|| {
                    CoreError::update_failed(format!(
                        "adding {delta} to field {field} overflows"
                    ))
                })?;
            }
        }
    }
    Ok(out)
}

fn existing_field(fields: &mut [Value], field: u32) -> CoreResult<&mut Value> {
    let len = fields.len();
    fields
        .get_mut(field as usize)
        .ok_or_else(|| out_of_range(field, len))
}

fn out_of_range(field: u32, len: usize) -> CoreError {
    CoreError::update_failed(format!(
        "field {field} is out of range for a tuple of {len} field(s)"
    ))
}
