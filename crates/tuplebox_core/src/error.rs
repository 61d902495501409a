//! Error types for tuplebox core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in tuplebox core operations.
///
/// The taxonomy mirrors what the bridge layer exposes to its caller:
/// not-found and unsupported conditions are recoverable, staleness asks the
/// caller to re-open its iterator, and resource exhaustion is fatal to the
/// current operation but propagated rather than retried. Reference-count
/// underflow has no variant here: tuple handles pair retain and release
/// through ownership, so the violation is unrepresentable in safe code.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Space identifier did not resolve.
    #[error("space not found: {id}")]
    SpaceNotFound {
        /// The unresolved space ID.
        id: u32,
    },

    /// Index identifier did not resolve within a space.
    #[error("index not found: {index} in space {space}")]
    IndexNotFound {
        /// The space that was searched.
        space: u32,
        /// The unresolved index ID.
        index: u32,
    },

    /// Operation is not valid for this index or iterator variant.
    #[error("unsupported: {message}")]
    Unsupported {
        /// Description of the misuse.
        message: String,
    },

    /// An iterator observed a structural change it cannot reconcile.
    #[error("iterator is stale: bound to {bound}, index is at {current}")]
    StaleIterator {
        /// Generation the iterator was bound to.
        bound: u64,
        /// Generation the index has reached.
        current: u64,
    },

    /// Buffer growth or allocation failed.
    #[error("resource exhausted: could not reserve {requested} byte(s)")]
    ResourceExhausted {
        /// Number of bytes that could not be obtained.
        requested: usize,
    },

    /// Unique index already holds an entry for the key.
    #[error("duplicate key in unique index {index} of space {space}")]
    DuplicateKey {
        /// The space where the conflict occurred.
        space: u32,
        /// The conflicting index.
        index: u32,
    },

    /// A search key did not match the index key definition.
    #[error("invalid key: {message}")]
    InvalidKey {
        /// Description of the mismatch.
        message: String,
    },

    /// An update operation could not be applied.
    #[error("update failed: {message}")]
    UpdateFailed {
        /// Description of the failure.
        message: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },

    /// Tuple or key bytes failed to decode.
    #[error("codec error: {0}")]
    Codec(#[from] tuplebox_codec::CodecError),
}

impl CoreError {
    /// Creates an unsupported-operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Creates an invalid-key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates an update-failed error.
    pub fn update_failed(message: impl Into<String>) -> Self {
        Self::UpdateFailed {
            message: message.into(),
        }
    }

    /// Creates an invalid-operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true if the error is recoverable by the caller.
    ///
    /// Resource exhaustion is the only class treated as fatal to the
    /// operation that hit it.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ResourceExhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = CoreError::SpaceNotFound { id: 3 };
        assert_eq!(err.to_string(), "space not found: 3");

        let err = CoreError::StaleIterator {
            bound: 1,
            current: 2,
        };
        assert!(err.to_string().contains("stale"));
    }

    #[test]
    fn recoverability() {
        assert!(CoreError::unsupported("x").is_recoverable());
        assert!(!CoreError::ResourceExhausted { requested: 16 }.is_recoverable());
    }
}
