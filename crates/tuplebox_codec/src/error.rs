//! Error types for the tuple codec.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding tuples.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended before a complete item could be read.
    #[error("truncated input: needed {needed} more byte(s) at offset {offset}")]
    Truncated {
        /// Offset at which the shortfall was detected.
        offset: usize,
        /// Number of additional bytes required.
        needed: usize,
    },

    /// A varint ran past its maximum encoded length.
    #[error("varint overflow at offset {offset}")]
    VarintOverflow {
        /// Offset of the first varint byte.
        offset: usize,
    },

    /// A string field contained invalid UTF-8.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    /// Unknown value tag byte.
    #[error("unknown value tag: {tag}")]
    UnknownTag {
        /// The unrecognized tag byte.
        tag: u8,
    },

    /// A field payload had the wrong length for its tag.
    #[error("invalid field payload: {message}")]
    InvalidField {
        /// Description of the problem.
        message: String,
    },

    /// Input contained bytes past the end of the encoded item.
    #[error("trailing bytes after encoded item: {remaining} byte(s)")]
    TrailingBytes {
        /// Number of unconsumed bytes.
        remaining: usize,
    },
}

impl CodecError {
    /// Creates a truncated-input error.
    pub fn truncated(offset: usize, needed: usize) -> Self {
        Self::Truncated { offset, needed }
    }

    /// Creates an invalid-field error.
    pub fn invalid_field(message: impl Into<String>) -> Self {
        Self::InvalidField {
            message: message.into(),
        }
    }
}
