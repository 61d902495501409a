//! Stable result codes for embedders.

use tuplebox_core::CoreError;

/// Result code exposed at the bridge boundary.
///
/// Codes are stable across releases; embedders that cannot carry a Rust
/// error type across their boundary switch on these instead.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeResult {
    /// Operation succeeded.
    Ok = 0,
    /// Generic error.
    Error = 1,
    /// Invalid argument.
    InvalidArgument = 2,
    /// Space, index, or entry not found.
    NotFound = 3,
    /// Unique-key conflict.
    Conflict = 4,
    /// Operation not valid for this index or iterator variant.
    Unsupported = 5,
    /// Iterator went stale; re-open it.
    Stale = 6,
    /// Allocation or buffer growth failed.
    ResourceExhausted = 7,
    /// Tuple or key bytes failed to decode.
    CodecError = 8,
}

impl BridgeResult {
    /// Returns true if the result indicates success.
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == BridgeResult::Ok
    }

    /// Returns true if the result indicates an error.
    #[must_use]
    pub fn is_err(self) -> bool {
        self != BridgeResult::Ok
    }
}

impl From<&CoreError> for BridgeResult {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::SpaceNotFound { .. } | CoreError::IndexNotFound { .. } => {
                BridgeResult::NotFound
            }
            CoreError::Unsupported { .. } => BridgeResult::Unsupported,
            CoreError::StaleIterator { .. } => BridgeResult::Stale,
            CoreError::ResourceExhausted { .. } => BridgeResult::ResourceExhausted,
            CoreError::DuplicateKey { .. } => BridgeResult::Conflict,
            CoreError::InvalidKey { .. }
            | CoreError::UpdateFailed { .. }
            | CoreError::InvalidOperation { .. } => BridgeResult::InvalidArgument,
            CoreError::Codec(_) => BridgeResult::CodecError,
        }
    }
}

/// Numeric code type for embedders.
pub type ErrorCode = i32;

impl From<BridgeResult> for ErrorCode {
    fn from(result: BridgeResult) -> Self {
        result as ErrorCode
    }
}

impl From<ErrorCode> for BridgeResult {
    fn from(code: ErrorCode) -> Self {
        match code {
            0 => BridgeResult::Ok,
            2 => BridgeResult::InvalidArgument,
            3 => BridgeResult::NotFound,
            4 => BridgeResult::Conflict,
            5 => BridgeResult::Unsupported,
            6 => BridgeResult::Stale,
            7 => BridgeResult::ResourceExhausted,
            8 => BridgeResult::CodecError,
            _ => BridgeResult::Error,
        }
    }
}

/// Maps an operation outcome to its result code.
pub fn code_of<T>(result: &Result<T, CoreError>) -> BridgeResult {
    match result {
        Ok(_) => BridgeResult::Ok,
        Err(err) => BridgeResult::from(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(BridgeResult::Ok as i32, 0);
        assert_eq!(BridgeResult::Stale as i32, 6);
        assert!(BridgeResult::Ok.is_ok());
        assert!(BridgeResult::Stale.is_err());
    }

    #[test]
    fn code_roundtrip() {
        let code: ErrorCode = BridgeResult::NotFound.into();
        assert_eq!(code, 3);
        assert_eq!(BridgeResult::from(code), BridgeResult::NotFound);
        assert_eq!(BridgeResult::from(99), BridgeResult::Error);
    }

    #[test]
    fn error_mapping() {
        let err = CoreError::SpaceNotFound { id: 1 };
        assert_eq!(BridgeResult::from(&err), BridgeResult::NotFound);

        let err = CoreError::StaleIterator {
            bound: 1,
            current: 2,
        };
        assert_eq!(BridgeResult::from(&err), BridgeResult::Stale);

        let err = CoreError::DuplicateKey { space: 1, index: 0 };
        assert_eq!(BridgeResult::from(&err), BridgeResult::Conflict);
    }

    #[test]
    fn code_of_outcomes() {
        assert_eq!(code_of(&Ok::<_, CoreError>(5)), BridgeResult::Ok);
        assert_eq!(
            code_of(&Err::<u32, _>(CoreError::unsupported("x"))),
            BridgeResult::Unsupported
        );
    }
}
