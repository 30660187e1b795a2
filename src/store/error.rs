//! Store error types.
//!
//! The distinction that matters to callers is whether an outcome is known:
//!
//! - **Timeout**: the deadline elapsed before a reply arrived. The store may
//!   have committed the call. Retrying is only safe for idempotent operations
//!   (which `increment_once` is, through its dedup key).
//! - **Unavailable**: the call was never executed.
//! - **WrongType** / **InvalidValue**: the call was rejected without effect.

use std::fmt;
use thiserror::Error;

/// The kind of store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Deadline elapsed; the effect of the call is unknown.
    Timeout,

    /// The store could not be reached or refused the call.
    Unavailable,

    /// The key holds a value of a different kind (text vs. ranked set).
    WrongType,

    /// An argument the store cannot represent (non-finite score, TTL out of range).
    InvalidValue,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StoreErrorKind::Timeout => "deadline elapsed, outcome unknown",
            StoreErrorKind::Unavailable => "store unavailable",
            StoreErrorKind::WrongType => "key holds a value of the wrong type",
            StoreErrorKind::InvalidValue => "invalid value",
        };
        f.write_str(text)
    }
}

/// A failed store round trip, with the operation and key it concerned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("store {op} on `{key}` failed: {kind}")]
pub struct StoreError {
    /// Name of the store operation, e.g. `INCREMENT_ONCE`.
    pub op: &'static str,

    /// The primary key the operation targeted.
    pub key: String,

    pub kind: StoreErrorKind,
}

impl StoreError {
    pub fn new(op: &'static str, key: impl Into<String>, kind: StoreErrorKind) -> Self {
        StoreError {
            op,
            key: key.into(),
            kind,
        }
    }

    /// Returns true if the call may have been applied despite the error.
    pub fn is_ambiguous(&self) -> bool {
        self.kind == StoreErrorKind::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_operation_and_key() {
        let err = StoreError::new("REV_RANGE", "lb:distance:daily:2025-09-09", StoreErrorKind::Unavailable);
        assert_eq!(
            err.to_string(),
            "store REV_RANGE on `lb:distance:daily:2025-09-09` failed: store unavailable"
        );
    }

    #[test]
    fn timeout_is_the_only_ambiguous_kind() {
        for kind in [
            StoreErrorKind::Unavailable,
            StoreErrorKind::WrongType,
            StoreErrorKind::InvalidValue,
        ] {
            assert!(!StoreError::new("GET", "k", kind).is_ambiguous());
        }
        assert!(StoreError::new("GET", "k", StoreErrorKind::Timeout).is_ambiguous());
    }
}
