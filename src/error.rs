//! Engine-level error taxonomy.
//!
//! Three kinds of failure reach a caller:
//!
//! - **Validation** errors are the caller's fault and are never retried.
//! - **Store** errors carry the operation and key that failed. A store error
//!   whose [`StoreError::is_ambiguous`] is true means the outcome is unknown:
//!   the store may or may not have committed the call.
//! - **In-flight** claims: another caller holds a reservation that has not
//!   been completed yet.
//!
//! Absent members are not errors; queries return rank `-1` or an empty list.

use thiserror::Error;

use crate::store::StoreError;

/// Rejected input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required identifier was empty or whitespace.
    #[error("{field} must not be blank")]
    Blank { field: &'static str },

    /// A numeric query parameter fell outside its allowed range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },

    /// A scope name that does not map to any ranking window.
    #[error("unknown scope `{0}` (expected all-time, weekly or daily)")]
    UnknownScope(String),

    /// A progress event that targets no scope.
    #[error("at least one scope is required")]
    NoScopes,

    /// A score delta that is zero, negative, or not finite.
    #[error("delta must be a positive finite number, got {0}")]
    InvalidDelta(f64),

    #[error("missing required header `{name}`")]
    MissingHeader { name: &'static str },
}

/// Any failure surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The claim exists but its holder has not recorded a result yet.
    #[error("claim `{key}` is still being processed")]
    ClaimInFlight { key: String },
}

impl EngineError {
    /// Returns true if the failed call may still have taken effect.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, EngineError::Store(e) if e.is_ambiguous())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
