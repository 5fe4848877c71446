//! Error type shared by every engine and scheme.

use thiserror::Error;

/// Errors reported by the arithmetic engines and the schemes built on them.
///
/// All of them are recoverable: nothing in this library clamps an
/// out-of-range value or substitutes a default instead of reporting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("coordinate of the input exceeds the configured bound")]
    BoundViolation,

    #[error("malformed secret key")]
    MalformedSecKey,

    #[error("malformed public key")]
    MalformedPubKey,

    #[error("malformed derived key")]
    MalformedDecKey,

    #[error("malformed ciphertext")]
    MalformedCipher,

    #[error("cannot parse boolean expression: {0}")]
    Parse(String),

    #[error("attribute {0} appears more than once in the policy")]
    RepeatedAttribute(String),

    #[error("linear system has no solution")]
    InconsistentSystem,

    #[error("attributes do not satisfy the policy")]
    InsufficientAttributes,

    #[error("discrete logarithm not found within the bound")]
    NotFound,

    #[error("element is not invertible modulo the modulus")]
    NotInvertible,

    #[error("cannot encode group element: {0}")]
    Serialization(String),

    #[error("parameter generation failed: {0}")]
    ParameterGeneration(String),
}

/// Result type for every fallible operation of the library.
pub type Result<T> = std::result::Result<T, FeError>;

/// Build a [`FeError::MalformedInput`] with format string support.
macro_rules! malformed {
    ($($arg:tt)*) => {
        $crate::error::FeError::MalformedInput(format!($($arg)*))
    };
}

pub(crate) use malformed;
