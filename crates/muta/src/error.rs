//! Error types for overlay operations.

use muta_pointer::PointerError;
use thiserror::Error;

/// Result type alias for overlay operations.
pub type Result<T> = std::result::Result<T, MutaError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutaError {
    /// The argument is not a live overlay view.
    #[error("Argument must be a muta wrapped object")]
    InvalidArgument,

    /// Leaves cannot be wrapped at the root.
    #[error("cannot wrap a {kind} value; expected a mapping, sequence or callable")]
    Unwrappable { kind: &'static str },

    /// Only callables inherit properties.
    #[error("cannot inherit properties into a {kind} value; expected a callable")]
    NotCallable { kind: &'static str },

    #[error("invalid pointer: {0}")]
    Pointer(#[from] PointerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_message() {
        assert_eq!(
            MutaError::InvalidArgument.to_string(),
            "Argument must be a muta wrapped object"
        );
    }

    #[test]
    fn pointer_errors_convert() {
        let err: MutaError = PointerError::PointerInvalid.into();
        assert_eq!(err.to_string(), "invalid pointer: POINTER_INVALID");
    }
}
