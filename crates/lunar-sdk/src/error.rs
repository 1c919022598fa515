//! Error types for the marshaling layer

use lunar_engine::EngineError;

/// Result type for conversions and stack access
pub type MarshalResult<T> = Result<T, MarshalError>;

/// Marshaling error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum MarshalError {
    /// Runtime value at `index` is not compatible with the requested host type
    #[error("value at index {index} is {actual}, expected {expected}")]
    TypeMismatch {
        /// Positive stack index of the offending slot
        index: i32,
        /// Runtime type name found in the slot
        actual: &'static str,
        /// Host type name that was requested
        expected: &'static str,
    },

    /// Host value has no runtime representation
    #[error("unrepresentable value: {0}")]
    Unrepresentable(String),

    /// Runtime primitive failed (e.g. stack overflow)
    #[error(transparent)]
    Engine(#[from] EngineError),
}
