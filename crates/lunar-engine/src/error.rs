//! Engine error types
//!
//! Every failure the runtime can raise. Inside a protected call these are
//! turned into a single error value on the stack via [`EngineError::into_value`].

use crate::value::Value;

/// Runtime error
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Value stack exceeded `max_stack_size`
    #[error("stack overflow")]
    StackOverflow,

    /// Nested calls exceeded `max_call_depth`
    #[error("call depth exceeded ({0} nested calls)")]
    CallDepthExceeded(usize),

    /// Callee is not a function
    #[error("attempt to call a {0} value")]
    NotCallable(&'static str),

    /// Index does not address a slot in the current frame
    #[error("invalid stack index {0}")]
    InvalidIndex(i32),

    /// Table key is nil or NaN
    #[error("table index is {0}")]
    InvalidKey(&'static str),

    /// Error raised with a message
    #[error("{0}")]
    Runtime(String),

    /// A native function panicked
    #[error("native function panicked: {0}")]
    Panic(String),

    /// Error raised with an arbitrary value as its payload
    #[error("{0}")]
    Thrown(Value),
}

impl EngineError {
    /// Convert into the value left on the stack by a failed protected call
    pub fn into_value(self) -> Value {
        match self {
            EngineError::Thrown(value) => value,
            other => Value::string(other.to_string()),
        }
    }
}

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::Runtime(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        EngineError::Runtime(s.to_string())
    }
}

/// Engine result type
pub type EngineResult<T> = Result<T, EngineError>;
