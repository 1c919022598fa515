//! Callable values
//!
//! Every callable in the runtime is a host closure operating on the value
//! stack. While it runs, the callee's frame starts at stack index 1 (its
//! first argument) and it reports how many values it left on top as
//! results.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::error::EngineResult;
use crate::state::State;

/// Native function body.
///
/// Returns the number of values it pushed as results.
pub type NativeFn = dyn Fn(&mut State) -> EngineResult<usize>;

/// Declared parameter types of a wrapped host function.
///
/// Captured once when the function is wrapped, never re-derived per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<&'static str>,
}

impl Signature {
    /// Create a signature from parameter type names
    pub fn new(params: Vec<&'static str>) -> Self {
        Self { params }
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Expected type name of the parameter at 0-based `position`
    pub fn param(&self, position: usize) -> Option<&'static str> {
        self.params.get(position).copied()
    }

    /// All declared parameter type names
    pub fn params(&self) -> &[&'static str] {
        &self.params
    }
}

struct FunctionInner {
    signature: Option<Signature>,
    body: Box<NativeFn>,
}

/// Shared handle to a callable.
///
/// Equality and hashing use identity.
#[derive(Clone)]
pub struct Function(Rc<FunctionInner>);

impl Function {
    /// Wrap a closure with no declared signature
    pub fn new(body: impl Fn(&mut State) -> EngineResult<usize> + 'static) -> Self {
        Function(Rc::new(FunctionInner {
            signature: None,
            body: Box::new(body),
        }))
    }

    /// Wrap a closure together with its declared signature
    pub fn with_signature(
        signature: Signature,
        body: impl Fn(&mut State) -> EngineResult<usize> + 'static,
    ) -> Self {
        Function(Rc::new(FunctionInner {
            signature: Some(signature),
            body: Box::new(body),
        }))
    }

    /// Declared signature, if the function was wrapped with one
    pub fn signature(&self) -> Option<&Signature> {
        self.0.signature.as_ref()
    }

    /// Run the body against the current frame
    pub(crate) fn invoke(&self, state: &mut State) -> EngineResult<usize> {
        (self.0.body)(state)
    }

    /// Raw pointer, for identity display
    pub fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Function {}

impl Hash for Function {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_ptr().hash(state);
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("ptr", &self.as_ptr())
            .field("signature", &self.0.signature)
            .finish()
    }
}
