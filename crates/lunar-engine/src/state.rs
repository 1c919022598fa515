//! Runtime state: one value stack plus call frames
//!
//! # Memory Layout
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │ results / temporaries of callee        │  ← top
//! │ arg 2                                  │
//! │ arg 1                                  │  ← index 1 while callee runs
//! ├────────────────────────────────────────┤
//! │ callee                                 │
//! │ caller slots                           │
//! │   ...                                  │  ← index 1 for the caller
//! └────────────────────────────────────────┘
//! ```
//!
//! Positive indices count from the bottom of the current frame (1 = first
//! slot), negative indices count from the top (-1 = top). Index 0 is never
//! valid. A callee can never address or pop its caller's slots.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::defaults::INITIAL_STACK_CAPACITY;
use crate::error::{EngineError, EngineResult};
use crate::function::Function;
use crate::table::TableRef;
use crate::value::{Value, ValueType};

/// Outcome of a protected call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    /// Call completed; results are on the stack
    Ok,
    /// Call raised an error; the error value is on the stack
    RuntimeError,
    /// Stack or call depth limit was hit; the error value is on the stack
    Overflow,
    /// A native function panicked; the panic message is on the stack
    Panicked,
}

impl CallStatus {
    /// Check if the call succeeded
    #[inline]
    pub fn is_ok(self) -> bool {
        self == CallStatus::Ok
    }

    fn from_error(error: &EngineError) -> Self {
        match error {
            EngineError::StackOverflow | EngineError::CallDepthExceeded(_) => CallStatus::Overflow,
            EngineError::Panic(_) => CallStatus::Panicked,
            _ => CallStatus::RuntimeError,
        }
    }
}

/// One runtime instance and its value stack.
///
/// Not thread-safe: a state is driven by exactly one call sequence at a time.
pub struct State {
    /// Contiguous slot storage for every frame
    stack: Vec<Value>,
    /// Absolute position of the current frame's index 1
    base: usize,
    /// Current nesting of calls
    depth: usize,
    config: EngineConfig,
}

impl State {
    /// Create a state with default limits
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a state with the given limits
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            stack: Vec::with_capacity(INITIAL_STACK_CAPACITY.min(config.max_stack_size)),
            base: 0,
            depth: 0,
            config,
        }
    }

    /// Limits this state was created with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current call nesting (0 when no call is running)
    pub fn call_depth(&self) -> usize {
        self.depth
    }

    // ========================================================================
    // Depth
    // ========================================================================

    /// Number of slots in the current frame (0 = empty)
    #[inline]
    pub fn get_top(&self) -> usize {
        self.stack.len() - self.base
    }

    /// Truncate or pad (with nil) the current frame to exactly `top` slots
    pub fn set_top(&mut self, top: usize) {
        let target = self.base + top;
        if target < self.stack.len() {
            trace!(from = self.get_top(), to = top, "truncating stack");
        }
        self.stack.resize(target, Value::Nil);
    }

    /// Remove up to `n` slots from the top of the current frame
    pub fn pop(&mut self, n: usize) {
        let n = n.min(self.get_top());
        let new_len = self.stack.len() - n;
        self.stack.truncate(new_len);
    }

    /// Check that `n` more slots can be pushed
    pub fn check_stack(&self, n: usize) -> bool {
        self.stack.len() + n <= self.config.max_stack_size
    }

    // ========================================================================
    // Indexing
    // ========================================================================

    /// Resolve a relative index to an absolute position in the backing storage
    pub fn abs_index(&self, index: i32) -> Option<usize> {
        if index > 0 {
            let pos = self.base + (index as usize - 1);
            (pos < self.stack.len()).then_some(pos)
        } else if index < 0 {
            let back = index.unsigned_abs() as usize;
            (back <= self.get_top()).then(|| self.stack.len() - back)
        } else {
            None
        }
    }

    /// Convert any valid index into its positive form (1 = frame bottom)
    pub fn positive_index(&self, index: i32) -> Option<i32> {
        self.abs_index(index)
            .map(|pos| (pos - self.base + 1) as i32)
    }

    /// Check if `index` addresses a slot
    #[inline]
    pub fn is_valid(&self, index: i32) -> bool {
        self.abs_index(index).is_some()
    }

    /// Borrow the value at `index`
    pub fn value_at(&self, index: i32) -> Option<&Value> {
        self.abs_index(index).map(|pos| &self.stack[pos])
    }

    /// Dynamic type at `index`; `ValueType::None` if the index is invalid
    pub fn type_of(&self, index: i32) -> ValueType {
        self.value_at(index)
            .map_or(ValueType::None, Value::value_type)
    }

    /// Runtime type name at `index`
    #[inline]
    pub fn type_name(&self, index: i32) -> &'static str {
        self.type_of(index).name()
    }

    // ========================================================================
    // Push primitives
    // ========================================================================

    /// Push a value, failing if the stack is full
    pub fn push_value(&mut self, value: Value) -> EngineResult<()> {
        if self.stack.len() >= self.config.max_stack_size {
            return Err(EngineError::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    /// Push nil
    pub fn push_nil(&mut self) -> EngineResult<()> {
        self.push_value(Value::Nil)
    }

    /// Push a boolean
    pub fn push_boolean(&mut self, b: bool) -> EngineResult<()> {
        self.push_value(Value::Boolean(b))
    }

    /// Push an integer
    pub fn push_integer(&mut self, i: i64) -> EngineResult<()> {
        self.push_value(Value::Integer(i))
    }

    /// Push a float
    pub fn push_number(&mut self, n: f64) -> EngineResult<()> {
        self.push_value(Value::Number(n))
    }

    /// Push a copy of `s` as a string
    pub fn push_string(&mut self, s: &str) -> EngineResult<()> {
        self.push_value(Value::string(s))
    }

    /// Push a new empty table and return its handle
    pub fn push_table(&mut self) -> EngineResult<TableRef> {
        let table = TableRef::new();
        self.push_value(Value::Table(table.clone()))?;
        Ok(table)
    }

    /// Push a function
    pub fn push_function(&mut self, function: Function) -> EngineResult<()> {
        self.push_value(Value::Function(function))
    }

    /// Push a copy of the value at `index`
    pub fn push_copy(&mut self, index: i32) -> EngineResult<()> {
        let value = self
            .value_at(index)
            .cloned()
            .ok_or(EngineError::InvalidIndex(index))?;
        self.push_value(value)
    }

    // ========================================================================
    // Read primitives
    // ========================================================================

    /// Read a boolean; `None` unless the slot holds a boolean
    pub fn to_boolean(&self, index: i32) -> Option<bool> {
        self.value_at(index).and_then(Value::as_bool)
    }

    /// Read an integer; integral floats are accepted
    pub fn to_integer(&self, index: i32) -> Option<i64> {
        self.value_at(index).and_then(Value::as_integer)
    }

    /// Read a number; integers are widened
    pub fn to_number(&self, index: i32) -> Option<f64> {
        self.value_at(index).and_then(Value::as_number)
    }

    /// Borrow a string without copying
    pub fn to_str(&self, index: i32) -> Option<&str> {
        self.value_at(index).and_then(Value::as_str)
    }

    // ========================================================================
    // Rearranging
    // ========================================================================

    /// Remove the slot at `index`, shifting the slots above it down
    pub fn remove(&mut self, index: i32) -> EngineResult<Value> {
        let pos = self
            .abs_index(index)
            .ok_or(EngineError::InvalidIndex(index))?;
        Ok(self.stack.remove(pos))
    }

    /// Move the top slot into `index`, shifting the slots above it up
    pub fn insert(&mut self, index: i32) -> EngineResult<()> {
        let pos = self
            .abs_index(index)
            .ok_or(EngineError::InvalidIndex(index))?;
        if let Some(top) = self.stack.pop() {
            self.stack.insert(pos, top);
        }
        Ok(())
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Call the function sitting below the top `nargs` slots.
    ///
    /// The callee and its arguments are replaced by its results: all of them
    /// when `nresults` is `None`, otherwise exactly `nresults` (truncated or
    /// padded with nil). Errors propagate to the caller unprotected; the
    /// stack contents above the callee are unspecified after an error.
    pub fn call(&mut self, nargs: usize, nresults: Option<usize>) -> EngineResult<()> {
        if nargs >= self.get_top() {
            return Err(EngineError::NotCallable(ValueType::Nil.name()));
        }
        let func_pos = self.stack.len() - nargs - 1;
        let callee = match &self.stack[func_pos] {
            Value::Function(f) => f.clone(),
            other => return Err(EngineError::NotCallable(other.type_name())),
        };
        if self.depth >= self.config.max_call_depth {
            return Err(EngineError::CallDepthExceeded(self.depth));
        }

        let saved_base = self.base;
        self.base = func_pos + 1;
        self.depth += 1;
        trace!(nargs, depth = self.depth, "call");
        let result = callee.invoke(self);
        self.depth -= 1;
        self.base = saved_base;
        let nret = result?;

        let available = self.stack.len() - (func_pos + 1);
        if nret > available {
            return Err(EngineError::Runtime(format!(
                "function reported {} results but left {} values",
                nret, available
            )));
        }
        let results_start = self.stack.len() - nret;
        self.stack.drain(func_pos..results_start);
        if let Some(wanted) = nresults {
            let target = func_pos + wanted;
            if target > self.config.max_stack_size {
                return Err(EngineError::StackOverflow);
            }
            self.stack.resize(target, Value::Nil);
        }
        Ok(())
    }

    /// Protected form of [`State::call`].
    ///
    /// No failure escapes: errors and panics raised anywhere below this call
    /// are contained. On failure the callee, its arguments and everything it
    /// pushed are removed and exactly one error value is left on top.
    pub fn pcall(&mut self, nargs: usize, nresults: Option<usize>) -> CallStatus {
        let saved_base = self.base;
        let saved_depth = self.depth;
        let func_pos = self.stack.len().saturating_sub(nargs + 1).max(self.base);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.call(nargs, nresults)));
        let error = match outcome {
            Ok(Ok(())) => return CallStatus::Ok,
            Ok(Err(error)) => error,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(%message, "native function panicked inside protected call");
                EngineError::Panic(message)
            }
        };

        self.base = saved_base;
        self.depth = saved_depth;
        self.stack.truncate(func_pos);
        let status = CallStatus::from_error(&error);
        debug!(%error, ?status, "protected call failed");
        // The callee slot was freed above, so this cannot exceed the limit
        self.stack.push(error.into_value());
        status
    }
}

/// Extract a readable message from a panic payload
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("top", &self.get_top())
            .field("base", &self.base)
            .field("depth", &self.depth)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(state: &mut State) -> EngineResult<usize> {
        let a = state.to_integer(1).ok_or("bad arg 1")?;
        let b = state.to_integer(2).ok_or("bad arg 2")?;
        state.push_integer(a + b)?;
        Ok(1)
    }

    #[test]
    fn test_new_state() {
        let state = State::new();
        assert_eq!(state.get_top(), 0);
        assert_eq!(state.call_depth(), 0);
        assert_eq!(state.type_of(1), ValueType::None);
    }

    #[test]
    fn test_indexing() {
        let mut state = State::new();
        state.push_integer(10).unwrap();
        state.push_string("x").unwrap();
        state.push_boolean(true).unwrap();

        assert_eq!(state.to_integer(1), Some(10));
        assert_eq!(state.to_str(2), Some("x"));
        assert_eq!(state.to_boolean(3), Some(true));
        assert_eq!(state.to_boolean(-1), Some(true));
        assert_eq!(state.to_integer(-3), Some(10));
        assert!(!state.is_valid(0));
        assert!(!state.is_valid(4));
        assert!(!state.is_valid(-4));
        assert_eq!(state.positive_index(-1), Some(3));
    }

    #[test]
    fn test_set_top_pads_and_truncates() {
        let mut state = State::new();
        state.push_integer(1).unwrap();
        state.set_top(3);
        assert_eq!(state.get_top(), 3);
        assert_eq!(state.type_of(3), ValueType::Nil);

        state.set_top(0);
        assert_eq!(state.get_top(), 0);
    }

    #[test]
    fn test_remove_and_insert() {
        let mut state = State::new();
        state.push_integer(1).unwrap();
        state.push_integer(2).unwrap();
        state.push_integer(3).unwrap();

        state.insert(1).unwrap();
        assert_eq!(state.to_integer(1), Some(3));
        assert_eq!(state.to_integer(2), Some(1));

        let removed = state.remove(2).unwrap();
        assert_eq!(removed, Value::Integer(1));
        assert_eq!(state.get_top(), 2);
        assert!(state.remove(5).is_err());
    }

    #[test]
    fn test_stack_overflow() {
        let mut state = State::with_config(EngineConfig::new().max_stack_size(2));
        state.push_nil().unwrap();
        state.push_nil().unwrap();
        assert!(matches!(state.push_nil(), Err(EngineError::StackOverflow)));
        assert_eq!(state.get_top(), 2);
        assert!(!state.check_stack(1));
    }

    #[test]
    fn test_call_replaces_callee_with_results() {
        let mut state = State::new();
        state.push_string("below").unwrap();
        state.push_function(Function::new(add)).unwrap();
        state.push_integer(2).unwrap();
        state.push_integer(3).unwrap();

        state.call(2, None).unwrap();
        assert_eq!(state.get_top(), 2);
        assert_eq!(state.to_integer(-1), Some(5));
        assert_eq!(state.to_str(1), Some("below"));
    }

    #[test]
    fn test_call_adjusts_result_count() {
        let mut state = State::new();
        state.push_function(Function::new(add)).unwrap();
        state.push_integer(1).unwrap();
        state.push_integer(1).unwrap();
        state.call(2, Some(3)).unwrap();
        assert_eq!(state.get_top(), 3);
        assert_eq!(state.to_integer(1), Some(2));
        assert_eq!(state.type_of(3), ValueType::Nil);

        state.set_top(0);
        state.push_function(Function::new(add)).unwrap();
        state.push_integer(1).unwrap();
        state.push_integer(1).unwrap();
        state.call(2, Some(0)).unwrap();
        assert_eq!(state.get_top(), 0);
    }

    #[test]
    fn test_callee_frame_is_isolated() {
        let mut state = State::new();
        state.push_integer(99).unwrap();
        state.push_function(Function::new(|s| {
            assert_eq!(s.get_top(), 1);
            assert_eq!(s.to_str(1), Some("arg"));
            // Cannot pop into the caller's slots
            s.pop(10);
            assert_eq!(s.get_top(), 0);
            Ok(0)
        }))
        .unwrap();
        state.push_string("arg").unwrap();
        state.call(1, Some(0)).unwrap();
        assert_eq!(state.get_top(), 1);
        assert_eq!(state.to_integer(1), Some(99));
    }

    #[test]
    fn test_pcall_not_callable() {
        let mut state = State::new();
        state.push_nil().unwrap();
        let status = state.pcall(0, Some(0));
        assert_eq!(status, CallStatus::RuntimeError);
        assert_eq!(state.get_top(), 1);
        assert_eq!(state.to_str(-1), Some("attempt to call a nil value"));

        state.set_top(0);
        state.push_integer(5).unwrap();
        state.push_integer(6).unwrap();
        state.pcall(1, None);
        assert_eq!(state.to_str(-1), Some("attempt to call a number value"));
        assert_eq!(state.get_top(), 1);
    }

    #[test]
    fn test_pcall_error_cleans_frame() {
        let mut state = State::new();
        state.push_string("keep").unwrap();
        state.push_function(Function::new(|s| {
            s.push_integer(1)?;
            s.push_integer(2)?;
            Err(EngineError::from("failed on purpose"))
        }))
        .unwrap();
        state.push_integer(7).unwrap();

        let status = state.pcall(1, None);
        assert_eq!(status, CallStatus::RuntimeError);
        assert_eq!(state.get_top(), 2);
        assert_eq!(state.to_str(1), Some("keep"));
        assert_eq!(state.to_str(-1), Some("failed on purpose"));
    }

    #[test]
    fn test_pcall_thrown_value() {
        let mut state = State::new();
        state.push_function(Function::new(|_| {
            Err(EngineError::Thrown(Value::Integer(404)))
        }))
        .unwrap();
        state.pcall(0, None);
        assert_eq!(state.to_integer(-1), Some(404));
    }

    #[test]
    fn test_pcall_contains_panic() {
        let mut state = State::new();
        state.push_function(Function::new(|_| panic!("kaboom"))).unwrap();
        let status = state.pcall(0, Some(1));
        assert_eq!(status, CallStatus::Panicked);
        assert_eq!(state.get_top(), 1);
        assert_eq!(state.to_str(-1), Some("native function panicked: kaboom"));
        assert_eq!(state.call_depth(), 0);
    }

    #[test]
    fn test_reentrant_call() {
        let mut state = State::new();
        state.push_function(Function::new(|s| {
            // host -> script -> host: call `add` from inside a native
            s.push_function(Function::new(add))?;
            s.push_copy(1)?;
            s.push_integer(100)?;
            s.call(2, Some(1))?;
            Ok(1)
        }))
        .unwrap();
        state.push_integer(5).unwrap();
        assert!(state.pcall(1, Some(1)).is_ok());
        assert_eq!(state.get_top(), 1);
        assert_eq!(state.to_integer(-1), Some(105));
    }

    #[test]
    fn test_call_depth_limit() {
        fn recurse(state: &mut State) -> EngineResult<usize> {
            state.push_function(Function::new(recurse))?;
            state.call(0, Some(0))?;
            Ok(0)
        }

        let mut state = State::with_config(EngineConfig::new().max_call_depth(8));
        state.push_function(Function::new(recurse)).unwrap();
        let status = state.pcall(0, Some(0));
        assert_eq!(status, CallStatus::Overflow);
        assert_eq!(state.get_top(), 1);
        assert_eq!(
            state.to_str(-1),
            Some("call depth exceeded (8 nested calls)")
        );
        assert_eq!(state.call_depth(), 0);
    }

    #[test]
    fn test_dishonest_result_count() {
        let mut state = State::new();
        state.push_function(Function::new(|_| Ok(3))).unwrap();
        assert_eq!(state.pcall(0, None), CallStatus::RuntimeError);
        assert_eq!(state.get_top(), 1);
    }
}
