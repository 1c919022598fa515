//! Protected calls from the host
//!
//! [`pcall`] invokes the callable on top of the stack with host arguments
//! and reads its results back into host outputs. Every failure is reported
//! as `false` with exactly one error string left where the callee was:
//!
//! ```text
//! before:  [.. caller slots .., callee]
//! ok:      [.. caller slots ..]            outputs populated
//! failed:  [.. caller slots .., error]
//! ```

use lunar_engine::{State, Value, ValueType};
use tracing::{debug, trace};

use crate::error::MarshalError;
use crate::multi::{PushValues, ReadValues};

/// Call the callable on top of the stack with `args`, reading `R::COUNT`
/// results into `out`.
///
/// Pass `&mut ()` when no results are wanted. On success the callee and all
/// of its results are gone. On failure the callee is replaced by a single
/// error string:
///
/// - a non-callable callee gives `attempt to call a {type} value`
/// - errors raised by the callee (arity, argument conversion, runtime
///   errors, panics) keep their own message
/// - an incompatible result gives
///   `error converting return value at index {i} from {actual} to {expected}`
///   where `i` counts results from 1
///
/// ```ignore
/// push(&mut state, wrap(|a: i64, b: i64| a + b));
/// let mut sum = 0i64;
/// assert!(pcall(&mut state, &mut sum, (40, 2)));
/// ```
pub fn pcall<R: ReadValues, A: PushValues>(state: &mut State, out: &mut R, args: A) -> bool {
    let func_top = state.get_top();
    let callee_type = state.type_of(-1);
    if callee_type != ValueType::Function {
        let name = match callee_type {
            ValueType::None => ValueType::Nil.name(),
            other => other.name(),
        };
        state.pop(1);
        leave_error(state, format!("attempt to call a {} value", name));
        return false;
    }

    if let Err(error) = args.push_values(state) {
        state.set_top(func_top - 1);
        leave_error(state, format!("error converting argument: {}", error));
        return false;
    }

    let nargs = state.get_top() - func_top;
    trace!(nargs, nresults = R::COUNT, "protected call");
    let status = state.pcall(nargs, Some(R::COUNT));
    if !status.is_ok() {
        debug!(?status, "protected call failed");
        return false;
    }

    let result = out.read_values(state, func_top as i32);
    state.set_top(func_top - 1);
    match result {
        Ok(()) => true,
        Err(MarshalError::TypeMismatch {
            index,
            actual,
            expected,
        }) => {
            let position = index - func_top as i32 + 1;
            leave_error(
                state,
                format!(
                    "error converting return value at index {} from {} to {}",
                    position, actual, expected
                ),
            );
            false
        }
        Err(other) => {
            leave_error(state, other.to_string());
            false
        }
    }
}

/// Push the error string that stands in for the consumed callee
fn leave_error(state: &mut State, message: String) {
    debug!(%message, "pcall error");
    // The callee slot was released first, so this only fails with a zero-slot
    // stack limit
    if let Err(error) = state.push_value(Value::string(message)) {
        debug!(%error, "could not leave pcall error on the stack");
    }
}
