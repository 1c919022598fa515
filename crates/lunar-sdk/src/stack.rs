//! Stack access: the host-facing push / to / pop surface
//!
//! The boolean functions are what embedders call; the `try_*` variants
//! return the underlying [`MarshalError`] for callers that want to know why.
//!
//! ```ignore
//! push(&mut state, (1, 2, 3, 4));
//! let mut rets: (i32, i32, i32) = Default::default();
//! pop(&mut state, &mut rets);      // (2, 3, 4)
//! let mut first = 0;
//! pop(&mut state, &mut first);     // 1
//! ```

use lunar_engine::State;
use tracing::debug;

use crate::error::{MarshalError, MarshalResult};
use crate::multi::{PushValues, ReadValues};

/// Current stack depth (0 = empty)
#[inline]
pub fn get_top(state: &State) -> usize {
    state.get_top()
}

/// Truncate or pad (with nil) the stack to exactly `top` slots. Never fails.
#[inline]
pub fn set_top(state: &mut State, top: usize) {
    state.set_top(top)
}

/// Push every value of `values` in order.
///
/// Returns false if any element is unrepresentable or the stack is full.
/// Elements pushed before the failing one stay on the stack.
pub fn push<V: PushValues>(state: &mut State, values: V) -> bool {
    match try_push(state, values) {
        Ok(()) => true,
        Err(error) => {
            debug!(%error, "push failed");
            false
        }
    }
}

/// Fallible form of [`push`]
pub fn try_push<V: PushValues>(state: &mut State, values: V) -> MarshalResult<()> {
    values.push_values(state)
}

/// Read the slots starting at `index` into `out` without removing them.
///
/// Returns false if any slot's runtime type is incompatible with the
/// corresponding output; a single output is left untouched in that case.
pub fn to<R: ReadValues>(state: &State, index: i32, out: &mut R) -> bool {
    match try_to(state, index, out) {
        Ok(()) => true,
        Err(error) => {
            debug!(%error, index, "to failed");
            false
        }
    }
}

/// Fallible form of [`to`]
pub fn try_to<R: ReadValues>(state: &State, index: i32, out: &mut R) -> MarshalResult<()> {
    if R::COUNT == 0 {
        return Ok(());
    }
    let start = resolve_start(state, index)?;
    out.read_values(state, start)
}

/// Read the top `N` slots into `out` (deepest first), then remove them.
///
/// The `N` slots are removed whether or not every read succeeded. With fewer
/// than `N` slots in the frame, the slots present bind to the leading outputs
/// and the rest read as absent, the same as [`to`] from index 1.
pub fn pop<R: ReadValues>(state: &mut State, out: &mut R) -> bool {
    match try_pop(state, out) {
        Ok(()) => true,
        Err(error) => {
            debug!(%error, "pop failed");
            false
        }
    }
}

/// Fallible form of [`pop`]
pub fn try_pop<R: ReadValues>(state: &mut State, out: &mut R) -> MarshalResult<()> {
    let count = R::COUNT;
    let start = if state.get_top() >= count {
        -(count as i32)
    } else {
        1
    };
    let result = try_to(state, start, out);
    state.pop(count);
    result
}

/// Resolve the first index of a run to its positive form.
///
/// Positive indices past the top are kept so that optional outputs can read
/// them as absent.
fn resolve_start(state: &State, index: i32) -> MarshalResult<i32> {
    if index > 0 {
        return Ok(index);
    }
    state
        .positive_index(index)
        .ok_or(MarshalError::TypeMismatch {
            index,
            actual: state.type_name(index),
            expected: "value",
        })
}
