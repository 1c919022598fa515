//! Multi-value packs
//!
//! A pack is a fixed-size, ordered group of values occupying a contiguous
//! run of stack slots. Any single convertible value is a pack of one, `()`
//! is the empty pack and tuples of convertible values are packs of their
//! arity. Elements are always processed left to right, the first element
//! binding to the deepest slot.

use lunar_engine::State;

use crate::convert::{FromValue, ToValue};
use crate::error::{MarshalError, MarshalResult};

/// A group of host values that can be pushed as consecutive slots.
pub trait PushValues {
    /// Number of slots the pack occupies
    const COUNT: usize;

    /// Push every element in order.
    ///
    /// A failure part-way through leaves the elements already pushed on the
    /// stack.
    fn push_values(self, state: &mut State) -> MarshalResult<()>;
}

/// A group of output locations filled from consecutive slots.
pub trait ReadValues {
    /// Number of slots the pack consumes
    const COUNT: usize;

    /// Read `COUNT` slots starting at positive index `start`.
    ///
    /// Elements are written as they are read: when element `j` fails, the
    /// elements before it have already been overwritten.
    fn read_values(&mut self, state: &State, start: i32) -> MarshalResult<()>;
}

// ============================================================================
// Single values
// ============================================================================

impl<T: ToValue> PushValues for T {
    const COUNT: usize = 1;

    fn push_values(self, state: &mut State) -> MarshalResult<()> {
        let value = self.to_value()?;
        state.push_value(value)?;
        Ok(())
    }
}

impl<T: FromValue> ReadValues for T {
    const COUNT: usize = 1;

    fn read_values(&mut self, state: &State, start: i32) -> MarshalResult<()> {
        *self = read_slot(state, start)?;
        Ok(())
    }
}

/// Read one slot as `T`, reporting the runtime and host type names on mismatch
pub(crate) fn read_slot<T: FromValue>(state: &State, index: i32) -> MarshalResult<T> {
    T::from_slot(state.value_at(index)).ok_or_else(|| MarshalError::TypeMismatch {
        index,
        actual: state.type_name(index),
        expected: T::TYPE_NAME,
    })
}

// ============================================================================
// Empty pack
// ============================================================================

impl PushValues for () {
    const COUNT: usize = 0;

    fn push_values(self, _state: &mut State) -> MarshalResult<()> {
        Ok(())
    }
}

impl ReadValues for () {
    const COUNT: usize = 0;

    fn read_values(&mut self, _state: &State, _start: i32) -> MarshalResult<()> {
        Ok(())
    }
}

// ============================================================================
// Tuples
// ============================================================================

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! impl_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: ToValue),+> PushValues for ($($name,)+) {
            const COUNT: usize = count!($($name)+);

            fn push_values(self, state: &mut State) -> MarshalResult<()> {
                $(
                    let value = self.$idx.to_value()?;
                    state.push_value(value)?;
                )+
                Ok(())
            }
        }

        impl<$($name: FromValue),+> ReadValues for ($($name,)+) {
            const COUNT: usize = count!($($name)+);

            fn read_values(&mut self, state: &State, start: i32) -> MarshalResult<()> {
                $(
                    self.$idx = read_slot(state, start + $idx)?;
                )+
                Ok(())
            }
        }
    };
}

impl_tuple!(A: 0);
impl_tuple!(A: 0, B: 1);
impl_tuple!(A: 0, B: 1, C: 2);
impl_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11);
