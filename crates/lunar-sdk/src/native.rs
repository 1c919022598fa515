//! Native callable wrappers
//!
//! [`wrap`] turns a plain Rust function or closure into a runtime
//! [`Function`]. The parameter count and each parameter's expected type are
//! captured once, at wrap time, into the function's [`Signature`]; every
//! call then checks them before the host function runs:
//!
//! 1. fewer arguments than declared parameters fails with
//!    `insufficient args, expecting {arity} but got {count}`
//! 2. the first argument whose runtime type does not convert fails with
//!    `error converting arg at index {i} from {actual} to {expected}`,
//!    where `i` is the argument's stack index inside the callee's frame
//!    (the first argument is index 1)
//!
//! Extra arguments are ignored. A function returning `Result<R, E>` raises
//! its `Err` as a runtime error carrying the error's text.

use std::fmt::Display;

use lunar_engine::{EngineError, EngineResult, Function, Signature, State};

use crate::convert::FromValue;
use crate::error::MarshalError;
use crate::multi::{read_slot, PushValues};

/// Values a native function can return
pub trait NativeReturn {
    /// Push the return values and report how many were pushed
    fn push_return(self, state: &mut State) -> EngineResult<usize>;
}

impl<T: PushValues> NativeReturn for T {
    fn push_return(self, state: &mut State) -> EngineResult<usize> {
        self.push_values(state).map_err(|e| match e {
            MarshalError::Engine(engine) => engine,
            other => EngineError::Runtime(format!("error converting return value: {}", other)),
        })?;
        Ok(T::COUNT)
    }
}

impl<T: PushValues, E: Display> NativeReturn for Result<T, E> {
    fn push_return(self, state: &mut State) -> EngineResult<usize> {
        match self {
            Ok(values) => values.push_return(state),
            Err(error) => Err(EngineError::Runtime(error.to_string())),
        }
    }
}

/// Host functions that can be wrapped as runtime callables.
///
/// `Marker` only disambiguates the blanket impls for each arity.
pub trait IntoNative<Marker> {
    /// Wrap into a runtime function with a captured signature
    fn into_native(self) -> Function;
}

/// Wrap a host function, capturing its signature.
///
/// ```ignore
/// fn add(a: i64, b: i64) -> i64 { a + b }
/// push(&mut state, wrap(add));
/// ```
pub fn wrap<F, Marker>(func: F) -> Function
where
    F: IntoNative<Marker>,
{
    func.into_native()
}

/// Wrap a function that operates on the stack directly, with no
/// signature and no argument checks.
pub fn raw(func: impl Fn(&mut State) -> EngineResult<usize> + 'static) -> Function {
    Function::new(func)
}

/// Fail unless at least `arity` arguments were supplied
fn check_arity(state: &State, arity: usize) -> EngineResult<()> {
    let got = state.get_top();
    if got < arity {
        return Err(EngineError::Runtime(format!(
            "insufficient args, expecting {} but got {}",
            arity, got
        )));
    }
    Ok(())
}

/// Convert the argument at `index`
fn read_arg<T: FromValue>(state: &State, index: i32) -> EngineResult<T> {
    read_slot(state, index).map_err(|_| {
        EngineError::Runtime(format!(
            "error converting arg at index {} from {} to {}",
            index,
            state.type_name(index),
            T::TYPE_NAME
        ))
    })
}

macro_rules! impl_into_native {
    ($($arg:ident),*) => {
        impl<Func, Ret, $($arg,)*> IntoNative<(Ret, $($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Ret + 'static,
            Ret: NativeReturn,
            $($arg: FromValue + 'static,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn into_native(self) -> Function {
                let signature = Signature::new(vec![$($arg::TYPE_NAME),*]);
                let arity = signature.arity();
                Function::with_signature(signature, move |state: &mut State| {
                    check_arity(state, arity)?;
                    let mut index = 0;
                    $(
                        index += 1;
                        let $arg = read_arg::<$arg>(state, index)?;
                    )*
                    (self)($($arg),*).push_return(state)
                })
            }
        }
    };
}

impl_into_native!();
impl_into_native!(A);
impl_into_native!(A, B);
impl_into_native!(A, B, C);
impl_into_native!(A, B, C, D);
impl_into_native!(A, B, C, D, E);
impl_into_native!(A, B, C, D, E, F);
impl_into_native!(A, B, C, D, E, F, G);
impl_into_native!(A, B, C, D, E, F, G, H);
