//! Lunar SDK - typed marshaling between Rust and the Lunar value stack
//!
//! This crate is the host-facing boundary on top of `lunar-engine`. Rust
//! values move onto and off the stack through two conversion traits, and
//! plain Rust functions become runtime callables with their signature
//! captured once, at wrap time.
//!
//! - [`push`] / [`to`] / [`pop`] move single values and tuples
//! - [`wrap`] turns `fn(A, B, ..) -> R` into a checked native callable
//! - [`pcall`] calls a runtime callable with host arguments and outputs
//!
//! No failure crosses the boundary as a panic: every operation reports a
//! `bool` (or a [`MarshalResult`] from the `try_*` forms) and protected
//! calls leave one error string on the stack.
//!
//! # Example
//!
//! ```ignore
//! use lunar_sdk::{pcall, pop, push, wrap, State};
//!
//! fn greet(name: String, times: i64) -> String {
//!     name.repeat(times as usize)
//! }
//!
//! let mut state = State::new();
//! push(&mut state, wrap(greet));
//! let mut greeting = String::new();
//! assert!(pcall(&mut state, &mut greeting, ("hi", 2)));
//! assert_eq!(greeting, "hihi");
//!
//! push(&mut state, (1, 2, 3, 4));
//! let mut rets: (i32, i32, i32) = Default::default();
//! assert!(pop(&mut state, &mut rets));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod convert;
pub mod error;
pub mod multi;
pub mod native;
pub mod pcall;
pub mod stack;

pub use convert::{FromValue, Nil, ToValue};
pub use error::{MarshalError, MarshalResult};
pub use multi::{PushValues, ReadValues};
pub use native::{raw, wrap, IntoNative, NativeReturn};
pub use pcall::pcall;
pub use stack::{get_top, pop, push, set_top, to, try_pop, try_push, try_to};

// Runtime types needed to use the SDK without naming lunar-engine directly
pub use lunar_engine::{
    CallStatus, EngineConfig, EngineError, EngineResult, Function, Signature, State, Table,
    TableRef, Value, ValueType,
};
