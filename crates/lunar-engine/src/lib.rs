//! Lunar Engine - the stack-based runtime primitives
//!
//! This crate provides the minimal runtime surface the marshaling layer in
//! `lunar-sdk` is built on:
//! - A single value stack with call frames ([`State`])
//! - Dynamically typed values ([`Value`], [`ValueType`])
//! - Tables and native functions ([`TableRef`], [`Function`])
//! - Unprotected and protected calls ([`State::call`], [`State::pcall`])
//!
//! # Example
//!
//! ```ignore
//! use lunar_engine::{Function, State};
//!
//! let mut state = State::new();
//! state.push_function(Function::new(|s| {
//!     let n = s.to_integer(1).ok_or("expected integer")?;
//!     s.push_integer(n * 2)?;
//!     Ok(1)
//! }))?;
//! state.push_integer(21)?;
//! assert!(state.pcall(1, Some(1)).is_ok());
//! assert_eq!(state.to_integer(-1), Some(42));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod defaults;
pub mod error;
pub mod function;
pub mod state;
pub mod table;
pub mod value;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use function::{Function, NativeFn, Signature};
pub use state::{CallStatus, State};
pub use table::{Table, TableRef};
pub use value::{Value, ValueType};
