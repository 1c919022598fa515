//! Default constants for engine configuration.

/// Default maximum number of slots on the value stack, across all frames.
pub const DEFAULT_MAX_STACK_SIZE: usize = 1_000_000;

/// Default maximum nesting of calls (host -> script -> host ...).
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// Initial capacity reserved for the value stack.
pub const INITIAL_STACK_CAPACITY: usize = 64;
