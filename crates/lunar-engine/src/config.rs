//! Engine configuration

use crate::defaults::{DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_STACK_SIZE};

/// Limits applied to one [`State`](crate::State)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of slots on the value stack
    pub max_stack_size: usize,
    /// Maximum nesting of calls
    pub max_call_depth: usize,
}

impl EngineConfig {
    /// Create a configuration with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum stack size
    pub fn max_stack_size(mut self, size: usize) -> Self {
        self.max_stack_size = size;
        self
    }

    /// Set the maximum call depth
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}
