//! Error types for setup and configuration.
//!
//! Only setup-time structural checks produce errors. The RHS hot path does no
//! validation: physically invalid input propagates as NaN or negative pressure.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DycoreError>;

/// Errors raised while configuring or setting up the dynamical core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DycoreError {
    /// A configuration parameter is out of its admissible range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Array sizes disagree with what the layout requires.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Scratch arena arithmetic does not match the declared buffer layout.
    #[error("Scratch arena layout mismatch: declared {declared} values, laid out {laid_out}")]
    ArenaLayout { declared: usize, laid_out: usize },

    /// `allocate_buffers` was called twice without a reset.
    #[error("Scratch buffers already allocated ({slots} slots)")]
    AlreadyAllocated { slots: usize },

    /// A kernel was run before its scratch buffers were allocated.
    #[error("Scratch buffers not allocated")]
    NotAllocated,

    /// A time-level index is out of range or aliases the level being written.
    #[error("Invalid time levels: {0}")]
    InvalidTimeLevel(String),
}

impl DycoreError {
    /// Create an invalid-configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a dimension-mismatch error.
    pub fn dimension_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }
}
