//! Error types for control primitives.

use thiserror::Error;

/// Result type for control primitive construction.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while building control primitives.
///
/// Per-tick operations are total: only constructors fail.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Invalid argument provided to a constructor.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Foundation-level failure (non-finite value, inverted bounds).
    #[error(transparent)]
    Core(#[from] od_core::OdError),
}
