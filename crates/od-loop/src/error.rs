//! Error types for rig construction and session setup.
//!
//! Per-tick hardware faults are deliberately not represented here:
//! they are logged and absorbed inside the tick (see `session.rs`),
//! never propagated out of the loop.

use thiserror::Error;

pub type LoopResult<T> = Result<T, LoopError>;

#[derive(Debug, Error)]
pub enum LoopError {
    /// Rig configuration problem (unknown channel, mismatched binding,
    /// duplicate name).
    #[error("Rig configuration error: {what}")]
    Config { what: String },

    #[error(transparent)]
    Control(#[from] od_controls::ControlError),

    #[error(transparent)]
    Core(#[from] od_core::OdError),

    #[error("Failed to read rig file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid rig YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
