//! Control primitives for the opdrive teleop loop.
//!
//! This crate provides the per-tick building blocks the loop composes:
//! - Edge detection over sampled gamepad state (press/release events)
//! - Clamped actuator channels (power with toggle/direction flags,
//!   position with a restricted travel range)
//! - Running feedback statistics (gated max + incremental mean)
//! - The binding table mapping buttons and axes to channel actions
//!
//! # Design Principles
//!
//! - **Saturate, never reject**: operator input is clamped on every
//!   write; nothing a driver does at the sticks can produce an error.
//! - **Closed action set**: each button maps to a tagged action variant
//!   interpreted uniformly by the loop, so every mapped behavior is
//!   exhaustively testable.
//! - **One event per signal per tick**: edge detectors update their
//!   stored previous value unconditionally, so a held button fires once.

pub mod action;
pub mod channel;
pub mod edge;
pub mod error;
pub mod gamepad;
pub mod stats;

pub use action::{
    AXIS_DEADZONE, Activation, AxisBinding, ButtonBinding, ChannelAction, ChannelKind, ChannelRef,
};
pub use channel::{Direction, PositionChannel, PowerChannel};
pub use edge::{Edge, EdgeBank, EdgeDetector};
pub use error::{ControlError, ControlResult};
pub use gamepad::{Axis, Button, InputFrame};
pub use stats::RunningStat;
