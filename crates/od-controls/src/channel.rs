//! Clamped actuator channels.
//!
//! A channel holds a bounded setpoint and applies absolute or relative
//! updates with saturation. Out-of-range requests are silently clamped,
//! never rejected: nothing the driver does mid-match may produce an
//! error. Only construction validates.
//!
//! Two kinds:
//! - **PowerChannel**: motor power with a toggle (`running`) flag and a
//!   persistent direction flag. The command written to hardware is
//!   `running ? signed level : 0`.
//! - **PositionChannel**: servo position with a restricted travel range
//!   inside the hardware range (the aiming servo is only ever driven
//!   within a small arc of its full throw).

use crate::error::{ControlError, ControlResult};
use od_core::Bounds;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Persistent rotation direction selected by the directional toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub fn signum(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "FORWARD"),
            Direction::Reverse => write!(f, "REVERSE"),
        }
    }
}

/// Bounded motor-power setpoint with toggle and direction flags.
#[derive(Debug, Clone)]
pub struct PowerChannel {
    level: f64,
    bounds: Bounds,
    step: f64,
    running: bool,
    direction: Direction,
}

impl PowerChannel {
    /// Create a channel. The initial level is clamped into bounds;
    /// the step must be finite and positive.
    pub fn new(initial: f64, bounds: Bounds, step: f64) -> ControlResult<Self> {
        if !step.is_finite() || step <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "step must be finite and positive",
            });
        }
        od_core::ensure_finite(initial, "initial power level")?;
        Ok(Self {
            level: bounds.clamp(initial),
            bounds,
            step,
            running: false,
            direction: Direction::Forward,
        })
    }

    /// Replace the level, saturating into bounds. Non-finite requests
    /// leave the level untouched.
    pub fn set_absolute(&mut self, value: f64) {
        if value.is_finite() {
            self.level = self.bounds.clamp(value);
        }
    }

    /// Nudge the level, saturating into bounds.
    pub fn adjust_relative(&mut self, delta: f64) {
        if delta.is_finite() {
            self.level = self.bounds.clamp(self.level + delta);
        }
    }

    /// One increment up at the current step size.
    pub fn step_up(&mut self) {
        self.adjust_relative(self.step);
    }

    /// One increment down at the current step size.
    pub fn step_down(&mut self) {
        self.adjust_relative(-self.step);
    }

    /// Select the increment used by `step_up`/`step_down` (fine vs
    /// normal control). Non-positive requests are ignored.
    pub fn set_step(&mut self, step: f64) {
        if step.is_finite() && step > 0.0 {
            self.step = step;
        }
    }

    /// Flip the running flag. Discrete mode switch, not a clamp.
    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Effective command written to hardware this tick.
    pub fn command(&self) -> f64 {
        if self.running {
            self.direction.signum() * self.level
        } else {
            0.0
        }
    }

    /// Command at an overridden level (for devices ganged onto this
    /// channel's toggle but driven at their own fixed power).
    pub fn command_at(&self, level: f64) -> f64 {
        if self.running {
            self.direction.signum() * self.bounds.clamp(level)
        } else {
            0.0
        }
    }
}

/// Bounded servo-position setpoint with a restricted travel range.
#[derive(Debug, Clone)]
pub struct PositionChannel {
    position: f64,
    hardware: Bounds,
    travel: Bounds,
    step: f64,
}

impl PositionChannel {
    /// Create a channel. The travel range must lie inside the hardware
    /// range; the initial position is clamped into travel.
    pub fn new(initial: f64, hardware: Bounds, travel: Bounds, step: f64) -> ControlResult<Self> {
        if !hardware.encloses(&travel) {
            return Err(ControlError::InvalidArg {
                what: "travel range must lie inside the hardware range",
            });
        }
        if !step.is_finite() || step <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "step must be finite and positive",
            });
        }
        od_core::ensure_finite(initial, "initial servo position")?;
        Ok(Self {
            position: travel.clamp(initial),
            hardware,
            travel,
            step,
        })
    }

    pub fn set_absolute(&mut self, value: f64) {
        if value.is_finite() {
            self.position = self.travel.clamp(value);
        }
    }

    pub fn adjust_relative(&mut self, delta: f64) {
        if delta.is_finite() {
            self.position = self.travel.clamp(self.position + delta);
        }
    }

    /// Drive to the travel minimum (fully retracted).
    pub fn retract(&mut self) {
        self.position = self.travel.min();
    }

    /// Drive to the travel maximum (fully extended).
    pub fn extend(&mut self) {
        self.position = self.travel.max();
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn travel(&self) -> Bounds {
        self.travel
    }

    pub fn hardware(&self) -> Bounds {
        self.hardware
    }

    /// Effective command written to hardware this tick. A positional
    /// servo holds its setpoint; there is no separate off state.
    pub fn command(&self) -> f64 {
        self.position
    }
}
