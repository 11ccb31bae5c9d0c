//! Gamepad input model.
//!
//! One `InputFrame` is sampled per tick by the input collaborator; the
//! loop never touches the device layer directly. Frames are plain data
//! and deserialize from YAML so scripted sessions replay cleanly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete gamepad signals tracked by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    A,
    B,
    X,
    Y,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    LeftBumper,
    RightBumper,
    LeftStickButton,
    RightStickButton,
}

impl Button {
    /// Every tracked button, in a stable order.
    pub const ALL: [Button; 12] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::DpadUp,
        Button::DpadDown,
        Button::DpadLeft,
        Button::DpadRight,
        Button::LeftBumper,
        Button::RightBumper,
        Button::LeftStickButton,
        Button::RightStickButton,
    ];
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
            Button::DpadUp => "DPAD Up",
            Button::DpadDown => "DPAD Down",
            Button::DpadLeft => "DPAD Left",
            Button::DpadRight => "DPAD Right",
            Button::LeftBumper => "Left Bumper",
            Button::RightBumper => "Right Bumper",
            Button::LeftStickButton => "Left Stick Button",
            Button::RightStickButton => "Right Stick Button",
        };
        write!(f, "{name}")
    }
}

/// Continuous gamepad signals (trigger magnitudes in [0, 1]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    LeftTrigger,
    RightTrigger,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::LeftTrigger => write!(f, "Left Trigger"),
            Axis::RightTrigger => write!(f, "Right Trigger"),
        }
    }
}

/// One complete input sample.
///
/// All fields default to released/zero, so scripted frames only name
/// the controls they touch.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFrame {
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,
    pub dpad_up: bool,
    pub dpad_down: bool,
    pub dpad_left: bool,
    pub dpad_right: bool,
    pub left_bumper: bool,
    pub right_bumper: bool,
    pub left_stick_button: bool,
    pub right_stick_button: bool,
    pub left_trigger: f64,
    pub right_trigger: f64,
}

impl InputFrame {
    pub fn button(&self, button: Button) -> bool {
        match button {
            Button::A => self.a,
            Button::B => self.b,
            Button::X => self.x,
            Button::Y => self.y,
            Button::DpadUp => self.dpad_up,
            Button::DpadDown => self.dpad_down,
            Button::DpadLeft => self.dpad_left,
            Button::DpadRight => self.dpad_right,
            Button::LeftBumper => self.left_bumper,
            Button::RightBumper => self.right_bumper,
            Button::LeftStickButton => self.left_stick_button,
            Button::RightStickButton => self.right_stick_button,
        }
    }

    /// Trigger magnitude, sanitized into [0, 1]. Non-finite samples
    /// read as zero.
    pub fn axis(&self, axis: Axis) -> f64 {
        let raw = match axis {
            Axis::LeftTrigger => self.left_trigger,
            Axis::RightTrigger => self.right_trigger,
        };
        if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 }
    }

    /// Builder-style helpers for tests and canned scripts.
    pub fn with_button(mut self, button: Button, pressed: bool) -> Self {
        match button {
            Button::A => self.a = pressed,
            Button::B => self.b = pressed,
            Button::X => self.x = pressed,
            Button::Y => self.y = pressed,
            Button::DpadUp => self.dpad_up = pressed,
            Button::DpadDown => self.dpad_down = pressed,
            Button::DpadLeft => self.dpad_left = pressed,
            Button::DpadRight => self.dpad_right = pressed,
            Button::LeftBumper => self.left_bumper = pressed,
            Button::RightBumper => self.right_bumper = pressed,
            Button::LeftStickButton => self.left_stick_button = pressed,
            Button::RightStickButton => self.right_stick_button = pressed,
        }
        self
    }

    pub fn with_axis(mut self, axis: Axis, magnitude: f64) -> Self {
        match axis {
            Axis::LeftTrigger => self.left_trigger = magnitude,
            Axis::RightTrigger => self.right_trigger = magnitude,
        }
        self
    }
}
