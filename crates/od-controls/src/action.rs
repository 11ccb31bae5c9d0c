//! Binding table: buttons and axes mapped to channel actions.
//!
//! The original driver program bound each button to its own command
//! closure. Here the mapping is data: a closed set of action variants
//! interpreted uniformly by the loop, so every mapped behavior can be
//! tested exhaustively and a full control map deserializes from the
//! rig configuration.

use crate::channel::{Direction, PositionChannel, PowerChannel};
use crate::gamepad::{Axis, Button};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trigger magnitudes below this read as released.
pub const AXIS_DEADZONE: f64 = 0.05;

/// Name of a rig channel a binding targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelRef(pub String);

impl ChannelRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which channel kind a binding may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Power,
    Position,
}

/// The closed set of per-tick channel mutations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelAction {
    /// Flip the running flag (on/off actuators).
    Toggle,
    /// Select a persistent direction.
    SetDirection { direction: Direction },
    /// Replace the setpoint, clamped.
    SetAbsolute { value: f64 },
    /// Nudge the setpoint, clamped.
    AdjustRelative { delta: f64 },
    /// Select the increment used by StepUp/StepDown.
    SetStep { step: f64 },
    /// One increment up at the channel's current step.
    StepUp,
    /// One increment down at the channel's current step.
    StepDown,
    /// Drive a position channel to its travel minimum.
    Retract,
    /// Drive a position channel to its travel maximum.
    Extend,
}

impl ChannelAction {
    /// Whether this action is meaningful for the given channel kind.
    /// Checked once at rig build; a mismatched binding is a
    /// configuration error, not a runtime one.
    pub fn supports(&self, kind: ChannelKind) -> bool {
        match self {
            ChannelAction::Toggle
            | ChannelAction::SetDirection { .. }
            | ChannelAction::SetStep { .. } => kind == ChannelKind::Power,
            ChannelAction::Retract | ChannelAction::Extend => kind == ChannelKind::Position,
            ChannelAction::SetAbsolute { .. }
            | ChannelAction::AdjustRelative { .. }
            | ChannelAction::StepUp
            | ChannelAction::StepDown => true,
        }
    }

    /// Interpret against a power channel. Position-only variants are
    /// unreachable for validated rigs and do nothing.
    pub fn apply_to_power(&self, ch: &mut PowerChannel) {
        match *self {
            ChannelAction::Toggle => ch.toggle(),
            ChannelAction::SetDirection { direction } => ch.set_direction(direction),
            ChannelAction::SetAbsolute { value } => ch.set_absolute(value),
            ChannelAction::AdjustRelative { delta } => ch.adjust_relative(delta),
            ChannelAction::SetStep { step } => ch.set_step(step),
            ChannelAction::StepUp => ch.step_up(),
            ChannelAction::StepDown => ch.step_down(),
            ChannelAction::Retract | ChannelAction::Extend => {}
        }
    }

    /// Interpret against a position channel. Power-only variants do
    /// nothing.
    pub fn apply_to_position(&self, ch: &mut PositionChannel) {
        match *self {
            ChannelAction::SetAbsolute { value } => ch.set_absolute(value),
            ChannelAction::AdjustRelative { delta } => ch.adjust_relative(delta),
            ChannelAction::StepUp => {
                let step = ch.step();
                ch.adjust_relative(step);
            }
            ChannelAction::StepDown => {
                let step = ch.step();
                ch.adjust_relative(-step);
            }
            ChannelAction::Retract => ch.retract(),
            ChannelAction::Extend => ch.extend(),
            ChannelAction::Toggle
            | ChannelAction::SetDirection { .. }
            | ChannelAction::SetStep { .. } => {}
        }
    }
}

impl fmt::Display for ChannelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelAction::Toggle => write!(f, "toggle on/off"),
            ChannelAction::SetDirection { direction } => write!(f, "direction {direction}"),
            ChannelAction::SetAbsolute { value } => write!(f, "set {value:.2}"),
            ChannelAction::AdjustRelative { delta } => write!(f, "adjust {delta:+.3}"),
            ChannelAction::SetStep { step } => write!(f, "step size {step:.3}"),
            ChannelAction::StepUp => write!(f, "increase by step"),
            ChannelAction::StepDown => write!(f, "decrease by step"),
            ChannelAction::Retract => write!(f, "fully retract"),
            ChannelAction::Extend => write!(f, "fully extend"),
        }
    }
}

/// How a button binding consumes the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Fire once per rising edge.
    Press,
    /// Apply every tick the button samples true.
    Hold,
}

/// One row of the button mapping table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonBinding {
    pub button: Button,
    pub activation: Activation,
    pub target: ChannelRef,
    pub action: ChannelAction,
}

/// One row of the continuous-axis mapping table: each tick the target
/// channel is nudged by `gain * magnitude` (after the dead zone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisBinding {
    pub axis: Axis,
    pub target: ChannelRef,
    pub gain: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use od_core::Bounds;

    fn power() -> PowerChannel {
        PowerChannel::new(0.5, Bounds::new(0.0, 1.0).unwrap(), 0.05).unwrap()
    }

    fn servo() -> PositionChannel {
        PositionChannel::new(
            0.0,
            Bounds::new(0.0, 1.0).unwrap(),
            Bounds::new(0.0, 0.17).unwrap(),
            0.02,
        )
        .unwrap()
    }

    #[test]
    fn every_action_applies_to_its_kind() {
        let mut ch = power();
        ChannelAction::Toggle.apply_to_power(&mut ch);
        assert!(ch.running());
        ChannelAction::SetDirection {
            direction: Direction::Reverse,
        }
        .apply_to_power(&mut ch);
        assert_eq!(ch.direction(), Direction::Reverse);
        ChannelAction::SetAbsolute { value: 0.75 }.apply_to_power(&mut ch);
        assert_eq!(ch.level(), 0.75);
        ChannelAction::SetStep { step: 0.025 }.apply_to_power(&mut ch);
        ChannelAction::StepUp.apply_to_power(&mut ch);
        assert!((ch.level() - 0.775).abs() < 1e-12);
        ChannelAction::StepDown.apply_to_power(&mut ch);
        assert!((ch.level() - 0.75).abs() < 1e-12);
        ChannelAction::AdjustRelative { delta: 0.5 }.apply_to_power(&mut ch);
        assert_eq!(ch.level(), 1.0);

        let mut ch = servo();
        ChannelAction::Extend.apply_to_position(&mut ch);
        assert_eq!(ch.position(), 0.17);
        ChannelAction::Retract.apply_to_position(&mut ch);
        assert_eq!(ch.position(), 0.0);
        ChannelAction::AdjustRelative { delta: 0.01 }.apply_to_position(&mut ch);
        assert!((ch.position() - 0.01).abs() < 1e-12);
        ChannelAction::SetAbsolute { value: 0.1 }.apply_to_position(&mut ch);
        assert_eq!(ch.position(), 0.1);
    }

    #[test]
    fn mismatched_actions_are_inert() {
        let mut ch = servo();
        let before = ch.position();
        ChannelAction::Toggle.apply_to_position(&mut ch);
        ChannelAction::SetStep { step: 0.5 }.apply_to_position(&mut ch);
        assert_eq!(ch.position(), before);

        let mut ch = power();
        ChannelAction::Retract.apply_to_power(&mut ch);
        ChannelAction::Extend.apply_to_power(&mut ch);
        assert_eq!(ch.level(), 0.5);
        assert!(!ch.running());
    }

    #[test]
    fn supports_matches_apply_semantics() {
        assert!(ChannelAction::Toggle.supports(ChannelKind::Power));
        assert!(!ChannelAction::Toggle.supports(ChannelKind::Position));
        assert!(ChannelAction::Extend.supports(ChannelKind::Position));
        assert!(!ChannelAction::Extend.supports(ChannelKind::Power));
        assert!(ChannelAction::StepUp.supports(ChannelKind::Power));
        assert!(ChannelAction::StepUp.supports(ChannelKind::Position));
    }

    #[test]
    fn bindings_deserialize_from_yaml() {
        let yaml = r#"
button: a
activation: press
target: intake
action:
  type: toggle
"#;
        let binding: ButtonBinding = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(binding.button, Button::A);
        assert_eq!(binding.activation, Activation::Press);
        assert_eq!(binding.action, ChannelAction::Toggle);

        let yaml = r#"
button: dpad_left
activation: press
target: intake
action:
  type: set_direction
  direction: reverse
"#;
        let binding: ButtonBinding = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            binding.action,
            ChannelAction::SetDirection {
                direction: Direction::Reverse
            }
        );

        let yaml = "axis: right_trigger\ntarget: aim\ngain: 0.02\n";
        let axis: AxisBinding = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(axis.axis, Axis::RightTrigger);
        assert_eq!(axis.gain, 0.02);
    }
}
