//! Rig configuration and the built actuator set.
//!
//! A `RigConfig` is plain serde data (loadable from YAML); `Rig::build`
//! validates it into live channels, resolves every binding against a
//! named channel, and probes the bus once for device presence. All
//! configuration errors surface here, at build time; per-tick
//! operations on a built rig cannot fail.
//!
//! The default configuration reproduces the competition robot: a
//! toggled intake motor with a direction selector, two shooter motors
//! and a conveyor ganged onto one variable-power channel, and an
//! optional aiming servo nudged by the triggers within a short travel
//! range.

use crate::error::{LoopError, LoopResult};
use crate::hardware::ActuatorBus;
use crate::snapshot::{ActuatorSnapshot, TickSnapshot};
use od_controls::{
    AXIS_DEADZONE, Activation, Axis, AxisBinding, Button, ButtonBinding, ChannelAction,
    ChannelKind, ChannelRef, Direction, Edge, InputFrame, PositionChannel, PowerChannel,
    RunningStat,
};
use od_core::units::constants::{ENCODER_CPR, expected_rpm};
use od_core::units::ticks_to_rpm;
use od_core::Bounds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::warn;

fn default_one() -> f64 {
    1.0
}

fn default_power_step() -> f64 {
    0.05
}

fn default_servo_step() -> f64 {
    0.02
}

fn default_tick_ms() -> u64 {
    20
}

/// A named variable-power setpoint. Several motors may follow one
/// channel (the shooter pair and the conveyor share a toggle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerChannelDef {
    pub name: String,
    #[serde(default)]
    pub initial: f64,
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_one")]
    pub max: f64,
    #[serde(default = "default_power_step")]
    pub step: f64,
}

/// A positional servo with a restricted travel range inside its
/// hardware range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServoChannelDef {
    pub name: String,
    pub device: String,
    #[serde(default)]
    pub initial: f64,
    #[serde(default)]
    pub hardware_min: f64,
    #[serde(default = "default_one")]
    pub hardware_max: f64,
    pub travel_min: f64,
    pub travel_max: f64,
    #[serde(default = "default_servo_step")]
    pub step: f64,
}

/// One physical motor following a power channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorDef {
    pub device: String,
    /// Name of the power channel this motor follows.
    pub channel: String,
    /// Fixed level override: the motor follows the channel's toggle
    /// and direction but runs at this level instead of the channel's.
    #[serde(default)]
    pub level: Option<f64>,
    /// Encoder resolution; `None` means no feedback for this motor.
    #[serde(default)]
    pub counts_per_rev: Option<f64>,
}

/// Complete rig description: channels, motors, and the control map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    pub power_channels: Vec<PowerChannelDef>,
    #[serde(default)]
    pub servo_channels: Vec<ServoChannelDef>,
    pub motors: Vec<MotorDef>,
    #[serde(default)]
    pub bindings: Vec<ButtonBinding>,
    #[serde(default)]
    pub axis_bindings: Vec<AxisBinding>,
}

impl RigConfig {
    pub fn from_yaml(text: &str) -> LoopResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> LoopResult<Self> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }
}

impl Default for RigConfig {
    fn default() -> Self {
        let press = |button, target: &str, action| ButtonBinding {
            button,
            activation: Activation::Press,
            target: ChannelRef::new(target),
            action,
        };
        let hold = |button, target: &str, action| ButtonBinding {
            button,
            activation: Activation::Hold,
            target: ChannelRef::new(target),
            action,
        };
        Self {
            tick_ms: 20,
            power_channels: vec![
                PowerChannelDef {
                    name: "intake".into(),
                    initial: 0.90,
                    min: 0.0,
                    max: 1.0,
                    step: 0.05,
                },
                PowerChannelDef {
                    name: "shooter".into(),
                    initial: 0.50,
                    min: 0.0,
                    max: 1.0,
                    step: 0.05,
                },
            ],
            servo_channels: vec![ServoChannelDef {
                name: "aim".into(),
                device: "aim_servo".into(),
                initial: 0.0,
                hardware_min: 0.0,
                hardware_max: 1.0,
                travel_min: 0.0,
                travel_max: 0.17,
                step: 0.02,
            }],
            motors: vec![
                MotorDef {
                    device: "intake_motor".into(),
                    channel: "intake".into(),
                    level: None,
                    counts_per_rev: Some(ENCODER_CPR),
                },
                MotorDef {
                    device: "shooter_one".into(),
                    channel: "shooter".into(),
                    level: None,
                    counts_per_rev: Some(ENCODER_CPR),
                },
                MotorDef {
                    device: "shooter_two".into(),
                    channel: "shooter".into(),
                    level: None,
                    counts_per_rev: Some(ENCODER_CPR),
                },
                MotorDef {
                    device: "conveyor".into(),
                    channel: "shooter".into(),
                    level: Some(0.75),
                    counts_per_rev: Some(ENCODER_CPR),
                },
            ],
            bindings: vec![
                press(Button::A, "intake", ChannelAction::Toggle),
                press(
                    Button::DpadLeft,
                    "intake",
                    ChannelAction::SetDirection {
                        direction: Direction::Reverse,
                    },
                ),
                press(
                    Button::DpadRight,
                    "intake",
                    ChannelAction::SetDirection {
                        direction: Direction::Forward,
                    },
                ),
                press(Button::B, "shooter", ChannelAction::Toggle),
                // Fine control wins when both bumpers are held.
                hold(Button::LeftBumper, "shooter", ChannelAction::SetStep { step: 0.05 }),
                hold(
                    Button::RightBumper,
                    "shooter",
                    ChannelAction::SetStep { step: 0.025 },
                ),
                press(Button::DpadUp, "shooter", ChannelAction::StepUp),
                press(Button::DpadDown, "shooter", ChannelAction::StepDown),
                // X preset wins when both presets are held.
                hold(Button::Y, "shooter", ChannelAction::SetAbsolute { value: 1.0 }),
                hold(Button::X, "shooter", ChannelAction::SetAbsolute { value: 0.75 }),
                hold(Button::LeftStickButton, "aim", ChannelAction::Retract),
                hold(Button::RightStickButton, "aim", ChannelAction::Extend),
            ],
            axis_bindings: vec![
                AxisBinding {
                    axis: Axis::RightTrigger,
                    target: ChannelRef::new("aim"),
                    gain: 0.02,
                },
                AxisBinding {
                    axis: Axis::LeftTrigger,
                    target: ChannelRef::new("aim"),
                    gain: -0.02,
                },
            ],
        }
    }
}

/// Index into the rig's channel tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Power(usize),
    Servo(usize),
}

#[derive(Debug, Clone, Copy)]
struct ResolvedButton {
    button: Button,
    activation: Activation,
    target: Target,
    action: ChannelAction,
}

#[derive(Debug, Clone, Copy)]
struct ResolvedAxis {
    axis: Axis,
    target: Target,
    gain: f64,
}

#[derive(Debug)]
struct Motor {
    device: String,
    channel: usize,
    level: Option<f64>,
    counts_per_rev: Option<f64>,
    present: bool,
    stat: RunningStat,
    last_rpm: Option<f64>,
    last_command: f64,
}

#[derive(Debug)]
struct Servo {
    name: String,
    device: String,
    channel: PositionChannel,
    present: bool,
}

/// The built actuator set: live channels, ganged motors, resolved
/// bindings, presence flags, and one statistics accumulator per
/// feedback-bearing motor.
#[derive(Debug)]
pub struct Rig {
    tick_ms: u64,
    power_names: Vec<String>,
    power: Vec<PowerChannel>,
    servos: Vec<Servo>,
    motors: Vec<Motor>,
    buttons: Vec<ResolvedButton>,
    axes: Vec<ResolvedAxis>,
    shut_down: bool,
}

impl Rig {
    /// Validate a configuration into a live rig, probing the bus once
    /// for device presence. Absent devices are kept (and reported in
    /// snapshots) but skipped for all I/O.
    pub fn build(config: &RigConfig, bus: &dyn ActuatorBus) -> LoopResult<Self> {
        let mut power_names = Vec::new();
        let mut power = Vec::new();
        for def in &config.power_channels {
            if power_names.contains(&def.name) {
                return Err(LoopError::Config {
                    what: format!("duplicate power channel '{}'", def.name),
                });
            }
            let bounds = Bounds::new(def.min, def.max)?;
            power.push(PowerChannel::new(def.initial, bounds, def.step)?);
            power_names.push(def.name.clone());
        }

        let mut servos = Vec::new();
        for def in &config.servo_channels {
            if power_names.contains(&def.name) || servos.iter().any(|s: &Servo| s.name == def.name)
            {
                return Err(LoopError::Config {
                    what: format!("duplicate channel '{}'", def.name),
                });
            }
            let hardware = Bounds::new(def.hardware_min, def.hardware_max)?;
            let travel = Bounds::new(def.travel_min, def.travel_max)?;
            let channel = PositionChannel::new(def.initial, hardware, travel, def.step)?;
            let present = bus.is_present(&def.device);
            if !present {
                warn!(device = %def.device, "servo not found in hardware configuration; skipping");
            }
            servos.push(Servo {
                name: def.name.clone(),
                device: def.device.clone(),
                channel,
                present,
            });
        }

        let mut motors = Vec::new();
        for def in &config.motors {
            let channel = power_names.iter().position(|n| *n == def.channel).ok_or(
                LoopError::Config {
                    what: format!(
                        "motor '{}' references unknown channel '{}'",
                        def.device, def.channel
                    ),
                },
            )?;
            if let Some(level) = def.level {
                od_core::ensure_finite(level, "motor level override")?;
            }
            if let Some(cpr) = def.counts_per_rev {
                if !cpr.is_finite() || cpr <= 0.0 {
                    return Err(LoopError::Config {
                        what: format!("motor '{}' has invalid counts_per_rev", def.device),
                    });
                }
            }
            let present = bus.is_present(&def.device);
            if !present {
                warn!(device = %def.device, "motor not found in hardware configuration; skipping");
            }
            motors.push(Motor {
                device: def.device.clone(),
                channel,
                level: def.level,
                counts_per_rev: def.counts_per_rev,
                present,
                stat: RunningStat::new(),
                last_rpm: None,
                last_command: 0.0,
            });
        }

        let resolve = |target: &ChannelRef| -> LoopResult<(Target, ChannelKind)> {
            if let Some(i) = power_names.iter().position(|n| n == target.as_str()) {
                return Ok((Target::Power(i), ChannelKind::Power));
            }
            if let Some(i) = servos.iter().position(|s| s.name == target.as_str()) {
                return Ok((Target::Servo(i), ChannelKind::Position));
            }
            Err(LoopError::Config {
                what: format!("binding references unknown channel '{target}'"),
            })
        };

        let mut buttons = Vec::new();
        for binding in &config.bindings {
            let (target, kind) = resolve(&binding.target)?;
            if !binding.action.supports(kind) {
                return Err(LoopError::Config {
                    what: format!(
                        "action '{}' on button {} does not apply to channel '{}'",
                        binding.action, binding.button, binding.target
                    ),
                });
            }
            buttons.push(ResolvedButton {
                button: binding.button,
                activation: binding.activation,
                target,
                action: binding.action,
            });
        }

        let mut axes = Vec::new();
        for binding in &config.axis_bindings {
            let (target, _) = resolve(&binding.target)?;
            if !binding.gain.is_finite() || binding.gain == 0.0 {
                return Err(LoopError::Config {
                    what: format!("axis {} has invalid gain", binding.axis),
                });
            }
            axes.push(ResolvedAxis {
                axis: binding.axis,
                target,
                gain: binding.gain,
            });
        }

        Ok(Self {
            tick_ms: config.tick_ms,
            power_names,
            power,
            servos,
            motors,
            buttons,
            axes,
            shut_down: false,
        })
    }

    pub fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    /// Buttons the edge bank needs to track.
    pub fn tracked_buttons(&self) -> BTreeSet<Button> {
        self.buttons.iter().map(|b| b.button).collect()
    }

    fn apply(&mut self, target: Target, action: &ChannelAction) {
        match target {
            Target::Power(i) => action.apply_to_power(&mut self.power[i]),
            Target::Servo(i) => action.apply_to_position(&mut self.servos[i].channel),
        }
    }

    /// Apply press-activated bindings for this tick's rising edges.
    pub fn apply_presses(&mut self, events: &[(Button, Edge)]) {
        for i in 0..self.buttons.len() {
            let binding = self.buttons[i];
            if binding.activation == Activation::Press
                && events.contains(&(binding.button, Edge::Rising))
            {
                self.apply(binding.target, &binding.action);
            }
        }
    }

    /// Apply continuous-axis bindings: each axis past the dead zone
    /// nudges its target by `gain * magnitude`.
    pub fn apply_axes(&mut self, frame: &InputFrame) {
        for i in 0..self.axes.len() {
            let binding = self.axes[i];
            let magnitude = frame.axis(binding.axis);
            if magnitude > AXIS_DEADZONE {
                let delta = binding.gain * magnitude;
                self.apply(
                    binding.target,
                    &ChannelAction::AdjustRelative { delta },
                );
            }
        }
    }

    /// Apply hold-activated bindings while their button samples true.
    /// Holds run after presses and axes, so held presets and stick
    /// buttons win within a tick, as on the original robot.
    pub fn apply_holds(&mut self, frame: &InputFrame) {
        for i in 0..self.buttons.len() {
            let binding = self.buttons[i];
            if binding.activation == Activation::Hold && frame.button(binding.button) {
                self.apply(binding.target, &binding.action);
            }
        }
    }

    /// Push every present device's effective command to the bus.
    /// A failed write is logged and absorbed; the tick continues.
    pub fn write_outputs(&mut self, bus: &mut dyn ActuatorBus) {
        for motor in &mut self.motors {
            let channel = &self.power[motor.channel];
            let command = match motor.level {
                Some(level) => channel.command_at(level),
                None => channel.command(),
            };
            motor.last_command = command;
            if !motor.present {
                continue;
            }
            if let Err(err) = bus.write_power(&motor.device, command) {
                warn!(%err, "power write failed; keeping last-known state");
            }
        }
        for servo in &mut self.servos {
            if !servo.present {
                continue;
            }
            if let Err(err) = bus.write_position(&servo.device, servo.channel.command()) {
                warn!(%err, "position write failed; keeping last-known state");
            }
        }
    }

    /// Pull encoder feedback for present motors, convert to RPM, and
    /// fold into each motor's statistics, gated by its channel's
    /// running flag. Failed reads keep the last-known rate.
    pub fn read_feedback(&mut self, bus: &mut dyn ActuatorBus) {
        for motor in &mut self.motors {
            let Some(cpr) = motor.counts_per_rev else {
                continue;
            };
            if !motor.present {
                continue;
            }
            match bus.read_velocity(&motor.device) {
                Ok(Some(ticks_per_s)) => {
                    let rpm = ticks_to_rpm(ticks_per_s, cpr);
                    motor.last_rpm = Some(rpm);
                    let running = self.power[motor.channel].running();
                    motor.stat.fold(rpm, running);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(%err, "velocity read failed; keeping last-known rate");
                }
            }
        }
    }

    /// Status of every actuator at the end of a tick.
    pub fn snapshot(&self, tick: u64, elapsed_s: f64) -> TickSnapshot {
        let mut actuators = Vec::with_capacity(self.motors.len() + self.servos.len());
        for motor in &self.motors {
            let channel = &self.power[motor.channel];
            actuators.push(ActuatorSnapshot {
                name: motor.device.clone(),
                present: motor.present,
                command: motor.last_command,
                running: Some(channel.running()),
                direction: Some(channel.direction()),
                rpm: motor.last_rpm,
                expected_rpm: motor
                    .counts_per_rev
                    .map(|_| expected_rpm(motor.last_command)),
                max_rpm: motor.stat.max(),
                mean_rpm: motor.stat.mean(),
            });
        }
        for servo in &self.servos {
            actuators.push(ActuatorSnapshot {
                name: servo.name.clone(),
                present: servo.present,
                command: servo.channel.command(),
                running: None,
                direction: None,
                rpm: None,
                expected_rpm: None,
                max_rpm: 0.0,
                mean_rpm: 0.0,
            });
        }
        TickSnapshot {
            tick,
            elapsed_s,
            actuators,
        }
    }

    /// Final neutral write: zero power to every present motor, hold
    /// position for every present servo. Runs at most once per rig,
    /// whatever path exits the session.
    pub fn shutdown(&mut self, bus: &mut dyn ActuatorBus) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        for motor in &mut self.motors {
            motor.last_command = 0.0;
            if !motor.present {
                continue;
            }
            if let Err(err) = bus.write_power(&motor.device, 0.0) {
                warn!(%err, "shutdown write failed");
            }
        }
        for servo in &self.servos {
            if !servo.present {
                continue;
            }
            if let Err(err) = bus.write_position(&servo.device, servo.channel.command()) {
                warn!(%err, "shutdown write failed");
            }
        }
        for channel in &mut self.power {
            channel.set_running(false);
        }
    }

    pub fn power_channel(&self, name: &str) -> Option<&PowerChannel> {
        let i = self.power_names.iter().position(|n| n == name)?;
        self.power.get(i)
    }

    pub fn servo_channel(&self, name: &str) -> Option<&PositionChannel> {
        self.servos
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::SimBus;

    fn default_bus() -> SimBus {
        SimBus::new()
            .with_motor("intake_motor")
            .with_motor("shooter_one")
            .with_motor("shooter_two")
            .with_motor("conveyor")
            .with_servo("aim_servo")
    }

    #[test]
    fn default_config_builds() {
        let bus = default_bus();
        let rig = Rig::build(&RigConfig::default(), &bus).unwrap();
        assert_eq!(rig.tick_ms(), 20);
        assert!(rig.power_channel("intake").is_some());
        assert!(rig.power_channel("shooter").is_some());
        assert!(rig.servo_channel("aim").is_some());
        assert_eq!(rig.tracked_buttons().len(), 12);
    }

    #[test]
    fn default_config_round_trips_through_yaml() {
        let config = RigConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = RigConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn unknown_binding_target_is_a_config_error() {
        let mut config = RigConfig::default();
        config.bindings[0].target = ChannelRef::new("nope");
        let err = Rig::build(&config, &default_bus()).unwrap_err();
        assert!(matches!(err, LoopError::Config { .. }));
    }

    #[test]
    fn mismatched_action_is_a_config_error() {
        let mut config = RigConfig::default();
        // Toggle has no meaning for a positional servo.
        config.bindings.push(ButtonBinding {
            button: Button::A,
            activation: Activation::Press,
            target: ChannelRef::new("aim"),
            action: ChannelAction::Toggle,
        });
        let err = Rig::build(&config, &default_bus()).unwrap_err();
        assert!(matches!(err, LoopError::Config { .. }));
    }

    #[test]
    fn inverted_servo_travel_is_rejected() {
        let mut config = RigConfig::default();
        config.servo_channels[0].travel_min = 0.17;
        config.servo_channels[0].travel_max = 0.0;
        assert!(Rig::build(&config, &default_bus()).is_err());
    }

    #[test]
    fn duplicate_channel_names_are_rejected() {
        let mut config = RigConfig::default();
        config.power_channels.push(config.power_channels[0].clone());
        assert!(Rig::build(&config, &default_bus()).is_err());
    }

    #[test]
    fn absent_devices_build_but_skip_io() {
        let bus = SimBus::new().with_motor("intake_motor");
        let mut rig = Rig::build(&RigConfig::default(), &bus).unwrap();
        let mut bus = bus;
        rig.apply_presses(&[(Button::B, Edge::Rising)]);
        rig.write_outputs(&mut bus);
        // Only the present motor was written.
        assert_eq!(bus.writes("intake_motor").len(), 1);
        assert!(bus.writes("shooter_one").is_empty());
        assert!(bus.writes("aim_servo").is_empty());
        let snap = rig.snapshot(0, 0.0);
        assert!(!snap.actuator("shooter_one").unwrap().present);
        assert!(snap.actuator("intake_motor").unwrap().present);
    }

    #[test]
    fn ganged_conveyor_follows_shooter_toggle_at_its_own_level() {
        let mut bus = default_bus();
        let mut rig = Rig::build(&RigConfig::default(), &bus).unwrap();
        rig.apply_presses(&[(Button::B, Edge::Rising)]);
        rig.write_outputs(&mut bus);
        assert_eq!(bus.last_command("shooter_one"), Some(0.5));
        assert_eq!(bus.last_command("shooter_two"), Some(0.5));
        assert_eq!(bus.last_command("conveyor"), Some(0.75));
        assert_eq!(bus.last_command("intake_motor"), Some(0.0));
    }

    #[test]
    fn shutdown_writes_zero_exactly_once() {
        let mut bus = default_bus();
        let mut rig = Rig::build(&RigConfig::default(), &bus).unwrap();
        rig.apply_presses(&[(Button::A, Edge::Rising)]);
        rig.write_outputs(&mut bus);
        assert_eq!(bus.last_command("intake_motor"), Some(0.9));

        rig.shutdown(&mut bus);
        rig.shutdown(&mut bus);
        let writes = bus.writes("intake_motor");
        assert_eq!(writes, &[0.9, 0.0]);
    }
}
