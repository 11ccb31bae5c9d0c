//! Hardware bus abstraction and the simulated bus.
//!
//! The real robot talks to motor controllers and servos through a
//! vendor layer; this crate only sees the [`ActuatorBus`] seam.
//! Writes are fire-and-forget, reads return promptly, and a fault on
//! a single tick is non-fatal to the session.

use od_controls::InputFrame;
use od_core::units::constants::{ENCODER_CPR, FREE_RUN_RPM};
use std::collections::BTreeMap;
use thiserror::Error;

/// One failed write or read. The loop logs it and proceeds with the
/// last-known value for that device.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("bus I/O failure on {device}: {what}")]
pub struct BusError {
    pub device: String,
    pub what: String,
}

impl BusError {
    pub fn new(device: impl Into<String>, what: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            what: what.into(),
        }
    }
}

/// Synchronous access to the actuator hardware.
pub trait ActuatorBus {
    /// Whether the named device exists in the physical configuration.
    /// Probed once at rig build; absent devices are skipped for every
    /// subsequent write and read.
    fn is_present(&self, device: &str) -> bool;

    /// Command a motor power in [-1, 1].
    fn write_power(&mut self, device: &str, value: f64) -> Result<(), BusError>;

    /// Command a servo position in [0, 1].
    fn write_position(&mut self, device: &str, value: f64) -> Result<(), BusError>;

    /// Read an encoder velocity in counts per second. `Ok(None)` means
    /// the device carries no encoder.
    fn read_velocity(&mut self, device: &str) -> Result<Option<f64>, BusError>;
}

/// Per-tick input sampling. `None` is the session-stop signal, checked
/// once per tick before any other work.
pub trait InputSource {
    fn poll(&mut self) -> Option<InputFrame>;
}

/// Replays a fixed sequence of frames, then stops the session.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: Vec<InputFrame>,
    cursor: usize,
}

impl ScriptedInput {
    pub fn new(frames: Vec<InputFrame>) -> Self {
        Self { frames, cursor: 0 }
    }

    /// Append `frame` repeated for `ticks` ticks.
    pub fn hold(mut self, frame: InputFrame, ticks: usize) -> Self {
        self.frames.extend(std::iter::repeat_n(frame, ticks));
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Option<InputFrame> {
        let frame = self.frames.get(self.cursor).copied();
        self.cursor += 1;
        frame
    }
}

#[derive(Debug, Clone)]
struct SimDevice {
    /// Last commanded value (power or position).
    command: f64,
    /// Simulated encoder velocity, counts per second.
    velocity: f64,
    /// Free-run velocity at full command, counts per second.
    free_run: f64,
    has_encoder: bool,
    /// Every value ever written, for exactly-once assertions.
    writes: Vec<f64>,
    fail_next_write: bool,
    fail_next_read: bool,
}

impl SimDevice {
    fn motor() -> Self {
        Self {
            command: 0.0,
            velocity: 0.0,
            free_run: FREE_RUN_RPM / 60.0 * ENCODER_CPR,
            has_encoder: true,
            writes: Vec::new(),
            fail_next_write: false,
            fail_next_read: false,
        }
    }

    fn servo() -> Self {
        Self {
            command: 0.0,
            velocity: 0.0,
            free_run: 0.0,
            has_encoder: false,
            writes: Vec::new(),
            fail_next_write: false,
            fail_next_read: false,
        }
    }
}

/// In-memory bus with a first-order velocity response, used by tests
/// and the CLI harness.
///
/// Each motor's simulated encoder approaches `command x free-run
/// velocity` by a fixed fraction per write. Devices can be marked
/// absent (to exercise the optional-hardware path) or told to fail
/// their next write or read once (to exercise the non-fatal fault
/// path).
#[derive(Debug, Clone, Default)]
pub struct SimBus {
    devices: BTreeMap<String, SimDevice>,
    /// Blend factor per write toward the target velocity, in (0, 1].
    response: f64,
}

impl SimBus {
    pub fn new() -> Self {
        Self {
            devices: BTreeMap::new(),
            response: 0.5,
        }
    }

    pub fn with_motor(mut self, device: impl Into<String>) -> Self {
        self.devices.insert(device.into(), SimDevice::motor());
        self
    }

    pub fn with_servo(mut self, device: impl Into<String>) -> Self {
        self.devices.insert(device.into(), SimDevice::servo());
        self
    }

    /// Instantly-responding variant for deterministic tests.
    pub fn with_response(mut self, response: f64) -> Self {
        self.response = response.clamp(1e-3, 1.0);
        self
    }

    pub fn fail_next_write(&mut self, device: &str) {
        if let Some(dev) = self.devices.get_mut(device) {
            dev.fail_next_write = true;
        }
    }

    pub fn fail_next_read(&mut self, device: &str) {
        if let Some(dev) = self.devices.get_mut(device) {
            dev.fail_next_read = true;
        }
    }

    /// Last value written to the device, if any.
    pub fn last_command(&self, device: &str) -> Option<f64> {
        self.devices
            .get(device)
            .and_then(|d| d.writes.last().copied())
    }

    /// Every value ever written to the device, in order.
    pub fn writes(&self, device: &str) -> &[f64] {
        self.devices
            .get(device)
            .map(|d| d.writes.as_slice())
            .unwrap_or(&[])
    }

    fn write(&mut self, device: &str, value: f64) -> Result<(), BusError> {
        let Some(dev) = self.devices.get_mut(device) else {
            return Err(BusError::new(device, "no such device"));
        };
        if dev.fail_next_write {
            dev.fail_next_write = false;
            return Err(BusError::new(device, "injected write fault"));
        }
        dev.command = value;
        dev.writes.push(value);
        if dev.has_encoder {
            let target = value.abs() * dev.free_run;
            dev.velocity += self.response * (target - dev.velocity);
        }
        Ok(())
    }
}

impl ActuatorBus for SimBus {
    fn is_present(&self, device: &str) -> bool {
        self.devices.contains_key(device)
    }

    fn write_power(&mut self, device: &str, value: f64) -> Result<(), BusError> {
        self.write(device, value)
    }

    fn write_position(&mut self, device: &str, value: f64) -> Result<(), BusError> {
        self.write(device, value)
    }

    fn read_velocity(&mut self, device: &str) -> Result<Option<f64>, BusError> {
        let Some(dev) = self.devices.get_mut(device) else {
            return Err(BusError::new(device, "no such device"));
        };
        if dev.fail_next_read {
            dev.fail_next_read = false;
            return Err(BusError::new(device, "injected read fault"));
        }
        Ok(dev.has_encoder.then_some(dev.velocity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use od_core::units::ticks_to_rpm;

    #[test]
    fn scripted_input_stops_after_last_frame() {
        let mut input = ScriptedInput::default().hold(InputFrame::default(), 2);
        assert!(input.poll().is_some());
        assert!(input.poll().is_some());
        assert!(input.poll().is_none());
    }

    #[test]
    fn sim_motor_velocity_approaches_free_run() {
        let mut bus = SimBus::new().with_motor("m1");
        for _ in 0..64 {
            bus.write_power("m1", 1.0).unwrap();
        }
        let v = bus.read_velocity("m1").unwrap().unwrap();
        let rpm = ticks_to_rpm(v, ENCODER_CPR);
        assert!(rpm > 0.95 * FREE_RUN_RPM, "rpm = {rpm}");
        assert!(rpm <= FREE_RUN_RPM + 1e-9);
    }

    #[test]
    fn sim_servo_has_no_encoder() {
        let mut bus = SimBus::new().with_servo("s1");
        bus.write_position("s1", 0.1).unwrap();
        assert_eq!(bus.read_velocity("s1").unwrap(), None);
        assert_eq!(bus.last_command("s1"), Some(0.1));
    }

    #[test]
    fn injected_faults_fire_once() {
        let mut bus = SimBus::new().with_motor("m1");
        bus.fail_next_write("m1");
        assert!(bus.write_power("m1", 0.5).is_err());
        assert!(bus.write_power("m1", 0.5).is_ok());
        bus.fail_next_read("m1");
        assert!(bus.read_velocity("m1").is_err());
        assert!(bus.read_velocity("m1").is_ok());
    }

    #[test]
    fn unknown_device_is_absent_and_errors() {
        let mut bus = SimBus::new();
        assert!(!bus.is_present("ghost"));
        assert!(bus.write_power("ghost", 1.0).is_err());
    }
}
