//! Per-tick status snapshot for the display collaborator.
//!
//! The loop produces one snapshot per tick; rendering (driver-station
//! telemetry, CLI table, JSON lines) is someone else's job.

use od_controls::Direction;
use serde::{Deserialize, Serialize};

/// Status of one actuator at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorSnapshot {
    pub name: String,
    /// Whether the device was found in the physical configuration.
    pub present: bool,
    /// Command written to hardware this tick.
    pub command: f64,
    /// Running flag for toggled motors; `None` for positional servos,
    /// which hold their setpoint and have no off state.
    pub running: Option<bool>,
    /// Persistent direction flag, where the channel carries one.
    pub direction: Option<Direction>,
    /// Last measured shaft rate (RPM). `None` before the first good
    /// read or for devices without encoders.
    pub rpm: Option<f64>,
    /// Free-run rate expected at the current command magnitude.
    pub expected_rpm: Option<f64>,
    /// Session maximum of measured rates folded while running.
    pub max_rpm: f64,
    /// Session mean of measured rates folded while running.
    pub mean_rpm: f64,
}

/// Everything the display needs about one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub elapsed_s: f64,
    pub actuators: Vec<ActuatorSnapshot>,
}

impl TickSnapshot {
    pub fn actuator(&self, name: &str) -> Option<&ActuatorSnapshot> {
        self.actuators.iter().find(|a| a.name == name)
    }
}
