//! Teleop control loop for opdrive.
//!
//! Orchestrates one synchronous pipeline per tick:
//! input frame -> edge events -> channel actions -> hardware writes ->
//! feedback reads -> running statistics -> display snapshot.
//!
//! Hardware access sits behind the [`ActuatorBus`] trait; input polling
//! behind [`InputSource`]. The crate ships a simulated bus for tests
//! and the CLI harness. The loop is single-threaded: the [`Session`]
//! owns every channel and accumulator and mutates them only from
//! within a tick.

pub mod error;
pub mod hardware;
pub mod rig;
pub mod session;
pub mod snapshot;

pub use error::{LoopError, LoopResult};
pub use hardware::{ActuatorBus, BusError, InputSource, ScriptedInput, SimBus};
pub use rig::{MotorDef, PowerChannelDef, Rig, RigConfig, ServoChannelDef};
pub use session::Session;
pub use snapshot::{ActuatorSnapshot, TickSnapshot};
