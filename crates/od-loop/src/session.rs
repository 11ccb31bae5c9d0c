//! The per-tick control session.
//!
//! One tick is fully synchronous: sample input, derive edge events,
//! apply bindings, write outputs, read feedback, update statistics,
//! emit a snapshot. Nothing suspends within a tick, and nothing is
//! shared across threads; the session owns the rig exclusively.
//!
//! `run` is sleep-free so tests execute instantly; pacing between
//! ticks (the short fixed inter-tick delay) belongs to the caller.

use crate::hardware::{ActuatorBus, InputSource};
use crate::rig::Rig;
use crate::snapshot::TickSnapshot;
use std::time::Instant;
use tracing::debug;

/// A running teleop session: a built rig plus the per-button edge
/// detectors and the tick counter.
#[derive(Debug)]
pub struct Session {
    rig: Rig,
    edges: od_controls::EdgeBank,
    tick: u64,
    started: Instant,
}

impl Session {
    pub fn new(rig: Rig) -> Self {
        let edges = od_controls::EdgeBank::tracking(rig.tracked_buttons());
        Self {
            rig,
            edges,
            tick: 0,
            started: Instant::now(),
        }
    }

    /// Execute one tick against an already-sampled input frame.
    ///
    /// Order within the tick:
    /// 1. edge events from the frame
    /// 2. press-activated bindings (one application per rising edge)
    /// 3. continuous-axis bindings (proportional nudges)
    /// 4. hold-activated bindings (presets and stick buttons win)
    /// 5. hardware writes (faults logged, never fatal)
    /// 6. feedback reads and statistics
    /// 7. snapshot
    pub fn step(&mut self, bus: &mut dyn ActuatorBus, frame: &od_controls::InputFrame) -> TickSnapshot {
        let events = self.edges.update(frame);
        if !events.is_empty() {
            debug!(tick = self.tick, ?events, "edge events");
        }
        self.rig.apply_presses(&events);
        self.rig.apply_axes(frame);
        self.rig.apply_holds(frame);
        self.rig.write_outputs(bus);
        self.rig.read_feedback(bus);
        let snapshot = self
            .rig
            .snapshot(self.tick, self.started.elapsed().as_secs_f64());
        self.tick += 1;
        snapshot
    }

    /// Drive the session until the input source signals stop, handing
    /// each tick's snapshot to `observe`. On exit, every present
    /// actuator receives its neutral command exactly once.
    pub fn run(
        &mut self,
        bus: &mut dyn ActuatorBus,
        inputs: &mut dyn InputSource,
        observe: &mut dyn FnMut(&TickSnapshot),
    ) {
        while let Some(frame) = inputs.poll() {
            let snapshot = self.step(bus, &frame);
            observe(&snapshot);
        }
        self.rig.shutdown(bus);
    }

    /// Explicit shutdown for callers that stop a session without
    /// exhausting the input source. Idempotent.
    pub fn shutdown(&mut self, bus: &mut dyn ActuatorBus) {
        self.rig.shutdown(bus);
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }
}
