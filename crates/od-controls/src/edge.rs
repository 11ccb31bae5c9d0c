//! Edge detection over sampled boolean signals.
//!
//! The gamepad layer delivers level state, not events: a held button
//! reads `true` on every tick. Each detector compares the current
//! sample against the previous tick's and emits at most one event per
//! signal per tick; the stored previous value is replaced
//! unconditionally, so a press fires exactly once however long it is
//! held.

use crate::gamepad::{Button, InputFrame};
use std::collections::BTreeMap;

/// A discrete transition derived from two consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Sample went false -> true (button pressed).
    Rising,
    /// Sample went true -> false (button released).
    Falling,
}

/// Detector for a single boolean signal.
#[derive(Debug, Clone, Default)]
pub struct EdgeDetector {
    prev: bool,
}

impl EdgeDetector {
    /// Create a detector with a known initial level. Sessions start
    /// with everything released, so `Default` (false) is the norm.
    pub fn new(initial: bool) -> Self {
        Self { prev: initial }
    }

    /// Fold in this tick's sample. Total function; the only side
    /// effect is replacing the stored previous value.
    pub fn update(&mut self, current: bool) -> Option<Edge> {
        let edge = match (self.prev, current) {
            (false, true) => Some(Edge::Rising),
            (true, false) => Some(Edge::Falling),
            _ => None,
        };
        self.prev = current;
        edge
    }

    pub fn level(&self) -> bool {
        self.prev
    }
}

/// One detector per tracked button.
#[derive(Debug, Clone)]
pub struct EdgeBank {
    detectors: BTreeMap<Button, EdgeDetector>,
}

impl EdgeBank {
    /// Track a specific set of buttons.
    pub fn tracking(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            detectors: buttons
                .into_iter()
                .map(|b| (b, EdgeDetector::default()))
                .collect(),
        }
    }

    /// Track every button.
    pub fn all_buttons() -> Self {
        Self::tracking(Button::ALL)
    }

    /// Run every detector against this tick's frame. Returns at most
    /// one event per button, in stable button order.
    pub fn update(&mut self, frame: &InputFrame) -> Vec<(Button, Edge)> {
        self.detectors
            .iter_mut()
            .filter_map(|(&button, det)| det.update(frame.button(button)).map(|e| (button, e)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rising_then_falling() {
        let mut det = EdgeDetector::default();
        assert_eq!(det.update(true), Some(Edge::Rising));
        assert_eq!(det.update(true), None);
        assert_eq!(det.update(true), None);
        assert_eq!(det.update(false), Some(Edge::Falling));
        assert_eq!(det.update(false), None);
    }

    #[test]
    fn prev_updates_even_without_edge() {
        let mut det = EdgeDetector::new(true);
        assert_eq!(det.update(true), None);
        assert!(det.level());
        assert_eq!(det.update(false), Some(Edge::Falling));
        assert!(!det.level());
    }

    #[test]
    fn bank_emits_one_event_per_button_per_tick() {
        let mut bank = EdgeBank::all_buttons();
        let frame = InputFrame::default()
            .with_button(Button::A, true)
            .with_button(Button::B, true);
        let events = bank.update(&frame);
        assert_eq!(events.len(), 2);
        assert!(events.contains(&(Button::A, Edge::Rising)));
        assert!(events.contains(&(Button::B, Edge::Rising)));

        // Held: no further events.
        assert!(bank.update(&frame).is_empty());

        // Release both.
        let events = bank.update(&InputFrame::default());
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|&(_, e)| e == Edge::Falling));
    }

    #[test]
    fn bank_ignores_untracked_buttons() {
        let mut bank = EdgeBank::tracking([Button::A]);
        let frame = InputFrame::default().with_button(Button::B, true);
        assert!(bank.update(&frame).is_empty());
    }

    proptest! {
        /// For any boolean sample sequence, the detector emits exactly
        /// one Rising per false->true transition, one Falling per
        /// true->false transition, and nothing for repeats.
        #[test]
        fn edges_match_transitions(samples in proptest::collection::vec(any::<bool>(), 0..64)) {
            let mut det = EdgeDetector::default();
            let mut prev = false;
            for &s in &samples {
                let expected = match (prev, s) {
                    (false, true) => Some(Edge::Rising),
                    (true, false) => Some(Edge::Falling),
                    _ => None,
                };
                prop_assert_eq!(det.update(s), expected);
                prev = s;
            }
        }
    }
}
