//! Running feedback statistics.
//!
//! Each feedback-bearing actuator keeps a session-long max and
//! incremental mean of its measured rate. Samples are folded in only
//! while the actuator is actually driven; zero and negative samples are
//! excluded so coast-down readings do not dilute the mean.

use serde::{Deserialize, Serialize};

/// Max-seen and cumulative mean over a gated sample stream.
///
/// The mean is maintained online as `(mean * n + sample) / (n + 1)`.
/// Sample magnitudes are bounded and session counts stay small, so the
/// simple cumulative form is numerically sufficient at f64.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunningStat {
    max: f64,
    mean: f64,
    samples: u64,
}

impl RunningStat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one sample. No-op when the gate is inactive or the
    /// sample is not a positive finite value.
    pub fn fold(&mut self, sample: f64, active: bool) {
        if !active || !sample.is_finite() || sample <= 0.0 {
            return;
        }
        if self.samples == 0 {
            self.mean = sample;
        } else {
            self.mean = (self.mean * self.samples as f64 + sample) / (self.samples as f64 + 1.0);
        }
        self.samples += 1;
        self.max = self.max.max(sample);
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_accumulator_is_all_zero() {
        let stat = RunningStat::new();
        assert_eq!(stat.max(), 0.0);
        assert_eq!(stat.mean(), 0.0);
        assert_eq!(stat.samples(), 0);
    }

    #[test]
    fn single_sample_sets_max_and_mean() {
        let mut stat = RunningStat::new();
        stat.fold(42.0, true);
        assert_eq!(stat.max(), 42.0);
        assert_eq!(stat.mean(), 42.0);
        assert_eq!(stat.samples(), 1);
    }

    #[test]
    fn three_samples_mean_and_max() {
        let mut stat = RunningStat::new();
        for s in [10.0, 20.0, 30.0] {
            stat.fold(s, true);
        }
        assert_eq!(stat.max(), 30.0);
        assert!((stat.mean() - 20.0).abs() < 1e-12);
        assert_eq!(stat.samples(), 3);
    }

    #[test]
    fn inactive_zero_and_negative_samples_are_ignored() {
        let mut stat = RunningStat::new();
        stat.fold(100.0, false);
        stat.fold(0.0, true);
        stat.fold(-5.0, true);
        stat.fold(f64::NAN, true);
        assert_eq!(stat, RunningStat::new());
    }

    proptest! {
        /// The online mean matches the arithmetic mean of the accepted
        /// samples, and max dominates every accepted sample.
        #[test]
        fn online_mean_matches_batch_mean(
            samples in proptest::collection::vec(0.1_f64..6000.0, 1..128)
        ) {
            let mut stat = RunningStat::new();
            for &s in &samples {
                stat.fold(s, true);
            }
            let batch = samples.iter().sum::<f64>() / samples.len() as f64;
            prop_assert!((stat.mean() - batch).abs() < 1e-6 * batch.max(1.0));
            for &s in &samples {
                prop_assert!(stat.max() >= s);
            }
            prop_assert_eq!(stat.samples(), samples.len() as u64);
        }
    }
}
