// od-core/src/units.rs

use uom::si::angular_velocity::{radian_per_second, revolution_per_minute};
use uom::si::f64::AngularVelocity as UomAngularVelocity;

/// Canonical shaft-rate type (SI, f64)
pub type Rate = UomAngularVelocity;

#[inline]
pub fn rpm(v: f64) -> Rate {
    Rate::new::<revolution_per_minute>(v)
}

#[inline]
pub fn radps(v: f64) -> Rate {
    Rate::new::<radian_per_second>(v)
}

#[inline]
pub fn as_rpm(r: Rate) -> f64 {
    r.get::<revolution_per_minute>()
}

/// Convert a raw encoder velocity (counts per second, either sign) to a
/// shaft rate in RPM. Feedback magnitude only; direction is reported
/// separately by the channel flags.
#[inline]
pub fn ticks_to_rpm(ticks_per_s: f64, counts_per_rev: f64) -> f64 {
    (ticks_per_s.abs() * 60.0) / counts_per_rev
}

pub mod constants {
    /// Native encoder resolution of the drive motors (counts/rev).
    pub const ENCODER_CPR: f64 = 537.0;

    /// Bare motor free-run speed at nominal voltage (RPM).
    pub const BARE_MOTOR_RPM: f64 = 5800.0;

    /// Output gearing (1:1 direct drive).
    pub const GEAR_RATIO: f64 = 1.0;

    /// Output-shaft free-run speed at nominal voltage (RPM).
    pub const FREE_RUN_RPM: f64 = BARE_MOTOR_RPM / GEAR_RATIO;

    pub const NOMINAL_VOLTAGE: f64 = 12.0;

    /// Free-run shaft speed expected at a given commanded power.
    #[inline]
    pub fn expected_rpm(power: f64) -> f64 {
        FREE_RUN_RPM * power.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_constructors_round_trip() {
        let r = rpm(5800.0);
        assert!((as_rpm(r) - 5800.0).abs() < 1e-9);
        let w = radps(core::f64::consts::TAU);
        assert!((as_rpm(w) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn ticks_conversion_matches_telemetry_formula() {
        // 537 counts/s on a 537-CPR encoder is one rev per second.
        assert!((ticks_to_rpm(537.0, constants::ENCODER_CPR) - 60.0).abs() < 1e-9);
        // Sign of the raw velocity is discarded.
        assert!((ticks_to_rpm(-537.0, constants::ENCODER_CPR) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn expected_rpm_scales_with_power() {
        assert_eq!(constants::expected_rpm(1.0), constants::FREE_RUN_RPM);
        assert_eq!(constants::expected_rpm(0.5), constants::FREE_RUN_RPM * 0.5);
        assert_eq!(constants::expected_rpm(-0.9), constants::FREE_RUN_RPM * 0.9);
    }
}
