use crate::OdError;

/// Floating point type used throughout the system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, OdError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(OdError::NonFinite { what, value: v })
    }
}

/// Validated ordered interval used for every clamped setpoint.
///
/// Constructed once from configuration; an inverted pair is rejected at
/// build time rather than silently producing a clamp target below the
/// lower endpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    min: Real,
    max: Real,
}

impl Bounds {
    /// Create bounds, requiring `min <= max` and finite endpoints.
    pub fn new(min: Real, max: Real) -> Result<Self, OdError> {
        ensure_finite(min, "bounds min")?;
        ensure_finite(max, "bounds max")?;
        if min > max {
            return Err(OdError::InvalidArg {
                what: "bounds min must not exceed max",
            });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Real {
        self.min
    }

    pub fn max(&self) -> Real {
        self.max
    }

    pub fn span(&self) -> Real {
        self.max - self.min
    }

    /// Saturate a value into the interval. Out-of-range inputs are
    /// never an error; operator input must not crash the loop.
    pub fn clamp(&self, v: Real) -> Real {
        v.clamp(self.min, self.max)
    }

    pub fn contains(&self, v: Real) -> bool {
        v >= self.min && v <= self.max
    }

    /// True if `other` lies entirely inside `self`.
    pub fn encloses(&self, other: &Bounds) -> bool {
        self.min <= other.min && other.max <= self.max
    }
}
