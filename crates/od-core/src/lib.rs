//! od-core: stable foundation for opdrive.
//!
//! Contains:
//! - units (rate conversions for encoder feedback + drive constants)
//! - numeric (Real + tolerances + validated bounds)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{OdError, OdResult};
pub use numeric::*;
pub use units::*;
