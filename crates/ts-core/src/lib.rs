//! ts-core: stable foundation for titrasim.
//!
//! Contains:
//! - units (uom SI types + constructors for lab-scale quantities)
//! - numeric (validation and clamping helpers for raw floats)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{TsError, TsResult};
pub use numeric::*;
pub use units::*;
