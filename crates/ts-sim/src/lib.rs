//! Time-driven titration run for titrasim.
//!
//! Provides:
//! - Millisecond clocks (wall clock and a manual clock for deterministic runs)
//! - Burette dispensing state machine integrating flow over elapsed time
//! - Curve recorder with volume-based deduplication
//!
//! # Architecture
//!
//! The dispensing controller is the only thing that changes the dispensed
//! volume. Every processed tick recomputes pH from scratch and hands back a
//! [`TitrationPoint`]; the caller decides whether to keep it by passing it to
//! a [`CurveRecorder`].

pub mod clock;
pub mod dispense;
pub mod error;
pub mod recorder;

// Re-exports for public API
pub use clock::{Clock, ManualClock, SystemClock};
pub use dispense::{
    DispenseConfig, DispensePhase, DispensingController, DispensingSession, StartOutcome,
    TickOutcome,
};
pub use error::{SimError, SimResult};
pub use recorder::{CurveRecorder, CurveSummary, DEFAULT_DEDUP_EPSILON_L, TitrationPoint};
