//! Shared application service layer for titrasim.
//!
//! This crate provides one interface for the CLI (or any other front end):
//! configuration loading, the titration engine facade, a timer-driven
//! runner for real-time runs, and batch simulation on a virtual clock.

pub mod config;
pub mod engine;
pub mod error;
pub mod runner;
pub mod simulate;

// Re-export key types for convenience
pub use config::{
    AnalyteConfig, DispensingConfig, EngineConfig, TitrantConfig, ValidatedConfig, load_config,
};
pub use engine::{EngineSnapshot, EngineView, TitrationEngine};
pub use error::{AppError, AppResult};
pub use runner::{EngineReader, EngineRunner, SaveMessage};
pub use simulate::{
    SimulateOptions, SimulateProgress, SimulateResponse, simulate, simulate_with_progress,
    stop_volume_l,
};
