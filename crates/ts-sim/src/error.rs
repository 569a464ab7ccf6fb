//! Error types for run configuration.

use thiserror::Error;

/// Errors encountered while configuring a dispensing run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

pub type SimResult<T> = Result<T, SimError>;
