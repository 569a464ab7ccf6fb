//! Error types for chemistry configuration.

use thiserror::Error;
use ts_core::TsError;

/// Result type for chemistry operations.
pub type ChemResult<T> = Result<T, ChemError>;

/// Configuration errors raised while building reactant descriptions.
///
/// Runtime arithmetic never produces one of these: zero volumes and
/// vanishing excess are absorbed by the pH model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChemError {
    #[error("Invalid concentration for {what}: {value} mol/L (must be positive and finite)")]
    InvalidConcentration { what: &'static str, value: f64 },

    #[error("Invalid volume for {what}: {value} L (must be non-negative and finite)")]
    InvalidVolume { what: &'static str, value: f64 },

    #[error("Unknown indicator: {name}")]
    UnknownIndicator { name: String },

    #[error("Unknown reactant kind: {name}")]
    UnknownKind { name: String },
}

impl ChemError {
    pub(crate) fn concentration(what: &'static str) -> impl FnOnce(TsError) -> ChemError {
        move |e| ChemError::InvalidConcentration {
            what,
            value: offending_value(&e),
        }
    }

    pub(crate) fn volume(what: &'static str) -> impl FnOnce(TsError) -> ChemError {
        move |e| ChemError::InvalidVolume {
            what,
            value: offending_value(&e),
        }
    }
}

fn offending_value(e: &TsError) -> f64 {
    match e {
        TsError::NonFinite { value, .. }
        | TsError::NotPositive { value, .. }
        | TsError::Negative { value, .. } => *value,
    }
}
