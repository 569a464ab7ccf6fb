//! Error types for the ts-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates
/// and gives the CLI (or any other front end) one error interface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Operation not allowed: {what}")]
    InvalidState { what: &'static str },

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ts-app operations.
pub type AppResult<T> = Result<T, AppError>;

// Conversions from backend error types
impl From<ts_core::TsError> for AppError {
    fn from(err: ts_core::TsError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl From<ts_chem::ChemError> for AppError {
    fn from(err: ts_chem::ChemError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl From<ts_sim::SimError> for AppError {
    fn from(err: ts_sim::SimError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl From<ts_results::ResultsError> for AppError {
    fn from(err: ts_results::ResultsError) -> Self {
        AppError::Persistence(err.to_string())
    }
}
