//! ts-results: experiment records, storage and curve export.

pub mod export;
pub mod store;
pub mod types;

pub use export::{CSV_HEADER, export_csv, format_timestamp, write_csv};
pub use store::{ExperimentStore, JsonFileStore, MemoryStore};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Experiment not found: {id}")]
    ExperimentNotFound { id: String },

    #[error("Invalid experiment id: {id}")]
    InvalidId { id: String },

    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}
