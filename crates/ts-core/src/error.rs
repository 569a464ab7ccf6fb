use thiserror::Error;

pub type TsResult<T> = Result<T, TsError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TsError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Value for {what} must be positive, got {value}")]
    NotPositive { what: &'static str, value: f64 },

    #[error("Value for {what} must be non-negative, got {value}")]
    Negative { what: &'static str, value: f64 },
}
