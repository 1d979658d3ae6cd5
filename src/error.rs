//! Error types for Mechanostat
//!
//! Prediction and synthesis are total and never fail. These errors cover
//! configuration loading and dataset encoding only.

use thiserror::Error;

/// Errors that can occur outside the core model
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid model parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid sampling range: {0}")]
    InvalidRange(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl From<csv::Error> for ModelError {
    fn from(e: csv::Error) -> Self {
        ModelError::CsvError(e.to_string())
    }
}
