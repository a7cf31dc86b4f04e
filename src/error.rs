//! Error types for Somni Drift

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur while ingesting or analyzing sleep records
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Insufficient data: {provided} days provided, minimum {required} days required")]
    InsufficientData { provided: usize, required: usize },

    #[error("Invalid record at index {index}: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("Failed to parse export: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AnalysisError {
    /// Stable machine-readable code, used by the CLI and FFI error reports
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InsufficientData { .. } => "INSUFFICIENT_DATA",
            AnalysisError::InvalidRecord { .. } => "INVALID_RECORD",
            AnalysisError::ParseError(_) => "PARSE_ERROR",
            AnalysisError::JsonError(_) => "JSON_ERROR",
            AnalysisError::CsvError(_) => "CSV_ERROR",
            AnalysisError::MissingField(_) => "MISSING_FIELD",
            AnalysisError::DateParseError(_) => "DATE_PARSE_ERROR",
            AnalysisError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AnalysisError::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}
