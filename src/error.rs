//! Configuration error types

use thiserror::Error;

/// Problems with the column mapping, reported before any computation runs.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Column mapping missing for {0}")]
    MissingMapping(&'static str),

    #[error("Price points are required for Gabor-Granger analysis")]
    NoPricePoints,

    #[error("Price point {0} is not a finite number")]
    InvalidPricePoint(f64),

    #[error("Price point {0} is listed more than once")]
    DuplicatePricePoint(f64),

    #[error("Missing purchase intent mappings for price points: {0}")]
    MissingIntentMappings(String),

    #[error("Intent threshold must be a finite number")]
    InvalidIntentThreshold,

    #[error("Column `{column}` mapped for {role} is not present in the data file")]
    UnknownColumn { role: String, column: String },
}
