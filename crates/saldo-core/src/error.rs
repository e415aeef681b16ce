//! Error types for Saldo

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unparseable statement format: {0}")]
    UnparseableFormat(String),

    #[error("No date column found")]
    NoDateColumn,

    #[error("No value column found")]
    NoValueColumn,

    #[error("Could not decode file with any of: {0}")]
    DecodeFailure(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
