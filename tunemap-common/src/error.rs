//! Common error types for tunemap

use thiserror::Error;

/// Common result type for tunemap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across tunemap crates
#[derive(Error, Debug)]
pub enum Error {
    /// Raw chart rows or region geometry were malformed (fatal, aborts dashboard construction)
    #[error("Data load error: {0}")]
    DataLoad(#[from] DataLoadError),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error (geometry files)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV decoding error (chart files)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Reasons a dataset is rejected by the record store
///
/// Line numbers are 1-based data rows (the header is not counted).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataLoadError {
    /// A required column is absent from the header
    #[error("missing required column '{column}'")]
    MissingColumn { column: String },

    /// A row is shorter than the header
    #[error("row {line}: expected {expected} fields, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Rank or feature field did not parse as a number
    #[error("row {line}: column '{column}' is not numeric: '{value}'")]
    NonNumeric {
        line: usize,
        column: String,
        value: String,
    },

    /// Rank below 1
    #[error("row {line}: rank {rank} is out of range (must be >= 1)")]
    RankOutOfRange { line: usize, rank: i64 },

    /// Audio feature outside [0, 1]
    #[error("row {line}: feature '{column}' value {value} is outside [0, 1]")]
    FeatureOutOfRange {
        line: usize,
        column: String,
        value: f64,
    },

    /// Week key is not a YYYY-MM-DD date
    #[error("row {line}: week '{value}' is not a YYYY-MM-DD date")]
    InvalidWeek { line: usize, value: String },

    /// Geometry feature without a usable region name
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}
