//! Error types for the notebook pipeline

use thiserror::Error;

/// Result type alias for notebook operations
pub type Result<T> = std::result::Result<T, NotebookError>;

/// Errors raised by the load → split → fit → evaluate stages.
///
/// None of these are recovered automatically: each one aborts the chapter
/// that raised it.
#[derive(Error, Debug)]
pub enum NotebookError {
    /// Missing or malformed input file, inconsistent columns, wrong value types
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// A split range or sample size exceeds the table
    #[error("Index out of range: [{start}, {end}) exceeds {rows} rows")]
    IndexOutOfRange {
        start: usize,
        end: usize,
        rows: usize,
    },

    /// Invalid target or hyperparameter combination, or no learner binding
    #[error("Fit error: {0}")]
    Fit(String),

    /// Model and evaluation data do not match
    #[error("Predict error: {0}")]
    Predict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl NotebookError {
    pub(crate) fn column_not_found(name: &str) -> Self {
        NotebookError::DataFormat(format!("column '{}' not found", name))
    }
}

impl From<polars::error::PolarsError> for NotebookError {
    fn from(err: polars::error::PolarsError) -> Self {
        NotebookError::DataFormat(err.to_string())
    }
}

impl From<serde_json::Error> for NotebookError {
    fn from(err: serde_json::Error) -> Self {
        NotebookError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for NotebookError {
    fn from(err: ndarray::ShapeError) -> Self {
        NotebookError::DataFormat(format!("invalid shape: {}", err))
    }
}
