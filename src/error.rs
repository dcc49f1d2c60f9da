//! Error handling for load/weather pipeline operations.
//!
//! Fatal conditions (missing inputs, undetectable file formats, failed
//! writes) are errors. Row-level parse problems are not errors at all; they
//! are counted in [`crate::models::NormalizeReport`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid glob pattern: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("No input files matched pattern: {pattern}")]
    InputNotFound { pattern: String },

    #[error("Could not detect delimiter for file: {path}. Columns={columns:?}")]
    FormatDetection { path: PathBuf, columns: Vec<String> },

    #[error("Failed to write {path}: {reason}")]
    WriteFailure { path: PathBuf, reason: String },

    #[error("Artifact not found at path: {path}")]
    ArtifactNotFound { path: PathBuf },

    #[error("Missing column '{column}' in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Column '{column}' in {path} has type {found}, expected {expected}")]
    SchemaMismatch {
        path: PathBuf,
        column: String,
        expected: String,
        found: String,
    },

    #[error("Null value in column '{column}' at row {row} of {path}")]
    NullValue {
        path: PathBuf,
        column: String,
        row: usize,
    },

    #[error("Invalid weather data in {path}: {reason}")]
    InvalidWeather { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl PipelineError {
    /// Wrap any displayable failure as a write failure for `path`
    pub fn write_failure(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::WriteFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
