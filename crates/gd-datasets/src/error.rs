//! Error types for gd-datasets.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use gd_core::GeoError;

/// Errors raised while loading or sampling a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{path:?} does not have the expected '.{expected}' extension")]
    WrongExtension { path: PathBuf, expected: &'static str },

    #[error("the provided data does not contain enough valid entries")]
    NoValidEntries,

    #[error("{which} date {date} not found")]
    DateNotFound { which: &'static str, date: NaiveDate },

    #[error("index {index} out of bounds for dataset of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Alias for `Result<T, DatasetError>`.
pub type DatasetResult<T> = Result<T, DatasetError>;
