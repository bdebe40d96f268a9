//! Data handling for the paralympics dashboard
//!
//! Two record sets back the dashboard: a flat per-edition CSV file and a
//! normalized SQLite database (`event`, `host`, `host_event`). The
//! [`sources`] module reads them into arrow batches; the [`query`] module
//! turns those batches into validated, typed rows.

pub mod config;
pub mod query;
pub mod sample;
pub mod schema;
pub mod sources;

use arrow::error::ArrowError;
use pd_core::ControlError;
use thiserror::Error;

// Re-exports
pub use config::{NullConfig, SourceConfig};
pub use query::{EditionLookup, EditionRecord, GenderRow, LocationRow, QueryLayer, TimeseriesRow};
pub use schema::FlatColumn;
pub use sources::{CsvSource, EditionSource, JoinPredicate, SqliteSource, TabularSource};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Data source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(ArrowError),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("SQLite error: {0}")]
    Sqlite(String),
}

/// Coarse classification used by callers deciding how to react to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Out-of-domain input, rejected before any query ran
    InvalidParameter,
    /// A row or batch broke a structural expectation
    DataIntegrity,
    /// The underlying files or database could not be read
    SourceUnavailable,
}

impl DataError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DataError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            DataError::DataIntegrity(_) | DataError::Arrow(_) => ErrorKind::DataIntegrity,
            DataError::SourceUnavailable { .. }
            | DataError::Schema(_)
            | DataError::Io(_)
            | DataError::Csv(_)
            | DataError::Sqlite(_) => ErrorKind::SourceUnavailable,
        }
    }

    pub(crate) fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        DataError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}

impl From<ArrowError> for DataError {
    fn from(error: ArrowError) -> Self {
        DataError::Arrow(error)
    }
}

impl From<rusqlite::Error> for DataError {
    fn from(error: rusqlite::Error) -> Self {
        DataError::Sqlite(error.to_string())
    }
}

impl From<ControlError> for DataError {
    fn from(error: ControlError) -> Self {
        DataError::InvalidParameter(error.to_string())
    }
}
