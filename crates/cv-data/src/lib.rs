//! Data loading for the coordinated multi-view platform

pub mod config;
pub mod model;
pub mod sources;

use thiserror::Error;
use tokio::task::JoinError;

// Re-exports
pub use config::DatasetConfig;
pub use model::IncidentRow;
pub use sources::CsvSource;

/// Errors that can occur while loading a dataset. Load failures surface to
/// the user; no partial dataset is ever committed.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("record {line}: {message}")]
    Record { line: u64, message: String },

    #[error("dataset contains no usable rows")]
    Empty,

    #[error("config error: {0}")]
    Config(String),

    #[error("join error: {0}")]
    Join(#[from] JoinError),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => {
                DataError::Io(std::io::Error::new(io_err.kind(), error.to_string()))
            }
            _ => DataError::Csv(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(error: serde_json::Error) -> Self {
        DataError::Config(error.to_string())
    }
}
