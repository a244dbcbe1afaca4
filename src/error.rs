use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataListError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error), // Converts io::Error into DataListError automatically

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Logger error: {0}")]
    Logger(#[from] flexi_logger::FlexiLoggerError),

    #[error("Invalid value for filter '{key}': {reason}")]
    InvalidFilter { key: String, reason: String },

    #[error("Error: {0}")]
    Error(String), // Allows custom application errors
}

impl From<figment::Error> for DataListError {
    fn from(err: figment::Error) -> Self {
        DataListError::Config(Box::new(err))
    }
}

impl DataListError {
    pub fn invalid_filter(key: &str, reason: impl Into<String>) -> Self {
        DataListError::InvalidFilter {
            key: key.to_owned(),
            reason: reason.into(),
        }
    }
}
