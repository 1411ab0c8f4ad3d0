//! Error types for fireclass
//!
//! Only document-level failures are errors. A rule that does not match, a
//! malformed condition cell or a value of the wrong kind is an ordinary
//! evaluation outcome and never surfaces here.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// fireclass errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Table parse error: {0}")]
    TableParse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Decision table not found: {0}")]
    TableNotFound(String),

    #[error("Failed to load model {}: {message}", path.display())]
    Loader { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn loader(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Loader {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
