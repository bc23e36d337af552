//! Error types for Framedash core functionality.

use thiserror::Error;

/// Main error type for Framedash.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Dashboard document could not be parsed.
    #[error("Document error: {0}")]
    Document(#[from] serde_json::Error),
    #[error("Data parsing error: {0}")]
    Parse(String),
    #[error("Invalid URL: {0}")]
    Url(String),
    #[error("Invalid allow-list entry: {0}")]
    AllowList(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("File system error: {0}")]
    FileSystem(String),
}

/// Result type for Framedash operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a URL error
    pub fn url(msg: impl Into<String>) -> Self {
        Self::Url(msg.into())
    }

    /// Create an allow-list error
    pub fn allow_list(msg: impl Into<String>) -> Self {
        Self::AllowList(msg.into())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Url(err.to_string())
    }
}
