//! Error types for CLI operations.

use thiserror::Error;

/// Main error type for CLI operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dashboard document could not be loaded.
    #[error("Document error: {0}")]
    Document(String),

    /// Network error.
    #[error("Network error: {0}")]
    Network(String),

    /// Server error.
    #[error("Server error: {0}")]
    Server(String),

    /// Validation found problems.
    #[error("{0}")]
    Validation(String),

    /// Invalid argument error.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<framedash_core::Error> for CliError {
    fn from(err: framedash_core::Error) -> Self {
        match err {
            framedash_core::Error::Config(msg) => CliError::Config(msg),
            framedash_core::Error::Io(e) => CliError::Io(e),
            other => CliError::Document(other.to_string()),
        }
    }
}

impl From<framedash_web::WebError> for CliError {
    fn from(err: framedash_web::WebError) -> Self {
        match err {
            framedash_web::WebError::Fetch(e) => CliError::Network(e.to_string()),
            framedash_web::WebError::Document(msg) => CliError::Document(msg),
            framedash_web::WebError::Core(e) => e.into(),
            other => CliError::Server(other.to_string()),
        }
    }
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
