//! Error types for Pulsecore

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// API error
    #[error("API error: {0}")]
    Api(String),

    /// A session with this id is already open
    #[error("Session {0} already exists")]
    SessionExists(i64),

    /// No session id is left above the stored maximum
    #[error("Session ids exhausted: highest id is {0}")]
    SessionIdsExhausted(i64),

    /// Blocking database task failed to complete
    #[error("Task error: {0}")]
    Task(String),
}

/// Result type alias for Core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<tokio::task::JoinError> for CoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        CoreError::Task(e.to_string())
    }
}
