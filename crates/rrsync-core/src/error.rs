//! Error types for record reconciliation
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for record reconciliation
#[derive(Error, Debug)]
pub enum Error {
    /// The lookup tool failed or could not be run
    #[error("Query failed ({command}): {message}")]
    Query {
        /// Masked command line of the lookup
        command: String,
        /// Tool output or transport error
        message: String,
    },

    /// The update tool rejected or failed to apply a transaction
    #[error("Transaction failed: {message}\nAttempted transaction:\n{payload}")]
    Transaction {
        /// Tool output or transport error
        message: String,
        /// The exact transaction text that was attempted
        payload: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (scratch files, process spawning)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a query error
    pub fn query(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a transaction error carrying the attempted payload
    pub fn transaction(message: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
            payload: payload.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error was raised before anything was sent to the server
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
