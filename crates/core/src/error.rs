//! Error types for the BookMyRoom core crate.

use thiserror::Error;

/// Top-level error type for all BookMyRoom core operations.
#[derive(Debug, Error)]
pub enum BmrError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid {field} '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// A convenience Result alias that defaults to [`BmrError`].
pub type Result<T> = std::result::Result<T, BmrError>;
