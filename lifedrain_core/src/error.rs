//! Error types for the lifedrain_core library.

use crate::CategoryKey;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lifedrain_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A live meter operation was attempted while no category is active
    #[error("Precondition violated: no category is active")]
    NoActiveCategory,

    /// A category key was activated without being registered first
    #[error("Precondition violated: category {0} is not registered")]
    UnknownCategory(CategoryKey),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed event journal
    #[error("Journal error: {0}")]
    Journal(String),
}

impl Error {
    /// Whether this error is a caller contract violation rather than an
    /// environmental failure.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Error::NoActiveCategory | Error::UnknownCategory(_))
    }
}
