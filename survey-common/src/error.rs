//! Common error types for survey conversion

use crate::transform::TransformError;
use std::path::PathBuf;
use thiserror::Error;

/// Common result type for survey conversion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a conversion run
#[derive(Error, Debug)]
pub enum Error {
    /// Survey file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Survey file is not valid JSON
    #[error("Invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Transform rejected the survey document
    #[error("Transform failed for {}: {source}", path.display())]
    Transform {
        path: PathBuf,
        #[source]
        source: TransformError,
    },

    /// Converted document could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Converted survey could not be written
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
