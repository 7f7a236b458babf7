//! Configuration error types.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Malformed repository specification or other parsed value.
    #[error(transparent)]
    Parse(#[from] coda_core::Error),

    /// Settings file could not be read.
    #[error("io error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Settings file is not valid JSON for the settings schema.
    #[error("invalid settings file {path}: {message}")]
    Json {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// A value was well-formed but not acceptable.
    #[error("invalid value for {field}: {message}")]
    Invalid {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    /// Create an IO error with context.
    #[must_use]
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Create a JSON error with context.
    #[must_use]
    pub fn json(path: &Path, err: &sonic_rs::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
