//! Error types for coda core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for core parsing and validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed coordinate, version or repository specification.
    #[error("parse error at '{token}': {message}")]
    Parse {
        /// The offending token.
        token: String,
        /// What was wrong with it.
        message: String,
    },

    /// Invalid scope precedence table.
    #[error("invalid scope precedence: {0}")]
    ScopePrecedence(String),

    /// IO error.
    #[error("io error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Create a parse error for an offending token.
    #[must_use]
    pub fn parse(token: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            token: token.into(),
            message: message.into(),
        }
    }

    /// Create an IO error with context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether this is a parse error.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
