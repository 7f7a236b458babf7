//! Fetch error types.

use std::fmt;
use std::path::PathBuf;

/// Errors raised by a [`crate::RepositoryFetcher`].
///
/// Every variant is a per-repository failure; the orchestrator records it
/// and moves on to the next candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The resource does not exist in the repository.
    NotFound {
        /// URL that was requested.
        url: String,
    },
    /// Network error during fetch.
    Network {
        /// URL that failed.
        url: String,
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },
    /// Authentication required or rejected.
    AuthFailed {
        /// URL that failed.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// Timeout during operation.
    Timeout {
        /// URL that timed out.
        url: String,
    },
    /// Downloaded bytes do not match the published checksum.
    ChecksumMismatch {
        /// URL of the artifact.
        url: String,
        /// Published checksum.
        expected: String,
        /// Checksum of the received bytes.
        actual: String,
    },
    /// Local filesystem error.
    Io {
        /// Path involved.
        path: PathBuf,
        /// Error message.
        message: String,
    },
    /// Metadata document could not be read.
    InvalidMetadata {
        /// URL or path of the document.
        source: String,
        /// Error message.
        message: String,
    },
    /// No fetcher handles this URL scheme.
    UnsupportedScheme {
        /// The URL.
        url: String,
    },
}

impl FetchError {
    /// Create a not-found error.
    #[must_use]
    pub fn not_found(url: impl Into<String>) -> Self {
        Self::NotFound { url: url.into() }
    }

    /// Create a network error without a status code.
    #[must_use]
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create an IO error with context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether the resource was simply absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { url } => write!(f, "Not found: {url}"),
            Self::Network {
                url,
                message,
                status,
            } => {
                if let Some(code) = status {
                    write!(f, "HTTP {code} from {url}: {message}")
                } else {
                    write!(f, "Network error fetching {url}: {message}")
                }
            }
            Self::AuthFailed { url, status } => {
                write!(f, "Authentication failed for {url} (HTTP {status})")
            }
            Self::Timeout { url } => write!(f, "Request to {url} timed out"),
            Self::ChecksumMismatch {
                url,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Checksum mismatch for {url}: expected {expected}, got {actual}"
                )
            }
            Self::Io { path, message } => {
                write!(f, "IO error at {}: {message}", path.display())
            }
            Self::InvalidMetadata { source, message } => {
                write!(f, "Invalid metadata from {source}: {message}")
            }
            Self::UnsupportedScheme { url } => {
                write!(f, "No fetcher for URL scheme of {url}")
            }
        }
    }
}

impl std::error::Error for FetchError {}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
