//! Resolution and graph error types.

use std::fmt;
use thiserror::Error;

/// Why a repository produced no download candidates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CandidateError {
    /// The repository does not serve this kind of version.
    #[error("repository {repository} does not allow {kind}")]
    Policy {
        /// Repository id.
        repository: String,
        /// `releases` or `snapshots`.
        kind: &'static str,
    },

    /// Metadata needed to pick a version was missing or unusable.
    #[error("cannot resolve version in {repository}: {message}")]
    VersionResolution {
        /// Repository id.
        repository: String,
        /// What went wrong.
        message: String,
    },
}

/// One failed download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// Repository id.
    pub repository: String,
    /// Repository-relative path.
    pub path: String,
    /// Failure message.
    pub error: String,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.repository, self.path, self.error)
    }
}

/// Errors returned by a resolve.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Malformed coordinate or repository specification.
    #[error(transparent)]
    Parse(#[from] coda_core::Error),

    /// Every repository was skipped because of its release/snapshot policy.
    #[error("no repository allows {coordinate}: {}", .skipped.join("; "))]
    RepositoryPolicy {
        /// Requested coordinate.
        coordinate: String,
        /// One message per skipped repository.
        skipped: Vec<String>,
    },

    /// A `LATEST` or range request matched nothing in any repository.
    #[error("cannot resolve a version for {coordinate}{}", failure_suffix(.failures))]
    VersionResolution {
        /// Requested coordinate.
        coordinate: String,
        /// One message per repository whose metadata was unusable.
        failures: Vec<String>,
    },

    /// Every candidate failed to download.
    #[error("cannot resolve {coordinate}: {} attempt(s) failed{}", .attempts.len(), attempt_suffix(.attempts))]
    Resolution {
        /// Requested coordinate.
        coordinate: String,
        /// Failed attempts, in order.
        attempts: Vec<Attempt>,
        /// Repositories that produced no candidates, with reasons.
        skipped: Vec<String>,
    },
}

fn failure_suffix(failures: &[String]) -> String {
    if failures.is_empty() {
        String::new()
    } else {
        format!(": {}", failures.join("; "))
    }
}

fn attempt_suffix(attempts: &[Attempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("\n  - {a}"))
        .collect()
}

/// Result type for resolution.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors raised by graph loading and the graph transforms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The root id names no node.
    #[error("root node '{0}' is not defined")]
    UnknownRoot(String),

    /// Two nodes share an id.
    #[error("node id '{0}' is defined more than once")]
    DuplicateNode(String),

    /// An edge refers to an undefined node.
    #[error("edge {from} -> {to} refers to undefined node '{missing}'")]
    MissingNode {
        /// Edge source.
        from: String,
        /// Edge target.
        to: String,
        /// The undefined id.
        missing: String,
    },

    /// A node's scope is not in the precedence table.
    #[error("node '{node}' has scope '{scope}', which is not in the precedence table")]
    UnknownScope {
        /// Node id.
        node: String,
        /// The scope label.
        scope: String,
    },

    /// Malformed graph document.
    #[error("invalid graph document: {0}")]
    Json(String),

    /// Graph document could not be read.
    #[error("io error at {path}: {message}")]
    Io {
        /// File path.
        path: String,
        /// Error message.
        message: String,
    },
}
