//! Fetch collaborators for the coda artifact resolver.
//!
//! - [`HttpFetcher`]: blocking `reqwest` client with per-repository proxies,
//!   host credentials, retries on server errors, and `.sha1` verification.
//! - [`SchemeFetcher`]: routes each request by URL scheme (`file`, `http`,
//!   `https`, or anything registered).

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod scheme;

pub use client::{HttpFetcher, SHA1_SUFFIX, parse_checksum};
pub use scheme::SchemeFetcher;

use std::time::Duration;
use thiserror::Error;

/// Errors building an HTTP fetcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    /// The HTTP client could not be built.
    #[error("cannot build HTTP client: {0}")]
    Client(String),

    /// A proxy rule could not be turned into a client proxy.
    #[error("invalid proxy {endpoint}: {message}")]
    Proxy {
        /// Proxy endpoint.
        endpoint: String,
        /// Error message.
        message: String,
    },
}

/// Download options.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Read timeout.
    pub read_timeout: Duration,
    /// Number of retries after a server error or timeout.
    pub retries: u32,
    /// Verify artifacts against their `.sha1` side file when one exists.
    pub verify_checksum: bool,
    /// `User-Agent` header.
    pub user_agent: String,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            retries: 2,
            verify_checksum: true,
            user_agent: format!("coda/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_options_default() {
        let opts = DownloadOptions::default();
        assert_eq!(opts.connect_timeout, Duration::from_secs(10));
        assert_eq!(opts.read_timeout, Duration::from_secs(60));
        assert!(opts.verify_checksum);
        assert!(opts.user_agent.starts_with("coda/"));
    }
}
