//! Layered configuration for the coda artifact resolver.
//!
//! Configuration is merged from an explicit, ordered list of sources into a
//! single immutable [`ResolverConfig`]:
//!
//! 1. Built-in defaults (`~/.m2/repository`, Maven Central)
//! 2. A JSON settings file (`CODA_SETTINGS`, `--settings`, or the platform
//!    config directory)
//! 3. Environment variables (`CODA_*`, `HTTP_PROXY`, `HTTPS_PROXY`, `NO_PROXY`)
//! 4. Command-line overrides
//!
//! Repository lists use the compact `url@option@option` grammar described in
//! [`repository`]. A list starting with `+` extends the lower layers instead
//! of replacing them.
//!
//! # Quick Start
//!
//! ```no_run
//! use coda_config::{ConfigLoader, EnvConfig};
//!
//! let config = ConfigLoader::new()
//!     .with_env(EnvConfig::from_process().expect("bad environment"))
//!     .resolve()
//!     .expect("failed to resolve config");
//!
//! for repo in &config.repositories {
//!     println!("{} -> {}", repo.id, repo.url);
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod env;
pub mod error;
pub mod loader;
pub mod mirror;
pub mod proxy;
pub mod repository;
pub mod settings;

pub use auth::{AuthConfig, Credentials};
pub use env::{CodaEnvVar, EnvConfig, parse_bool};
pub use error::{ConfigError, Result};
pub use loader::{CENTRAL, CliOverrides, ConfigLoader, ConfigSource, ResolverConfig};
pub use mirror::{MirrorRule, matches_pattern};
pub use proxy::{ProxyRule, wildcard_match};
pub use repository::{RepositorySpec, parse_repository_list, parse_repository_spec};
pub use settings::Settings;

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::error::{ConfigError, Result};
    pub use crate::loader::{CliOverrides, ConfigLoader, ResolverConfig};
    pub use crate::repository::RepositorySpec;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn central_parses() {
        let central = RepositorySpec::parse(CENTRAL).unwrap();
        assert_eq!(central.id, "central");
        assert!(!central.snapshots_enabled);
    }

    #[test]
    fn env_var_names() {
        assert_eq!(CodaEnvVar::Repositories.as_str(), "CODA_REPOSITORIES");
        assert_eq!(CodaEnvVar::NoProxy.as_str(), "NO_PROXY");
    }
}
