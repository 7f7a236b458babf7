//! Repository access for the coda artifact resolver.
//!
//! This crate holds everything that sits between resolution logic and the
//! bytes in a repository:
//!
//! - **Metadata**: `maven-metadata.xml` documents, read with `roxmltree`.
//! - **Fetch collaborators**: the [`RepositoryFetcher`] trait plus in-memory,
//!   filesystem and zip archive (`jar:`) implementations. The HTTP
//!   implementation lives in `coda-downloader`.
//! - **Prioritization**: the effective, ordered repository list with mirror
//!   substitution and proxy assignment.
//!
//! ## Example
//!
//! ```no_run
//! use coda_config::ConfigLoader;
//! use coda_repository::EffectiveRepositories;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().resolve()?;
//! let repositories = EffectiveRepositories::from_config(&config);
//! for repo in repositories.all() {
//!     println!("{} {}", repo.id, repo.url);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod error;
pub mod fetcher;
pub mod metadata;
pub mod prioritizer;

pub use archive::JarFetcher;
pub use error::{FetchError, Result};
pub use fetcher::{
    ArtifactStream, FileFetcher, LOCAL_METADATA_FILE, METADATA_FILE, MemoryFetcher,
    RepositoryFetcher, resolve_url,
};
pub use metadata::{Metadata, SnapshotInfo};
pub use prioritizer::{
    build_effective_repositories, expand_multi_repositories, select_mirror, select_proxy,
    supported_mirrors,
};

use coda_config::{ResolverConfig, RepositorySpec};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Both prioritized repository lists of a resolver instance.
///
/// Built once and shared read-only between resolve calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveRepositories {
    /// Searched first.
    pub default_repositories: Vec<RepositorySpec>,
    /// Searched when no default repository yields the artifact.
    pub repositories: Vec<RepositorySpec>,
}

impl EffectiveRepositories {
    /// Expand multi repositories and apply mirrors and proxies to both lists.
    #[must_use]
    pub fn from_config(config: &ResolverConfig) -> Self {
        let prepare = |specs: &[RepositorySpec]| {
            build_effective_repositories(
                &expand_multi_repositories(specs),
                &config.proxies,
                &config.mirrors,
            )
        };
        Self {
            default_repositories: prepare(&config.default_repositories),
            repositories: prepare(&config.repositories),
        }
    }

    /// Every repository, default ones first.
    pub fn all(&self) -> impl Iterator<Item = &RepositorySpec> {
        self.default_repositories.iter().chain(&self.repositories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coda_config::{CliOverrides, ConfigLoader};

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn from_config_applies_mirrors() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("settings.json");
        std::fs::write(
            &settings,
            r#"{"mirrors": [{"id": "corp", "url": "https://corp.example.com/", "mirrorOf": "central"}]}"#,
        )
        .unwrap();
        let config = ConfigLoader::new()
            .with_cli(CliOverrides {
                settings: Some(settings),
                ..CliOverrides::default()
            })
            .resolve()
            .unwrap();

        let repos = EffectiveRepositories::from_config(&config);
        assert_eq!(repos.repositories.len(), 1);
        assert_eq!(repos.repositories[0].id, "corp");
        assert_eq!(repos.repositories[0].mirrored_repositories, ["central"]);
        assert_eq!(repos.all().next().map(|r| r.id.as_str()), Some("local"));
    }
}
