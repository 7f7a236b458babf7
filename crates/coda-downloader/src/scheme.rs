//! Dispatch fetches by URL scheme.

use crate::{DownloadError, DownloadOptions, HttpFetcher};
use ahash::AHashMap;
use coda_config::{ProxyRule, ResolverConfig};
use coda_repository::{
    ArtifactStream, FetchError, FileFetcher, JarFetcher, Metadata, RepositoryFetcher,
};
use std::sync::Arc;
use url::Url;

/// Routes each request to the fetcher registered for the repository's URL
/// scheme.
#[derive(Clone, Default)]
pub struct SchemeFetcher {
    fetchers: AHashMap<String, Arc<dyn RepositoryFetcher>>,
}

impl std::fmt::Debug for SchemeFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemes: Vec<_> = self.fetchers.keys().collect();
        schemes.sort();
        f.debug_struct("SchemeFetcher")
            .field("schemes", &schemes)
            .finish()
    }
}

impl SchemeFetcher {
    /// Create a dispatcher with no schemes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `file:`, `jar:` archives, plus `http:`/`https:` sharing one
    /// [`HttpFetcher`].
    #[must_use]
    pub fn standard(http: HttpFetcher) -> Self {
        let http: Arc<dyn RepositoryFetcher> = Arc::new(http);
        Self::new()
            .with_scheme("file", Arc::new(FileFetcher::new()))
            .with_scheme("jar", Arc::new(JarFetcher::new()))
            .with_scheme("http", Arc::clone(&http))
            .with_scheme("https", http)
    }

    /// Standard dispatcher configured from resolver settings: timeouts,
    /// credentials, and hosts of repositories marked `allowinsecure`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn from_config(config: &ResolverConfig) -> Result<Self, DownloadError> {
        let options = DownloadOptions {
            connect_timeout: config.connect_timeout,
            read_timeout: config.read_timeout,
            ..DownloadOptions::default()
        };
        let insecure_hosts = config
            .default_repositories
            .iter()
            .chain(&config.repositories)
            .filter(|r| r.allow_insecure)
            .filter_map(|r| r.url.host_str().map(str::to_string));
        let http = HttpFetcher::new(options, Some(config.auth.clone()))?
            .with_insecure_hosts(insecure_hosts);
        Ok(Self::standard(http))
    }

    /// Register a fetcher for a scheme, replacing any previous one.
    #[must_use]
    pub fn with_scheme(mut self, scheme: &str, fetcher: Arc<dyn RepositoryFetcher>) -> Self {
        self.fetchers.insert(scheme.to_ascii_lowercase(), fetcher);
        self
    }

    /// Whether a fetcher is registered for the URL's scheme.
    #[must_use]
    pub fn supports(&self, url: &Url) -> bool {
        self.fetchers.contains_key(url.scheme())
    }

    fn fetcher(&self, url: &Url) -> Result<&dyn RepositoryFetcher, FetchError> {
        self.fetchers
            .get(url.scheme())
            .map(AsRef::as_ref)
            .ok_or_else(|| FetchError::UnsupportedScheme {
                url: url.to_string(),
            })
    }
}

impl RepositoryFetcher for SchemeFetcher {
    fn fetch_metadata(
        &self,
        repository: &Url,
        path: &str,
        proxy: Option<&ProxyRule>,
    ) -> Result<Metadata, FetchError> {
        self.fetcher(repository)?
            .fetch_metadata(repository, path, proxy)
    }

    fn fetch_artifact(
        &self,
        repository: &Url,
        path: &str,
        proxy: Option<&ProxyRule>,
    ) -> Result<ArtifactStream, FetchError> {
        self.fetcher(repository)?
            .fetch_artifact(repository, path, proxy)
    }
}
