//! Fetch collaborators.
//!
//! The resolver never touches the network or the filesystem itself. It asks
//! a [`RepositoryFetcher`] for metadata documents and artifact bytes, given a
//! repository base URL and a repository-relative path.

use crate::error::{FetchError, Result};
use crate::metadata::Metadata;
use ahash::AHashMap;
use bytes::Bytes;
use coda_config::ProxyRule;
use parking_lot::RwLock;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use url::Url;

/// Name of remote metadata documents.
pub const METADATA_FILE: &str = "maven-metadata.xml";

/// Name of metadata documents written by local builds.
pub const LOCAL_METADATA_FILE: &str = "maven-metadata-local.xml";

/// Artifact bytes.
pub type ArtifactStream = Box<dyn Read + Send>;

/// Supplies metadata and artifacts from repositories.
///
/// Implementations are synchronous and may block for a network round trip.
pub trait RepositoryFetcher: Send + Sync {
    /// Fetch and parse the metadata document at `path` under `repository`,
    /// going through `proxy` when given.
    ///
    /// # Errors
    /// Returns [`FetchError::NotFound`] if the document does not exist, or
    /// another variant on transport or parse failure.
    fn fetch_metadata(
        &self,
        repository: &Url,
        path: &str,
        proxy: Option<&ProxyRule>,
    ) -> Result<Metadata>;

    /// Open the artifact at `path` under `repository`, going through `proxy`
    /// when given.
    ///
    /// # Errors
    /// Returns [`FetchError::NotFound`] if the artifact does not exist, or
    /// another variant on transport or integrity failure.
    fn fetch_artifact(
        &self,
        repository: &Url,
        path: &str,
        proxy: Option<&ProxyRule>,
    ) -> Result<ArtifactStream>;
}

/// Join a repository-relative path onto a base URL.
///
/// Opaque bases such as `jar:file:/r.zip!/repo/` are joined textually.
///
/// # Errors
/// Returns [`FetchError::Network`] if the result is not a valid URL.
pub fn resolve_url(repository: &Url, path: &str) -> Result<Url> {
    let path = path.trim_start_matches('/');
    let joined = if repository.cannot_be_a_base() {
        let base = repository.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{path}"))
    } else {
        repository.join(path)
    };
    joined.map_err(|e| FetchError::network(format!("{repository}{path}"), e.to_string()))
}

/// An in-memory repository set, keyed by full URL.
///
/// Useful for embedding and tests. Every request is recorded in order, and
/// requests made through a proxy are recorded a second time with the proxy id.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    entries: RwLock<AHashMap<String, Entry>>,
    requests: RwLock<Vec<String>>,
    proxied: RwLock<Vec<(String, String)>>,
}

#[derive(Debug, Clone)]
enum Entry {
    Content(Bytes),
    Failure(String),
}

impl MemoryFetcher {
    /// Create an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes at `path` under `repository`.
    pub fn insert(&self, repository: &str, path: &str, content: impl Into<Bytes>) {
        self.entries
            .write()
            .insert(key(repository, path), Entry::Content(content.into()));
    }

    /// Make requests for `path` under `repository` fail with a network error.
    pub fn fail(&self, repository: &str, path: &str, message: impl Into<String>) {
        self.entries
            .write()
            .insert(key(repository, path), Entry::Failure(message.into()));
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.read().clone()
    }

    /// `(proxy id, URL)` of every request made through a proxy, in order.
    #[must_use]
    pub fn proxied(&self) -> Vec<(String, String)> {
        self.proxied.read().clone()
    }

    fn get(&self, repository: &Url, path: &str, proxy: Option<&ProxyRule>) -> Result<Bytes> {
        let url = resolve_url(repository, path)?.to_string();
        self.requests.write().push(url.clone());
        if let Some(proxy) = proxy {
            self.proxied.write().push((proxy.id.clone(), url.clone()));
        }
        match self.entries.read().get(&url) {
            Some(Entry::Content(bytes)) => Ok(bytes.clone()),
            Some(Entry::Failure(message)) => Err(FetchError::network(url, message.clone())),
            None => Err(FetchError::not_found(url)),
        }
    }
}

fn key(repository: &str, path: &str) -> String {
    let base = repository.trim_end_matches('/');
    format!("{base}/{}", path.trim_start_matches('/'))
}

impl RepositoryFetcher for MemoryFetcher {
    fn fetch_metadata(
        &self,
        repository: &Url,
        path: &str,
        proxy: Option<&ProxyRule>,
    ) -> Result<Metadata> {
        let bytes = self.get(repository, path, proxy)?;
        let text = String::from_utf8_lossy(&bytes);
        Metadata::from_xml(path, &text)
    }

    fn fetch_artifact(
        &self,
        repository: &Url,
        path: &str,
        proxy: Option<&ProxyRule>,
    ) -> Result<ArtifactStream> {
        let bytes = self.get(repository, path, proxy)?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}

/// Reads `file:` repositories from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl FileFetcher {
    /// Create a filesystem fetcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn local_path(repository: &Url, path: &str) -> Result<PathBuf> {
        let url = resolve_url(repository, path)?;
        if url.scheme() != "file" {
            return Err(FetchError::UnsupportedScheme {
                url: url.to_string(),
            });
        }
        url.to_file_path()
            .map_err(|()| FetchError::UnsupportedScheme {
                url: url.to_string(),
            })
    }

    fn read(path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| map_io(path, &e))
    }
}

pub(crate) fn map_io(path: &Path, err: &io::Error) -> FetchError {
    if err.kind() == io::ErrorKind::NotFound {
        FetchError::not_found(path.display().to_string())
    } else {
        FetchError::io(path, err)
    }
}

impl RepositoryFetcher for FileFetcher {
    fn fetch_metadata(
        &self,
        repository: &Url,
        path: &str,
        _proxy: Option<&ProxyRule>,
    ) -> Result<Metadata> {
        let file = Self::local_path(repository, path)?;
        let bytes = match Self::read(&file) {
            Err(err) if err.is_not_found() && path.ends_with(METADATA_FILE) => {
                let local = file.with_file_name(LOCAL_METADATA_FILE);
                tracing::trace!(path = %local.display(), "falling back to local metadata");
                Self::read(&local)?
            }
            other => other?,
        };
        Metadata::from_xml(&file.display().to_string(), &String::from_utf8_lossy(&bytes))
    }

    fn fetch_artifact(
        &self,
        repository: &Url,
        path: &str,
        _proxy: Option<&ProxyRule>,
    ) -> Result<ArtifactStream> {
        let file = Self::local_path(repository, path)?;
        let handle = std::fs::File::open(&file).map_err(|e| map_io(&file, &e))?;
        if handle.metadata().is_ok_and(|m| m.is_dir()) {
            return Err(FetchError::not_found(file.display().to_string()));
        }
        Ok(Box::new(io::BufReader::new(handle)))
    }
}
