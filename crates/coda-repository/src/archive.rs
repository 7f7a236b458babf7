//! Repositories packed inside zip archives, addressed by `jar:` URLs.
//!
//! `jar:file:/opt/bundle.zip!/repo/` names the `repo/` directory inside
//! `/opt/bundle.zip`. Only archives on the local filesystem are supported.

use crate::error::{FetchError, Result};
use crate::fetcher::{
    ArtifactStream, LOCAL_METADATA_FILE, METADATA_FILE, RepositoryFetcher, map_io, resolve_url,
};
use crate::metadata::Metadata;
use coda_config::ProxyRule;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use url::Url;
use zip::result::ZipError;

/// Separator between the archive location and the entry path.
const ENTRY_SEPARATOR: &str = "!/";

/// Reads `jar:file:` repositories straight out of the archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct JarFetcher;

/// Archive file plus entry name of a `jar:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ArchiveEntry {
    archive: PathBuf,
    entry: String,
}

impl JarFetcher {
    /// Create an archive fetcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn locate(repository: &Url, path: &str) -> Result<ArchiveEntry> {
        let url = resolve_url(repository, path)?;
        let unsupported = || FetchError::UnsupportedScheme {
            url: url.to_string(),
        };
        if url.scheme() != "jar" {
            return Err(unsupported());
        }
        let (archive, entry) = url
            .path()
            .split_once(ENTRY_SEPARATOR)
            .ok_or_else(unsupported)?;
        let archive = Url::parse(archive).map_err(|_| unsupported())?;
        if archive.scheme() != "file" {
            return Err(unsupported());
        }
        Ok(ArchiveEntry {
            archive: archive.to_file_path().map_err(|()| unsupported())?,
            entry: entry.to_string(),
        })
    }

    fn read(location: &ArchiveEntry) -> Result<Vec<u8>> {
        let file = File::open(&location.archive).map_err(|e| map_io(&location.archive, &e))?;
        let mut zip = zip::ZipArchive::new(file).map_err(|e| archive_error(location, &e))?;
        let mut entry = zip.by_name(&location.entry).map_err(|e| match e {
            ZipError::FileNotFound => FetchError::not_found(location.to_string()),
            other => archive_error(location, &other),
        })?;
        if entry.is_dir() {
            return Err(FetchError::not_found(location.to_string()));
        }
        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| FetchError::io(&location.archive, &e))?;
        tracing::trace!(entry = %location, bytes = bytes.len(), "read archive entry");
        Ok(bytes)
    }
}

impl std::fmt::Display for ArchiveEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{ENTRY_SEPARATOR}{}", self.archive.display(), self.entry)
    }
}

fn archive_error(location: &ArchiveEntry, err: &ZipError) -> FetchError {
    FetchError::Io {
        path: location.archive.clone(),
        message: err.to_string(),
    }
}

impl RepositoryFetcher for JarFetcher {
    fn fetch_metadata(
        &self,
        repository: &Url,
        path: &str,
        _proxy: Option<&ProxyRule>,
    ) -> Result<Metadata> {
        let location = Self::locate(repository, path)?;
        let bytes = match Self::read(&location) {
            Err(err) if err.is_not_found() && location.entry.ends_with(METADATA_FILE) => {
                let local = ArchiveEntry {
                    entry: format!(
                        "{}{LOCAL_METADATA_FILE}",
                        location.entry.trim_end_matches(METADATA_FILE)
                    ),
                    ..location.clone()
                };
                Self::read(&local)?
            }
            other => other?,
        };
        Metadata::from_xml(&location.to_string(), &String::from_utf8_lossy(&bytes))
    }

    fn fetch_artifact(
        &self,
        repository: &Url,
        path: &str,
        _proxy: Option<&ProxyRule>,
    ) -> Result<ArtifactStream> {
        let location = Self::locate(repository, path)?;
        Ok(Box::new(Cursor::new(Self::read(&location)?)))
    }
}
