//! Repository specifications and their compact string grammar.
//!
//! An entry reads `url['@'option]*`. Recognised options:
//!
//! - `id=<name>`: repository id (derived from the URL when absent)
//! - `snapshots`: enable snapshot resolution (off by default)
//! - `noreleases`: disable release resolution (on by default)
//! - `multi`: the URL is a directory whose subdirectories are repositories
//! - `allowinsecure`: skip TLS certificate verification
//!
//! Unknown options are kept verbatim in [`RepositorySpec::options`].

use crate::proxy::ProxyRule;
use coda_core::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use url::Url;

/// Separator between the URL and each option.
pub const OPTION_SEPARATOR: char = '@';

/// Separator between entries of a repository list.
pub const LIST_SEPARATOR: char = ',';

/// A repository to search, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySpec {
    /// Repository id.
    pub id: String,
    /// Base URL, always ending in `/`.
    pub url: Url,
    /// Whether release versions may be resolved here.
    pub releases_enabled: bool,
    /// Whether snapshot versions may be resolved here.
    pub snapshots_enabled: bool,
    /// Whether the URL is a parent of several repositories.
    pub multi: bool,
    /// Whether TLS certificates are left unverified.
    #[serde(default)]
    pub allow_insecure: bool,
    /// Pattern this repository mirrors, for synthetic mirror entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_of: Option<String>,
    /// Ids of the repositories this mirror stands in for.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mirrored_repositories: Vec<String>,
    /// Proxy assigned by the prioritizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyRule>,
    /// Unrecognised options, preserved as written.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl RepositorySpec {
    /// Create a release-only repository.
    #[must_use]
    pub fn new(id: impl Into<String>, url: Url) -> Self {
        Self {
            id: id.into(),
            url: with_trailing_slash(url),
            releases_enabled: true,
            snapshots_enabled: false,
            multi: false,
            allow_insecure: false,
            mirror_of: None,
            mirrored_repositories: Vec::new(),
            proxy: None,
            options: Vec::new(),
        }
    }

    /// Parse one repository entry.
    ///
    /// # Errors
    /// Returns a parse error carrying the offending token when the URL is
    /// malformed or an `id=` option is empty.
    pub fn parse(entry: &str) -> coda_core::Result<Self> {
        let entry = entry.trim();
        let mut segments = entry.split(OPTION_SEPARATOR);
        let raw_url = segments.next().unwrap_or_default().trim();
        if raw_url.is_empty() {
            return Err(Error::parse(entry, "repository URL must not be empty"));
        }

        let url = parse_url(raw_url)?;
        let mut spec = Self::new(String::new(), url);

        for option in segments {
            let option = option.trim();
            if option.is_empty() {
                continue;
            }
            let lower = option.to_ascii_lowercase();
            match lower.as_str() {
                "snapshots" => spec.snapshots_enabled = true,
                "noreleases" => spec.releases_enabled = false,
                "multi" => spec.multi = true,
                "allowinsecure" | "insecure" => spec.allow_insecure = true,
                _ if lower.starts_with("id=") => {
                    let id = option[3..].trim();
                    if id.is_empty() {
                        return Err(Error::parse(option, "repository id must not be empty"));
                    }
                    spec.id = id.to_string();
                }
                _ => spec.options.push(option.to_string()),
            }
        }

        if spec.id.is_empty() {
            spec.id = derived_id(&spec.url);
        }
        Ok(spec)
    }

    /// Enable snapshots.
    #[must_use]
    pub const fn with_snapshots(mut self, enabled: bool) -> Self {
        self.snapshots_enabled = enabled;
        self
    }

    /// Enable or disable releases.
    #[must_use]
    pub const fn with_releases(mut self, enabled: bool) -> Self {
        self.releases_enabled = enabled;
        self
    }

    /// Whether this entry stands in for other repositories.
    #[must_use]
    pub fn is_mirror(&self) -> bool {
        self.mirror_of.is_some()
    }

    /// Whether the URL points at the local filesystem.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.url.scheme() == "file"
    }
}

impl fmt::Display for RepositorySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@id={}", self.url, self.id)?;
        if self.snapshots_enabled {
            f.write_str("@snapshots")?;
        }
        if !self.releases_enabled {
            f.write_str("@noreleases")?;
        }
        if self.multi {
            f.write_str("@multi")?;
        }
        if self.allow_insecure {
            f.write_str("@allowinsecure")?;
        }
        for option in &self.options {
            write!(f, "@{option}")?;
        }
        Ok(())
    }
}

impl FromStr for RepositorySpec {
    type Err = Error;

    fn from_str(s: &str) -> coda_core::Result<Self> {
        Self::parse(s)
    }
}

/// Parse a repository entry.
///
/// # Errors
/// See [`RepositorySpec::parse`].
pub fn parse_repository_spec(entry: &str) -> coda_core::Result<RepositorySpec> {
    RepositorySpec::parse(entry)
}

/// Parse a comma-separated repository list, skipping empty entries.
///
/// # Errors
/// Returns the first entry's parse error.
pub fn parse_repository_list(value: &str) -> coda_core::Result<Vec<RepositorySpec>> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(RepositorySpec::parse)
        .collect()
}

/// `file:` URL for a local directory.
///
/// # Errors
/// Returns a parse error for relative paths.
pub fn directory_url(path: &Path) -> coda_core::Result<Url> {
    Url::from_directory_path(path)
        .map_err(|()| Error::parse(path.display().to_string(), "not an absolute path"))
}

fn parse_url(raw: &str) -> coda_core::Result<Url> {
    if raw.starts_with('/') {
        return directory_url(Path::new(raw));
    }
    let url = Url::parse(raw).map_err(|e| Error::parse(raw, e.to_string()))?;
    Ok(with_trailing_slash(url))
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn derived_id(url: &Url) -> String {
    let hash = blake3::hash(url.as_str().as_bytes());
    format!("repo-{}", &hash.to_hex()[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn defaults() {
        let spec = RepositorySpec::parse("https://repo1.maven.org/maven2").unwrap();
        assert_eq!(spec.url.as_str(), "https://repo1.maven.org/maven2/");
        assert!(spec.releases_enabled);
        assert!(!spec.snapshots_enabled);
        assert!(!spec.multi);
        assert!(spec.id.starts_with("repo-"));
        assert_eq!(spec.id.len(), "repo-".len() + 8);
    }

    #[test]
    fn derived_id_is_stable() {
        let a = RepositorySpec::parse("https://r.example.com/m2").unwrap();
        let b = RepositorySpec::parse("https://r.example.com/m2/").unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn all_options() {
        let spec = RepositorySpec::parse(
            "https://r.example.com/m2@id=corp@snapshots@noreleases@multi@AllowInsecure@update=daily",
        )
        .unwrap();
        assert_eq!(spec.id, "corp");
        assert!(spec.snapshots_enabled);
        assert!(!spec.releases_enabled);
        assert!(spec.multi);
        assert!(spec.allow_insecure);
        assert_eq!(spec.options, ["update=daily"]);
    }

    #[test_case("" ; "empty")]
    #[test_case("@snapshots" ; "no url")]
    #[test_case("not a url@id=x" ; "no scheme")]
    #[test_case("https://r.example.com@id=" ; "empty id")]
    fn malformed(entry: &str) {
        assert!(RepositorySpec::parse(entry).unwrap_err().is_parse());
    }

    #[test]
    fn malformed_carries_token() {
        match RepositorySpec::parse("http//broken@id=x").unwrap_err() {
            Error::Parse { token, .. } => assert_eq!(token, "http//broken"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn absolute_path_becomes_file_url() {
        let spec = RepositorySpec::parse("/var/m2/repository@id=local@snapshots").unwrap();
        assert!(spec.is_file());
        assert_eq!(spec.url.as_str(), "file:///var/m2/repository/");
    }

    #[test]
    fn list_parsing_skips_blanks() {
        let list = parse_repository_list(
            " https://a.example.com@id=a, ,https://b.example.com@id=b@snapshots,",
        )
        .unwrap();
        let ids: Vec<_> = list.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(list[1].snapshots_enabled);
    }

    #[test]
    fn display_round_trips() {
        let spec = RepositorySpec::parse("https://r.example.com/m2@id=x@snapshots@custom").unwrap();
        assert_eq!(RepositorySpec::parse(&spec.to_string()).unwrap(), spec);
    }
}
