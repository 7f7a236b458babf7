//! Mirror rules and `mirrorOf` pattern matching.

use crate::repository::RepositorySpec;
use serde::{Deserialize, Serialize};
use url::Url;

const WILDCARD: &str = "*";
const EXTERNAL_WILDCARD: &str = "external:*";
const EXTERNAL_HTTP_WILDCARD: &str = "external:http:*";
const DEFAULT_LAYOUT: &str = "default";

/// A repository that stands in for others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorRule {
    /// Mirror id. Becomes the id of the synthetic repository.
    pub id: String,
    /// Mirror base URL.
    pub url: Url,
    /// Repository ids or patterns this mirror serves.
    pub mirror_of: String,
    /// Repository layout. Only `default` is understood.
    #[serde(default = "default_layout")]
    pub layout: String,
}

fn default_layout() -> String {
    DEFAULT_LAYOUT.to_string()
}

impl MirrorRule {
    /// Create a mirror rule.
    #[must_use]
    pub fn new(id: impl Into<String>, url: Url, mirror_of: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url,
            mirror_of: mirror_of.into(),
            layout: default_layout(),
        }
    }

    /// Whether the mirror uses the only layout the resolver reads.
    #[must_use]
    pub fn has_default_layout(&self) -> bool {
        self.layout == DEFAULT_LAYOUT
    }

    /// Whether `mirror_of` names the repository id literally.
    #[must_use]
    pub fn names_exactly(&self, repository_id: &str) -> bool {
        self.mirror_of.trim() == repository_id
    }

    /// Whether this rule mirrors `repository`.
    ///
    /// A repository carrying the mirror's own id is never matched.
    #[must_use]
    pub fn matches(&self, repository: &RepositorySpec) -> bool {
        repository.id != self.id && matches_pattern(&self.mirror_of, repository)
    }

    /// Ids listed in `mirror_of` that are not patterns or exclusions.
    pub fn listed_ids(&self) -> impl Iterator<Item = &str> {
        self.mirror_of
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty() && !p.starts_with('!') && !p.contains('*'))
    }
}

/// Evaluate a `mirrorOf` pattern list against a repository.
///
/// The list is comma-separated. `!id` excludes a repository outright; `*`,
/// `external:*` and `external:http:*` match by location; anything else is a
/// literal id.
#[must_use]
pub fn matches_pattern(pattern: &str, repository: &RepositorySpec) -> bool {
    let mut matched = false;
    for token in pattern.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some(excluded) = token.strip_prefix('!') {
            if excluded == repository.id {
                return false;
            }
            continue;
        }
        matched |= match token {
            WILDCARD => true,
            EXTERNAL_WILDCARD => is_external(&repository.url),
            EXTERNAL_HTTP_WILDCARD => {
                is_external(&repository.url) && repository.url.scheme() == "http"
            }
            id => id == repository.id,
        };
    }
    matched
}

fn is_external(url: &Url) -> bool {
    if url.scheme() == "file" {
        return false;
    }
    !matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]") | None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn repo(id: &str, url: &str) -> RepositorySpec {
        RepositorySpec::new(id, Url::parse(url).unwrap())
    }

    #[test_case("*", "central", "https://repo1.maven.org/maven2/", true)]
    #[test_case("central", "central", "https://repo1.maven.org/maven2/", true)]
    #[test_case("central", "other", "https://repo1.maven.org/maven2/", false)]
    #[test_case("a,central", "central", "https://repo1.maven.org/maven2/", true)]
    #[test_case("*,!central", "central", "https://repo1.maven.org/maven2/", false)]
    #[test_case("*,!central", "other", "https://repo1.maven.org/maven2/", true)]
    #[test_case("external:*", "local", "file:///tmp/repo/", false)]
    #[test_case("external:*", "lh", "http://localhost:8081/", false)]
    #[test_case("external:*", "remote", "https://r.example.com/", true)]
    #[test_case("external:http:*", "remote", "https://r.example.com/", false)]
    #[test_case("external:http:*", "plain", "http://r.example.com/", true)]
    fn patterns(pattern: &str, id: &str, url: &str, expected: bool) {
        assert_eq!(matches_pattern(pattern, &repo(id, url)), expected);
    }

    #[test]
    fn mirror_never_matches_itself() {
        let mirror = MirrorRule::new("nexus", Url::parse("https://nexus/").unwrap(), "*");
        assert!(!mirror.matches(&repo("nexus", "https://nexus/")));
        assert!(mirror.matches(&repo("central", "https://repo1.maven.org/maven2/")));
    }

    #[test]
    fn listed_ids_skip_patterns() {
        let mirror = MirrorRule::new("m", Url::parse("https://m/").unwrap(), "a, *,!b,c");
        assert_eq!(mirror.listed_ids().collect::<Vec<_>>(), ["a", "c"]);
    }
}
