//! Repository credentials, keyed by host.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Username and password for HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl Credentials {
    /// Create credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Credentials for repository hosts, as found under `auth` in the settings
/// file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AuthConfig {
    /// HTTP Basic credentials by host.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub http_basic: BTreeMap<String, Credentials>,

    /// Bearer tokens by host.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub bearer: BTreeMap<String, String>,
}

impl AuthConfig {
    /// Merge another auth config into this one. Entries in `other` win.
    pub fn merge(&mut self, other: &Self) {
        for (k, v) in &other.http_basic {
            self.http_basic.insert(k.clone(), v.clone());
        }
        for (k, v) in &other.bearer {
            self.bearer.insert(k.clone(), v.clone());
        }
    }

    /// Check if config is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.http_basic.is_empty() && self.bearer.is_empty()
    }

    /// HTTP Basic credentials for a host.
    #[must_use]
    pub fn get_http_basic(&self, host: &str) -> Option<&Credentials> {
        lookup(&self.http_basic, host)
    }

    /// Bearer token for a host.
    #[must_use]
    pub fn get_bearer(&self, host: &str) -> Option<&str> {
        lookup(&self.bearer, host).map(String::as_str)
    }

    /// Set HTTP Basic credentials for a host.
    pub fn set_http_basic(
        &mut self,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) {
        self.http_basic
            .insert(host.into(), Credentials::new(username, password));
    }

    /// Set bearer token for a host.
    pub fn set_bearer(&mut self, host: impl Into<String>, token: impl Into<String>) {
        self.bearer.insert(host.into(), token.into());
    }
}

fn lookup<'a, V>(map: &'a BTreeMap<String, V>, host: &str) -> Option<&'a V> {
    let host = host.to_ascii_lowercase();
    map.get(&host).or_else(|| {
        let stripped = host.strip_prefix("www.").unwrap_or(&host);
        map.get(stripped)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_strips_www() {
        let mut auth = AuthConfig::default();
        auth.set_http_basic("repo.example.com", "alice", "secret");
        assert_eq!(
            auth.get_http_basic("www.repo.example.com").unwrap().username,
            "alice"
        );
        assert_eq!(
            auth.get_http_basic("REPO.example.com").unwrap().password,
            "secret"
        );
        assert!(auth.get_http_basic("other.example.com").is_none());
    }

    #[test]
    fn merge_overrides() {
        let mut base = AuthConfig::default();
        base.set_bearer("a.example.com", "one");
        let mut other = AuthConfig::default();
        other.set_bearer("a.example.com", "two");
        base.merge(&other);
        assert_eq!(base.get_bearer("a.example.com"), Some("two"));
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::new("bob", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn deserializes_kebab_case() {
        let auth: AuthConfig = sonic_rs::from_str(
            r#"{"http-basic":{"repo.example.com":{"username":"u","password":"p"}}}"#,
        )
        .unwrap();
        assert_eq!(auth.get_http_basic("repo.example.com").unwrap().username, "u");
    }
}
