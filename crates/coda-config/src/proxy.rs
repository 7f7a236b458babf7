//! Network proxy rules.

use crate::auth::Credentials;
use coda_core::Error;
use serde::{Deserialize, Serialize};
use url::Url;

/// A configured HTTP proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRule {
    /// Rule id, for diagnostics.
    #[serde(default)]
    pub id: String,
    /// URL scheme this proxy serves (`http`, `https`). `None` serves all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Proxy host.
    pub host: String,
    /// Proxy port.
    pub port: u16,
    /// Optional proxy credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    /// `|`-separated host patterns that bypass this proxy. `*` is a wildcard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_proxy_hosts: Option<String>,
}

impl ProxyRule {
    /// Build a rule from a proxy URL such as `http://user:pw@proxy:3128`.
    ///
    /// # Errors
    /// Returns a parse error if the URL is malformed or has no host.
    pub fn from_url(id: impl Into<String>, protocol: Option<&str>, raw: &str) -> coda_core::Result<Self> {
        let raw = raw.trim();
        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("http://{raw}")
        };
        let url = Url::parse(&with_scheme).map_err(|e| Error::parse(raw, e.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::parse(raw, "proxy URL has no host"))?
            .to_string();
        let credentials = (!url.username().is_empty()).then(|| {
            Credentials::new(url.username(), url.password().unwrap_or_default())
        });
        Ok(Self {
            id: id.into(),
            protocol: protocol.map(str::to_ascii_lowercase),
            host,
            port: url.port_or_known_default().unwrap_or(80),
            credentials,
            non_proxy_hosts: None,
        })
    }

    /// Set the bypass list.
    #[must_use]
    pub fn with_non_proxy_hosts(mut self, hosts: impl Into<String>) -> Self {
        let hosts = hosts.into();
        self.non_proxy_hosts = (!hosts.trim().is_empty()).then_some(hosts);
        self
    }

    /// Whether this rule should be used for a repository at `url`.
    #[must_use]
    pub fn applies_to(&self, url: &Url) -> bool {
        if url.scheme() == "file" {
            return false;
        }
        if let Some(protocol) = &self.protocol {
            if !protocol.eq_ignore_ascii_case(url.scheme()) {
                return false;
            }
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        !self.bypasses(host)
    }

    /// Whether `host` is in the bypass list.
    #[must_use]
    pub fn bypasses(&self, host: &str) -> bool {
        self.non_proxy_hosts.as_deref().is_some_and(|list| {
            list.split(['|', ','])
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .any(|pattern| wildcard_match(pattern, host))
        })
    }

    /// The proxy endpoint as a URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Case-insensitive match where `*` matches any run of characters.
#[must_use]
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let value = value.to_ascii_lowercase();
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == value;
    }

    let mut rest = value.as_str();
    let last = parts.len() - 1;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            let Some(stripped) = rest.strip_prefix(part) else {
                return false;
            };
            rest = stripped;
        } else if i == last {
            return rest.ends_with(part);
        } else {
            let Some(pos) = rest.find(part) else {
                return false;
            };
            rest = &rest[pos + part.len()..];
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn from_url_with_credentials() {
        let rule = ProxyRule::from_url("env-http", Some("HTTP"), "http://u:p@proxy.corp:3128").unwrap();
        assert_eq!(rule.host, "proxy.corp");
        assert_eq!(rule.port, 3128);
        assert_eq!(rule.protocol.as_deref(), Some("http"));
        assert_eq!(rule.credentials, Some(Credentials::new("u", "p")));
    }

    #[test]
    fn from_url_without_scheme() {
        let rule = ProxyRule::from_url("p", None, "proxy.corp:8080").unwrap();
        assert_eq!(rule.host, "proxy.corp");
        assert_eq!(rule.port, 8080);
        assert!(rule.credentials.is_none());
    }

    #[test]
    fn protocol_must_match() {
        let rule = ProxyRule::from_url("p", Some("https"), "proxy:1").unwrap();
        assert!(rule.applies_to(&url("https://repo.example.com/")));
        assert!(!rule.applies_to(&url("http://repo.example.com/")));
    }

    #[test]
    fn file_urls_are_never_proxied() {
        let rule = ProxyRule::from_url("p", None, "proxy:1").unwrap();
        assert!(!rule.applies_to(&url("file:///tmp/repo/")));
    }

    #[test]
    fn non_proxy_hosts_bypass() {
        let rule = ProxyRule::from_url("p", None, "proxy:1")
            .unwrap()
            .with_non_proxy_hosts("localhost|*.internal.corp");
        assert!(!rule.applies_to(&url("https://nexus.internal.corp/m2/")));
        assert!(!rule.applies_to(&url("http://localhost:8081/")));
        assert!(rule.applies_to(&url("https://repo1.maven.org/maven2/")));
    }

    #[test_case("*", "anything", true)]
    #[test_case("*.corp", "a.b.corp", true)]
    #[test_case("*.corp", "corp", false)]
    #[test_case("repo.*", "repo.example.com", true)]
    #[test_case("a*c*e", "abcde", true)]
    #[test_case("a*c*e", "abcd", false)]
    #[test_case("Repo.Example.com", "repo.example.com", true)]
    fn wildcards(pattern: &str, value: &str, expected: bool) {
        assert_eq!(wildcard_match(pattern, value), expected);
    }
}
