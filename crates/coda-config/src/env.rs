//! Environment variable configuration.
//!
//! Variables are read from an explicit map so callers (and tests) decide
//! where they come from. [`EnvConfig::from_process`] reads the real
//! environment.

use crate::error::{ConfigError, Result};
use crate::proxy::ProxyRule;
use ahash::AHashMap;
use std::path::PathBuf;

/// Environment variables understood by coda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodaEnvVar {
    /// Settings file path.
    Settings,
    /// Repository list.
    Repositories,
    /// Default repository list.
    DefaultRepositories,
    /// Local repository directory.
    LocalRepository,
    /// Offline mode.
    Offline,
    /// Append Maven Central when absent.
    UseFallbackRepositories,
    /// Proxy for `http:` repositories.
    HttpProxy,
    /// Proxy for `https:` repositories.
    HttpsProxy,
    /// Hosts that bypass the proxy.
    NoProxy,
}

impl CodaEnvVar {
    /// All variables.
    pub const ALL: [Self; 9] = [
        Self::Settings,
        Self::Repositories,
        Self::DefaultRepositories,
        Self::LocalRepository,
        Self::Offline,
        Self::UseFallbackRepositories,
        Self::HttpProxy,
        Self::HttpsProxy,
        Self::NoProxy,
    ];

    /// Variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Settings => "CODA_SETTINGS",
            Self::Repositories => "CODA_REPOSITORIES",
            Self::DefaultRepositories => "CODA_DEFAULT_REPOSITORIES",
            Self::LocalRepository => "CODA_LOCAL_REPOSITORY",
            Self::Offline => "CODA_OFFLINE",
            Self::UseFallbackRepositories => "CODA_USE_FALLBACK_REPOSITORIES",
            Self::HttpProxy => "HTTP_PROXY",
            Self::HttpsProxy => "HTTPS_PROXY",
            Self::NoProxy => "NO_PROXY",
        }
    }
}

/// Values read from the environment. Empty variables count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// `CODA_SETTINGS`.
    pub settings: Option<PathBuf>,
    /// `CODA_REPOSITORIES`.
    pub repositories: Option<String>,
    /// `CODA_DEFAULT_REPOSITORIES`.
    pub default_repositories: Option<String>,
    /// `CODA_LOCAL_REPOSITORY`.
    pub local_repository: Option<PathBuf>,
    /// `CODA_OFFLINE`.
    pub offline: Option<bool>,
    /// `CODA_USE_FALLBACK_REPOSITORIES`.
    pub use_fallback_repositories: Option<bool>,
    /// `HTTP_PROXY`.
    pub http_proxy: Option<String>,
    /// `HTTPS_PROXY`.
    pub https_proxy: Option<String>,
    /// `NO_PROXY`.
    pub no_proxy: Option<String>,
}

impl EnvConfig {
    /// Read from the process environment.
    ///
    /// # Errors
    /// Returns error if a boolean variable holds an unrecognised value.
    pub fn from_process() -> Result<Self> {
        Self::from_map(std::env::vars())
    }

    /// Read from name/value pairs. Proxy variables also match in lowercase.
    ///
    /// # Errors
    /// Returns error if a boolean variable holds an unrecognised value.
    pub fn from_map<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: AHashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();
        let get = |var: CodaEnvVar| -> Option<String> {
            vars.get(var.as_str())
                .or_else(|| vars.get(&var.as_str().to_ascii_lowercase()))
                .map(|v| v.trim().to_string())
        };
        let get_bool = |var: CodaEnvVar| -> Result<Option<bool>> {
            get(var)
                .map(|v| parse_bool(&v).ok_or_else(|| ConfigError::invalid(var.as_str(), format!("not a boolean: {v}"))))
                .transpose()
        };

        Ok(Self {
            settings: get(CodaEnvVar::Settings).map(PathBuf::from),
            repositories: get(CodaEnvVar::Repositories),
            default_repositories: get(CodaEnvVar::DefaultRepositories),
            local_repository: get(CodaEnvVar::LocalRepository).map(PathBuf::from),
            offline: get_bool(CodaEnvVar::Offline)?,
            use_fallback_repositories: get_bool(CodaEnvVar::UseFallbackRepositories)?,
            http_proxy: get(CodaEnvVar::HttpProxy),
            https_proxy: get(CodaEnvVar::HttpsProxy),
            no_proxy: get(CodaEnvVar::NoProxy),
        })
    }

    /// Proxy rules derived from `HTTP_PROXY`, `HTTPS_PROXY` and `NO_PROXY`.
    ///
    /// # Errors
    /// Returns error if a proxy URL is malformed.
    pub fn proxies(&self) -> Result<Vec<ProxyRule>> {
        let non_proxy = self.no_proxy.as_deref().map(no_proxy_to_patterns);
        let mut rules = Vec::new();
        for (id, protocol, value) in [
            ("env-https", "https", &self.https_proxy),
            ("env-http", "http", &self.http_proxy),
        ] {
            if let Some(value) = value {
                let mut rule = ProxyRule::from_url(id, Some(protocol), value)?;
                if let Some(hosts) = &non_proxy {
                    rule = rule.with_non_proxy_hosts(hosts.clone());
                }
                rules.push(rule);
            }
        }
        Ok(rules)
    }
}

/// Parse common boolean spellings.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Convert a curl-style `NO_PROXY` list into `nonProxyHosts` form.
fn no_proxy_to_patterns(value: &str) -> String {
    value
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(|h| {
            if h.starts_with('.') {
                format!("*{h}")
            } else {
                h.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("|")
}
