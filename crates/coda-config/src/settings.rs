//! The JSON settings file.
//!
//! ```json
//! {
//!     "localRepository": "/home/me/.m2/repository",
//!     "repositories": "+https://nexus.corp/releases@id=corp",
//!     "proxies": [{ "host": "proxy.corp", "port": 3128, "protocol": "https" }],
//!     "mirrors": [{ "id": "nexus", "url": "https://nexus.corp/all/", "mirrorOf": "*" }],
//!     "offline": false
//! }
//! ```

use crate::auth::AuthConfig;
use crate::error::{ConfigError, Result};
use crate::mirror::MirrorRule;
use crate::proxy::ProxyRule;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Every field is optional; absent fields leave lower layers untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Local repository directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_repository: Option<PathBuf>,
    /// Repository list. A leading `+` appends to the lower layers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repositories: Option<String>,
    /// Default repository list, searched first. A leading `+` appends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_repositories: Option<String>,
    /// Proxy rules, in priority order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub proxies: Vec<ProxyRule>,
    /// Mirror rules, in priority order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mirrors: Vec<MirrorRule>,
    /// Restrict resolution to `file:` repositories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,
    /// Append Maven Central when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_fallback_repositories: Option<bool>,
    /// Scope labels, weakest first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_precedence: Option<Vec<String>>,
    /// Connect timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
    /// Read timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_timeout_secs: Option<u64>,
    /// Repository credentials.
    #[serde(skip_serializing_if = "AuthConfig::is_empty")]
    pub auth: AuthConfig,
}

impl Settings {
    /// Load settings from a file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not valid settings JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_json(path, &content)
    }

    /// Load settings if the file exists.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            tracing::trace!(path = %path.display(), "settings file absent");
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Parse settings from JSON text. `path` is only used in errors.
    ///
    /// # Errors
    /// Returns error if the text is not valid settings JSON.
    pub fn from_json(path: &Path, content: &str) -> Result<Self> {
        sonic_rs::from_str(content).map_err(|e| ConfigError::json(path, &e))
    }

    /// Write settings to a file.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        let content = sonic_rs::to_string_pretty(self).map_err(|e| ConfigError::json(path, &e))?;
        std::fs::write(path, content).map_err(|e| ConfigError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        let settings = Settings::from_json(Path::new("s.json"), "{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn full_document() {
        let settings = Settings::from_json(
            Path::new("s.json"),
            r#"{
                "localRepository": "/opt/m2",
                "repositories": "+https://nexus.corp/releases@id=corp",
                "proxies": [{"id": "p", "host": "proxy.corp", "port": 3128, "protocol": "https",
                             "nonProxyHosts": "*.corp"}],
                "mirrors": [{"id": "nexus", "url": "https://nexus.corp/all/", "mirrorOf": "*"}],
                "offline": true,
                "scopePrecedence": ["test", "compile"],
                "connectTimeoutSecs": 5,
                "auth": {"bearer": {"nexus.corp": "tok"}}
            }"#,
        )
        .unwrap();
        assert_eq!(settings.local_repository, Some(PathBuf::from("/opt/m2")));
        assert_eq!(settings.proxies[0].non_proxy_hosts.as_deref(), Some("*.corp"));
        assert_eq!(settings.mirrors[0].layout, "default");
        assert_eq!(settings.offline, Some(true));
        assert_eq!(settings.connect_timeout_secs, Some(5));
        assert_eq!(settings.auth.get_bearer("nexus.corp"), Some("tok"));
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let err = Settings::from_json(Path::new("bad.json"), "{\"offline\": 3").unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            offline: Some(true),
            repositories: Some("https://r.example.com@id=r".into()),
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
        assert!(Settings::load_optional(&dir.path().join("missing.json")).unwrap().is_none());
    }
}
