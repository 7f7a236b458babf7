//! Layered configuration loading.
//!
//! Sources are merged in this order, later ones overriding earlier ones
//! field by field:
//!
//! 1. built-in defaults
//! 2. the JSON settings file
//! 3. environment variables
//! 4. command-line overrides

use crate::auth::AuthConfig;
use crate::env::EnvConfig;
use crate::error::{ConfigError, Result};
use crate::mirror::MirrorRule;
use crate::proxy::ProxyRule;
use crate::repository::{RepositorySpec, directory_url, parse_repository_list};
use crate::settings::Settings;
use ahash::AHashSet;
use coda_core::ScopePrecedence;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Maven Central, appended when fallback repositories are enabled.
pub const CENTRAL: &str = "https://repo1.maven.org/maven2/@id=central";

/// Prefix marking a repository list that extends the lower layers.
pub const APPEND_PREFIX: char = '+';

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in default.
    Default,
    /// Settings file at the given path.
    SettingsFile(PathBuf),
    /// Environment variable.
    Environment,
    /// Command-line argument.
    Cli,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::SettingsFile(path) => write!(f, "settings file {}", path.display()),
            Self::Environment => f.write_str("environment"),
            Self::Cli => f.write_str("command line"),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// `--settings`.
    pub settings: Option<PathBuf>,
    /// `--offline`.
    pub offline: Option<bool>,
    /// `--repositories`.
    pub repositories: Option<String>,
    /// `--default-repositories`.
    pub default_repositories: Option<String>,
    /// `--local-repository`.
    pub local_repository: Option<PathBuf>,
}

/// Fully merged, immutable resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Local repository directory.
    pub local_repository: PathBuf,
    /// Repositories searched after the defaults, in priority order.
    pub repositories: Vec<RepositorySpec>,
    /// Repositories searched first, in priority order.
    pub default_repositories: Vec<RepositorySpec>,
    /// Proxy rules, first match wins.
    pub proxies: Vec<ProxyRule>,
    /// Mirror rules.
    pub mirrors: Vec<MirrorRule>,
    /// Only `file:` repositories are kept.
    pub offline: bool,
    /// Scope order used by the graph transform.
    pub scope_precedence: ScopePrecedence,
    /// HTTP connect timeout.
    pub connect_timeout: Duration,
    /// HTTP read timeout.
    pub read_timeout: Duration,
    /// Credentials by host.
    pub auth: AuthConfig,
    /// Source of [`Self::repositories`].
    pub repositories_source: ConfigSource,
    /// Source of [`Self::default_repositories`].
    pub default_repositories_source: ConfigSource,
}

impl ResolverConfig {
    /// Look up a repository by id in either list.
    #[must_use]
    pub fn repository(&self, id: &str) -> Option<&RepositorySpec> {
        self.default_repositories
            .iter()
            .chain(&self.repositories)
            .find(|r| r.id == id)
    }
}

/// Merges configuration sources into a [`ResolverConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    settings_path: Option<PathBuf>,
    env: EnvConfig,
    cli: CliOverrides,
}

impl ConfigLoader {
    /// Create a loader with no environment and no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this settings file unless the environment or CLI names another.
    #[must_use]
    pub fn with_settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Use these environment values.
    #[must_use]
    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.env = env;
        self
    }

    /// Use these command-line overrides.
    #[must_use]
    pub fn with_cli(mut self, cli: CliOverrides) -> Self {
        self.cli = cli;
        self
    }

    /// The settings file that [`Self::resolve`] will read, and whether it
    /// was named explicitly.
    #[must_use]
    pub fn settings_path(&self) -> Option<(PathBuf, bool)> {
        if let Some(path) = self.cli.settings.as_ref().or(self.env.settings.as_ref()) {
            return Some((path.clone(), true));
        }
        if let Some(path) = &self.settings_path {
            return Some((path.clone(), true));
        }
        default_settings_path().map(|p| (p, false))
    }

    /// Merge all sources.
    ///
    /// # Errors
    /// Returns error if an explicitly named settings file is missing or
    /// malformed, if any repository value fails to parse, or if the merged
    /// configuration is inconsistent.
    pub fn resolve(&self) -> Result<ResolverConfig> {
        let settings = match self.settings_path() {
            Some((path, true)) => Some((Settings::load(&path)?, path)),
            Some((path, false)) => Settings::load_optional(&path)?.map(|s| (s, path)),
            None => None,
        };
        let (settings, settings_source) = match settings {
            Some((s, path)) => {
                tracing::debug!(path = %path.display(), "loaded settings file");
                (s, ConfigSource::SettingsFile(path))
            }
            None => (Settings::default(), ConfigSource::Default),
        };

        let local_repository = self
            .cli
            .local_repository
            .clone()
            .or_else(|| self.env.local_repository.clone())
            .or_else(|| settings.local_repository.clone())
            .unwrap_or_else(default_local_repository);
        if !local_repository.is_absolute() {
            return Err(ConfigError::invalid(
                "localRepository",
                format!("{} is not an absolute path", local_repository.display()),
            ));
        }

        let mut default_repositories = Layered::new(vec![local_repository_spec(&local_repository)?]);
        default_repositories.apply(settings.default_repositories.as_deref(), &settings_source)?;
        default_repositories.apply(self.env.default_repositories.as_deref(), &ConfigSource::Environment)?;
        default_repositories.apply(self.cli.default_repositories.as_deref(), &ConfigSource::Cli)?;

        let mut repositories = Layered::new(Vec::new());
        repositories.apply(settings.repositories.as_deref(), &settings_source)?;
        repositories.apply(self.env.repositories.as_deref(), &ConfigSource::Environment)?;
        repositories.apply(self.cli.repositories.as_deref(), &ConfigSource::Cli)?;

        let use_fallback = self
            .env
            .use_fallback_repositories
            .or(settings.use_fallback_repositories)
            .unwrap_or(true);
        if use_fallback {
            let central = RepositorySpec::parse(CENTRAL)?;
            let present = repositories
                .list
                .iter()
                .chain(&default_repositories.list)
                .any(|r| r.id == central.id || r.url == central.url);
            if !present {
                repositories.list.push(central);
            }
        }

        let offline = self
            .cli
            .offline
            .or(self.env.offline)
            .or(settings.offline)
            .unwrap_or(false);
        if offline {
            for list in [&mut repositories.list, &mut default_repositories.list] {
                list.retain(|r| {
                    let keep = r.is_file();
                    if !keep {
                        tracing::debug!(repository = %r.id, "offline, dropping remote repository");
                    }
                    keep
                });
            }
        }

        let mut proxies = self.env.proxies()?;
        proxies.extend(settings.proxies.iter().cloned());

        let scope_precedence = match &settings.scope_precedence {
            Some(labels) => ScopePrecedence::new(labels)?,
            None => ScopePrecedence::default(),
        };

        let config = ResolverConfig {
            local_repository,
            repositories: repositories.list,
            default_repositories: default_repositories.list,
            proxies,
            mirrors: settings.mirrors.clone(),
            offline,
            scope_precedence,
            connect_timeout: settings
                .connect_timeout_secs
                .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_secs),
            read_timeout: settings
                .read_timeout_secs
                .map_or(DEFAULT_READ_TIMEOUT, Duration::from_secs),
            auth: settings.auth.clone(),
            repositories_source: repositories.source,
            default_repositories_source: default_repositories.source,
        };
        validate(&config)?;

        tracing::debug!(
            repositories = config.repositories.len(),
            default_repositories = config.default_repositories.len(),
            proxies = config.proxies.len(),
            mirrors = config.mirrors.len(),
            offline = config.offline,
            "configuration resolved"
        );
        Ok(config)
    }
}

/// A repository list plus the source of its last replacement.
struct Layered {
    list: Vec<RepositorySpec>,
    source: ConfigSource,
}

impl Layered {
    const fn new(list: Vec<RepositorySpec>) -> Self {
        Self {
            list,
            source: ConfigSource::Default,
        }
    }

    fn apply(&mut self, value: Option<&str>, source: &ConfigSource) -> Result<()> {
        let Some(value) = value else {
            return Ok(());
        };
        match value.trim().strip_prefix(APPEND_PREFIX) {
            Some(rest) => self.list.extend(parse_repository_list(rest)?),
            None => {
                self.list = parse_repository_list(value)?;
                self.source = source.clone();
            }
        }
        Ok(())
    }
}

fn validate(config: &ResolverConfig) -> Result<()> {
    for (field, list) in [
        ("repositories", &config.repositories),
        ("defaultRepositories", &config.default_repositories),
    ] {
        let mut seen = AHashSet::new();
        for repo in list {
            if !seen.insert(repo.id.as_str()) {
                return Err(ConfigError::invalid(
                    field,
                    format!("repository id '{}' appears more than once", repo.id),
                ));
            }
        }
    }
    for mirror in &config.mirrors {
        if mirror.listed_ids().any(|id| id == mirror.id) {
            return Err(ConfigError::invalid(
                "mirrors",
                format!("mirror '{}' lists itself in mirrorOf", mirror.id),
            ));
        }
    }
    Ok(())
}

fn local_repository_spec(path: &Path) -> Result<RepositorySpec> {
    Ok(RepositorySpec::new("local", directory_url(path)?).with_snapshots(true))
}

/// `~/.m2/repository`, or a directory under the system temp dir when no
/// home directory is known.
#[must_use]
pub fn default_local_repository() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || std::env::temp_dir().join("coda").join("repository"),
        |dirs| dirs.home_dir().join(".m2").join("repository"),
    )
}

/// `settings.json` in the platform config directory for coda.
#[must_use]
pub fn default_settings_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "coda").map(|d| d.config_dir().join("settings.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader_in(dir: &Path, settings: &str) -> ConfigLoader {
        let path = dir.join("settings.json");
        std::fs::write(&path, settings).unwrap();
        ConfigLoader::new().with_settings_file(path)
    }

    fn ids(list: &[RepositorySpec]) -> Vec<&str> {
        list.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = loader_in(dir.path(), "{}").resolve().unwrap();
        assert_eq!(ids(&config.repositories), ["central"]);
        assert_eq!(ids(&config.default_repositories), ["local"]);
        assert!(config.default_repositories[0].snapshots_enabled);
        assert!(config.default_repositories[0].is_file());
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.repositories_source, ConfigSource::Default);
    }

    #[test]
    fn later_layers_replace() {
        let dir = tempfile::tempdir().unwrap();
        let config = loader_in(
            dir.path(),
            r#"{"repositories": "https://a.example.com@id=a", "useFallbackRepositories": false}"#,
        )
        .with_env(EnvConfig {
            repositories: Some("https://b.example.com@id=b".into()),
            ..EnvConfig::default()
        })
        .resolve()
        .unwrap();
        assert_eq!(ids(&config.repositories), ["b"]);
        assert_eq!(config.repositories_source, ConfigSource::Environment);
    }

    #[test]
    fn plus_prefix_appends() {
        let dir = tempfile::tempdir().unwrap();
        let config = loader_in(
            dir.path(),
            r#"{"repositories": "https://a.example.com@id=a", "useFallbackRepositories": false}"#,
        )
        .with_env(EnvConfig {
            repositories: Some("+https://b.example.com@id=b".into()),
            ..EnvConfig::default()
        })
        .with_cli(CliOverrides {
            repositories: Some("+https://c.example.com@id=c".into()),
            ..CliOverrides::default()
        })
        .resolve()
        .unwrap();
        assert_eq!(ids(&config.repositories), ["a", "b", "c"]);
        assert!(matches!(config.repositories_source, ConfigSource::SettingsFile(_)));
    }

    #[test]
    fn central_not_duplicated() {
        let dir = tempfile::tempdir().unwrap();
        let config = loader_in(
            dir.path(),
            r#"{"repositories": "https://repo1.maven.org/maven2@id=maven"}"#,
        )
        .resolve()
        .unwrap();
        assert_eq!(ids(&config.repositories), ["maven"]);
    }

    #[test]
    fn offline_keeps_file_repositories() {
        let dir = tempfile::tempdir().unwrap();
        let config = loader_in(dir.path(), r#"{"repositories": "/srv/m2@id=srv,https://a.example.com@id=a"}"#)
            .with_cli(CliOverrides {
                offline: Some(true),
                ..CliOverrides::default()
            })
            .resolve()
            .unwrap();
        assert!(config.offline);
        assert_eq!(ids(&config.repositories), ["srv"]);
        assert_eq!(ids(&config.default_repositories), ["local"]);
    }

    #[test]
    fn local_repository_follows_override() {
        let dir = tempfile::tempdir().unwrap();
        let config = loader_in(dir.path(), "{}")
            .with_cli(CliOverrides {
                local_repository: Some(PathBuf::from("/opt/m2")),
                ..CliOverrides::default()
            })
            .resolve()
            .unwrap();
        assert_eq!(config.default_repositories[0].url.as_str(), "file:///opt/m2/");
    }

    #[test]
    fn env_proxies_come_first() {
        let dir = tempfile::tempdir().unwrap();
        let config = loader_in(
            dir.path(),
            r#"{"proxies": [{"id": "file-proxy", "host": "p2", "port": 2}]}"#,
        )
        .with_env(EnvConfig {
            https_proxy: Some("p1:1".into()),
            ..EnvConfig::default()
        })
        .resolve()
        .unwrap();
        let proxy_ids: Vec<_> = config.proxies.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(proxy_ids, ["env-https", "file-proxy"]);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = loader_in(
            dir.path(),
            r#"{"repositories": "https://a.example.com@id=x,https://b.example.com@id=x"}"#,
        )
        .resolve()
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "repositories"));
    }

    #[test]
    fn duplicate_ids_checked_per_list() {
        let dir = tempfile::tempdir().unwrap();
        let err = loader_in(
            dir.path(),
            r#"{"defaultRepositories": "/tmp/a@id=x,https://b.example.com@id=y,https://c.example.com@id=x"}"#,
        )
        .resolve()
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "defaultRepositories"));

        let config = loader_in(
            dir.path(),
            r#"{"defaultRepositories": "/tmp/a@id=x", "repositories": "https://b.example.com@id=x"}"#,
        )
        .resolve()
        .unwrap();
        assert_eq!(ids(&config.default_repositories), ["x"]);
        assert_eq!(ids(&config.repositories), ["x", "central"]);
    }

    #[test]
    fn self_mirroring_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = loader_in(
            dir.path(),
            r#"{"mirrors": [{"id": "m", "url": "https://m.example.com/", "mirrorOf": "central,m"}]}"#,
        )
        .resolve()
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "mirrors"));
    }

    #[test]
    fn explicit_missing_settings_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::new()
            .with_cli(CliOverrides {
                settings: Some(dir.path().join("nope.json")),
                ..CliOverrides::default()
            })
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_repository_value_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = loader_in(dir.path(), r#"{"repositories": "nonsense@id=x"}"#)
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn custom_scope_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let config = loader_in(dir.path(), r#"{"scopePrecedence": ["test", "compile"]}"#)
            .resolve()
            .unwrap();
        assert_eq!(config.scope_precedence.labels().count(), 2);
    }
}
