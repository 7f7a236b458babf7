//! Effective repository list construction.
//!
//! [`build_effective_repositories`] is a pure function from the configured
//! repositories, proxies and mirrors to the ordered list the resolver walks:
//!
//! 1. one synthetic repository per mirror in use, in order of first use,
//!    each listing the ids it stands in for;
//! 2. every repository no mirror claimed, in configured order.
//!
//! Each entry carries the first proxy rule that applies to its URL.
//! Running the function on its own output returns that output unchanged.

use coda_config::{MirrorRule, ProxyRule, RepositorySpec};
use indexmap::IndexMap;
use walkdir::WalkDir;

/// Build the ordered repository list to search.
#[must_use]
pub fn build_effective_repositories(
    specs: &[RepositorySpec],
    proxies: &[ProxyRule],
    mirrors: &[MirrorRule],
) -> Vec<RepositorySpec> {
    let mirrors = supported_mirrors(mirrors);
    let mut synthetic: IndexMap<String, RepositorySpec> = IndexMap::new();
    let mut direct: Vec<RepositorySpec> = Vec::new();

    for spec in specs {
        if spec.is_mirror() {
            synthetic
                .entry(spec.id.clone())
                .or_insert_with(|| spec.clone());
            continue;
        }

        let Some(mirror) = select_mirror(spec, &mirrors) else {
            direct.push(spec.clone());
            continue;
        };

        tracing::debug!(repository = %spec.id, mirror = %mirror.id, "repository mirrored");
        let entry = synthetic
            .entry(mirror.id.clone())
            .or_insert_with(|| mirror_repository(mirror));
        if !entry.mirrored_repositories.contains(&spec.id) {
            entry.mirrored_repositories.push(spec.id.clone());
        }
        entry.releases_enabled |= spec.releases_enabled;
        entry.snapshots_enabled |= spec.snapshots_enabled;
    }

    let mut effective: Vec<RepositorySpec> = synthetic.into_values().chain(direct).collect();
    for repo in &mut effective {
        repo.proxy = select_proxy(repo, proxies).cloned();
        if let Some(proxy) = &repo.proxy {
            tracing::trace!(repository = %repo.id, proxy = %proxy.endpoint(), "proxy assigned");
        }
    }
    effective
}

/// Mirrors with the default layout. Each other mirror is reported once.
#[must_use]
pub fn supported_mirrors(mirrors: &[MirrorRule]) -> Vec<MirrorRule> {
    mirrors
        .iter()
        .filter(|m| {
            let ok = m.has_default_layout();
            if !ok {
                tracing::warn!(mirror = %m.id, layout = %m.layout, "ignoring mirror with unsupported layout");
            }
            ok
        })
        .cloned()
        .collect()
}

/// The mirror serving `repository`: an exact id match first, then the first
/// matching pattern. Mirrors without the default layout never match.
#[must_use]
pub fn select_mirror<'a>(
    repository: &RepositorySpec,
    mirrors: &'a [MirrorRule],
) -> Option<&'a MirrorRule> {
    let usable = || {
        mirrors
            .iter()
            .filter(|m| m.has_default_layout() && m.id != repository.id)
    };
    usable()
        .find(|m| m.names_exactly(&repository.id))
        .or_else(|| usable().find(|m| m.matches(repository)))
}

/// The first proxy rule that applies to `repository`.
#[must_use]
pub fn select_proxy<'a>(
    repository: &RepositorySpec,
    proxies: &'a [ProxyRule],
) -> Option<&'a ProxyRule> {
    proxies.iter().find(|p| p.applies_to(&repository.url))
}

fn mirror_repository(mirror: &MirrorRule) -> RepositorySpec {
    let mut repo = RepositorySpec::new(mirror.id.clone(), mirror.url.clone())
        .with_releases(false)
        .with_snapshots(false);
    repo.mirror_of = Some(mirror.mirror_of.clone());
    repo
}

/// Replace every `multi` repository on a `file:` URL with one repository per
/// immediate subdirectory, sorted by name.
///
/// Remote or unreadable multi repositories are kept as they are.
#[must_use]
pub fn expand_multi_repositories(specs: &[RepositorySpec]) -> Vec<RepositorySpec> {
    let mut expanded = Vec::with_capacity(specs.len());
    for spec in specs {
        if !spec.multi {
            expanded.push(spec.clone());
            continue;
        }
        match expand_one(spec) {
            Some(children) => {
                tracing::debug!(repository = %spec.id, children = children.len(), "expanded multi repository");
                expanded.extend(children);
            }
            None => expanded.push(spec.clone()),
        }
    }
    expanded
}

fn expand_one(spec: &RepositorySpec) -> Option<Vec<RepositorySpec>> {
    if !spec.is_file() {
        tracing::warn!(repository = %spec.id, url = %spec.url, "multi is only supported for file: repositories");
        return None;
    }
    let Ok(root) = spec.url.to_file_path() else {
        tracing::warn!(repository = %spec.id, url = %spec.url, "not a local path");
        return None;
    };

    let mut children = Vec::new();
    for entry in WalkDir::new(&root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(repository = %spec.id, error = %err, "cannot list multi repository");
                return None;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let Ok(url) = coda_config::repository::directory_url(entry.path()) else {
            continue;
        };
        let name = entry.file_name().to_string_lossy();
        let mut child = spec.clone();
        child.id = format!("{}.{name}", spec.id);
        child.url = url;
        child.multi = false;
        children.push(child);
    }
    Some(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use url::Url;

    fn repo(spec: &str) -> RepositorySpec {
        RepositorySpec::parse(spec).unwrap()
    }

    fn mirror(id: &str, of: &str) -> MirrorRule {
        MirrorRule::new(id, Url::parse(&format!("https://{id}.example.com/")).unwrap(), of)
    }

    fn ids(list: &[RepositorySpec]) -> Vec<&str> {
        list.iter().map(|r| r.id.as_str()).collect()
    }

    fn sample() -> Vec<RepositorySpec> {
        vec![
            repo("https://a.example.com@id=a"),
            repo("https://central.example.com@id=central"),
            repo("https://b.example.com@id=b@snapshots@noreleases"),
            repo("/srv/local@id=local"),
        ]
    }

    #[test]
    fn no_rules_keeps_order() {
        let effective = build_effective_repositories(&sample(), &[], &[]);
        assert_eq!(ids(&effective), ["a", "central", "b", "local"]);
        assert!(effective.iter().all(|r| r.proxy.is_none()));
    }

    #[test]
    fn mirrors_go_first_and_aggregate() {
        let mirrors = [mirror("corp", "external:*,!a")];
        let effective = build_effective_repositories(&sample(), &[], &mirrors);
        assert_eq!(ids(&effective), ["corp", "a", "local"]);
        let corp = &effective[0];
        assert_eq!(corp.mirrored_repositories, ["central", "b"]);
        assert!(corp.releases_enabled);
        assert!(corp.snapshots_enabled);
        assert_eq!(corp.mirror_of.as_deref(), Some("external:*,!a"));
    }

    #[test]
    fn exact_match_beats_pattern() {
        let mirrors = [mirror("all", "*"), mirror("central-mirror", "central")];
        let effective = build_effective_repositories(&sample(), &[], &mirrors);
        assert_eq!(ids(&effective), ["all", "central-mirror"]);
        assert_eq!(effective[0].mirrored_repositories, ["a", "b", "local"]);
        assert_eq!(effective[1].mirrored_repositories, ["central"]);
    }

    #[test]
    fn mirror_never_includes_itself() {
        let specs = vec![repo("https://all.example.com@id=all"), repo("https://x.example.com@id=x")];
        let effective = build_effective_repositories(&specs, &[], &[mirror("all", "*")]);
        assert_eq!(ids(&effective), ["all", "all"]);
        assert_eq!(effective[0].mirrored_repositories, ["x"]);
        assert!(!effective[0].mirrored_repositories.contains(&"all".to_string()));
    }

    #[test]
    fn idempotent() {
        let mirrors = [mirror("all", "*,!local"), mirror("c", "central")];
        let proxies = [ProxyRule::from_url("p", Some("https"), "proxy:3128").unwrap()];
        let once = build_effective_repositories(&sample(), &proxies, &mirrors);
        let twice = build_effective_repositories(&once, &proxies, &mirrors);
        assert_eq!(once, twice);
        assert_eq!(ids(&twice), ["all", "c", "local"]);
    }

    #[test]
    fn proxies_assigned_per_repository() {
        let proxies = [ProxyRule::from_url("p", Some("https"), "proxy:3128")
            .unwrap()
            .with_non_proxy_hosts("b.example.com")];
        let effective = build_effective_repositories(&sample(), &proxies, &[]);
        let with_proxy: Vec<_> = effective
            .iter()
            .filter(|r| r.proxy.is_some())
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(with_proxy, ["a", "central"]);
    }

    #[test]
    fn unsupported_layout_ignored() {
        let mut legacy = mirror("legacy", "*");
        legacy.layout = "legacy".into();
        let effective = build_effective_repositories(&sample(), &[], std::slice::from_ref(&legacy));
        assert_eq!(ids(&effective), ["a", "central", "b", "local"]);
        assert!(select_mirror(&sample()[0], std::slice::from_ref(&legacy)).is_none());
    }

    #[test]
    fn unsupported_layout_reported_once() {
        struct WarnCounter(Arc<AtomicUsize>);

        impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                if *event.metadata().level() == tracing::Level::WARN {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let mut legacy = mirror("legacy", "*");
        legacy.layout = "legacy".into();
        let mirrors = [legacy, mirror("corp", "central")];
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));

        let effective = tracing::subscriber::with_default(subscriber, || {
            build_effective_repositories(&sample(), &[], &mirrors)
        });
        assert_eq!(ids(&effective), ["corp", "a", "b", "local"]);
        assert_eq!(warnings.load(Ordering::SeqCst), 1);
        let supported: Vec<_> = supported_mirrors(&mirrors).into_iter().map(|m| m.id).collect();
        assert_eq!(supported, ["corp"]);
    }

    #[test]
    fn multi_expands_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("zeta")).unwrap();
        std::fs::create_dir(dir.path().join("alpha")).unwrap();
        std::fs::write(dir.path().join("README"), "not a repo").unwrap();
        let spec = repo(&format!("{}@id=bundles@multi@snapshots", dir.path().display()));

        let expanded = expand_multi_repositories(&[spec, repo("https://a.example.com@id=a")]);
        assert_eq!(ids(&expanded), ["bundles.alpha", "bundles.zeta", "a"]);
        assert!(expanded[0].snapshots_enabled);
        assert!(!expanded[0].multi);
        assert!(expanded[0].url.as_str().ends_with("/alpha/"));
    }

    #[test]
    fn remote_multi_kept() {
        let spec = repo("https://a.example.com@id=a@multi");
        let expanded = expand_multi_repositories(std::slice::from_ref(&spec));
        assert_eq!(expanded, [spec]);
    }
}
