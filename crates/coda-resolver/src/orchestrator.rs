//! Download orchestration.
//!
//! The default repositories are searched first. Only when none of their
//! candidates downloads are the configured repositories consulted. Within a
//! set, candidates are attempted in [`sort_candidates`] order and every
//! failure is recorded and skipped; an error is returned only once both sets
//! are exhausted.

use crate::candidate::{DownloadCandidate, sort_candidates};
use crate::error::{Attempt, CandidateError, ResolveError, Result};
use crate::version_resolver::VersionResolver;
use coda_config::{ProxyRule, RepositorySpec, ResolverConfig};
use coda_core::{ArtifactReference, Coordinate, VersionSpec};
use coda_repository::{ArtifactStream, EffectiveRepositories, RepositoryFetcher, select_proxy};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, trace, warn};
use url::Url;

/// Id given to a repository written inline in a reference.
pub const INLINE_REPOSITORY_ID: &str = "inline";

/// Counters across every resolve of one orchestrator.
#[derive(Debug, Default)]
pub struct ResolveStats {
    /// Resolve calls.
    pub resolves: AtomicU64,
    /// Candidates produced by version resolution.
    pub candidates: AtomicU64,
    /// Download attempts.
    pub attempts: AtomicU64,
    /// Failed download attempts.
    pub failures: AtomicU64,
    /// Repositories skipped because of their release/snapshot policy.
    pub policy_skips: AtomicU64,
}

impl ResolveStats {
    /// One-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Resolve: {} requests, {} candidates, {} attempts ({} failed), {} policy skips",
            self.resolves.load(Ordering::Relaxed),
            self.candidates.load(Ordering::Relaxed),
            self.attempts.load(Ordering::Relaxed),
            self.failures.load(Ordering::Relaxed),
            self.policy_skips.load(Ordering::Relaxed),
        )
    }

    fn bump(counter: &AtomicU64, by: usize) {
        counter.fetch_add(by as u64, Ordering::Relaxed);
    }
}

/// A downloaded artifact.
pub struct Artifact {
    /// The coordinate with its version resolved.
    pub coordinate: Coordinate,
    /// Resolved version (`1.0-SNAPSHOT` for snapshots).
    pub version: String,
    /// Version in the file name (`1.0-20230615.143000-3`).
    pub file_version: String,
    /// Id of the repository that served the file.
    pub repository_id: String,
    /// Base URL of that repository.
    pub repository_url: Url,
    /// Repository-relative path.
    pub path: String,
    /// Artifact bytes.
    pub stream: ArtifactStream,
}

impl Artifact {
    /// File name part of [`Self::path`].
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("coordinate", &self.coordinate)
            .field("version", &self.version)
            .field("file_version", &self.file_version)
            .field("repository_id", &self.repository_id)
            .field("repository_url", &self.repository_url.as_str())
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Why each repository failed, gathered across both sets.
#[derive(Debug, Default)]
struct Outcome {
    attempts: Vec<Attempt>,
    policy_skips: Vec<String>,
    version_failures: Vec<String>,
    empty_results: usize,
}

impl Outcome {
    fn into_error(self, coordinate: &Coordinate) -> ResolveError {
        let coordinate = coordinate.to_string();
        if self.attempts.is_empty() {
            if self.version_failures.is_empty()
                && self.empty_results == 0
                && !self.policy_skips.is_empty()
            {
                return ResolveError::RepositoryPolicy {
                    coordinate,
                    skipped: self.policy_skips,
                };
            }
            if !self.version_failures.is_empty() || self.empty_results > 0 {
                return ResolveError::VersionResolution {
                    coordinate,
                    failures: self.version_failures,
                };
            }
        }
        let mut skipped = self.policy_skips;
        skipped.extend(self.version_failures);
        ResolveError::Resolution {
            coordinate,
            attempts: self.attempts,
            skipped,
        }
    }
}

/// Tries candidates across repository sets until one downloads.
pub struct DownloadOrchestrator {
    fetcher: Arc<dyn RepositoryFetcher>,
    stats: ResolveStats,
}

impl fmt::Debug for DownloadOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOrchestrator")
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl DownloadOrchestrator {
    /// Create an orchestrator fetching through `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn RepositoryFetcher>) -> Self {
        Self {
            fetcher,
            stats: ResolveStats::default(),
        }
    }

    /// Counters.
    #[must_use]
    pub const fn stats(&self) -> &ResolveStats {
        &self.stats
    }

    /// Resolve and open `coordinate`.
    ///
    /// # Errors
    /// See [`ResolveError`] for how the final error is chosen when every
    /// repository fails.
    pub fn resolve(
        &self,
        coordinate: &Coordinate,
        repositories: &[RepositorySpec],
        default_repositories: &[RepositorySpec],
    ) -> Result<Artifact> {
        ResolveStats::bump(&self.stats.resolves, 1);
        let mut outcome = Outcome::default();

        for (set, specs) in [("default", default_repositories), ("configured", repositories)] {
            let candidates = self.collect(coordinate, specs, &mut outcome);
            debug!(
                coordinate = %coordinate,
                set,
                candidates = candidates.len(),
                "candidates collected"
            );
            if let Some(artifact) = self.attempt(coordinate, candidates, &mut outcome) {
                return Ok(artifact);
            }
        }

        let error = outcome.into_error(coordinate);
        warn!(coordinate = %coordinate, error = %error, "resolution exhausted every repository");
        Err(error)
    }

    fn collect(
        &self,
        coordinate: &Coordinate,
        specs: &[RepositorySpec],
        outcome: &mut Outcome,
    ) -> Vec<DownloadCandidate> {
        let resolver = VersionResolver::new(self.fetcher.as_ref());
        let mut candidates = Vec::new();

        for (priority, repository) in specs.iter().enumerate() {
            match resolver.candidates(coordinate, repository, priority) {
                Ok(found) => {
                    if found.is_empty() {
                        debug!(repository = %repository.id, "no version matched");
                        outcome.empty_results += 1;
                    }
                    ResolveStats::bump(&self.stats.candidates, found.len());
                    let local = found.iter().any(|c| c.is_local_snapshot_build);
                    candidates.extend(found);
                    if local {
                        debug!(repository = %repository.id, "local snapshot build found, stopping search");
                        break;
                    }
                }
                Err(e @ CandidateError::Policy { .. }) => {
                    trace!(error = %e, "repository skipped");
                    ResolveStats::bump(&self.stats.policy_skips, 1);
                    outcome.policy_skips.push(e.to_string());
                }
                Err(e @ CandidateError::VersionResolution { .. }) => {
                    debug!(error = %e, "version not resolved");
                    outcome.version_failures.push(e.to_string());
                }
            }
        }

        sort_candidates(&mut candidates);
        candidates
    }

    fn attempt(
        &self,
        coordinate: &Coordinate,
        candidates: Vec<DownloadCandidate>,
        outcome: &mut Outcome,
    ) -> Option<Artifact> {
        for candidate in candidates {
            ResolveStats::bump(&self.stats.attempts, 1);
            let fetched = self.fetcher.fetch_artifact(
                &candidate.repository_url,
                &candidate.artifact_path,
                candidate.proxy.as_ref(),
            );
            match fetched {
                Ok(stream) => {
                    info!(
                        coordinate = %coordinate,
                        version = %candidate.resolved_version,
                        repository = %candidate.repository_id,
                        "artifact resolved"
                    );
                    return Some(Artifact {
                        coordinate: coordinate
                            .with_version(VersionSpec::from_resolved(&candidate.resolved_version)),
                        version: candidate.resolved_version,
                        file_version: candidate.file_version,
                        repository_id: candidate.repository_id,
                        repository_url: candidate.repository_url,
                        path: candidate.artifact_path,
                        stream,
                    });
                }
                Err(e) => {
                    ResolveStats::bump(&self.stats.failures, 1);
                    if e.is_not_found() {
                        debug!(repository = %candidate.repository_id, path = %candidate.artifact_path, "not found");
                    } else {
                        warn!(repository = %candidate.repository_id, path = %candidate.artifact_path, error = %e, "download failed");
                    }
                    outcome.attempts.push(Attempt {
                        repository: candidate.repository_id,
                        path: candidate.artifact_path,
                        error: e.to_string(),
                    });
                }
            }
        }
        None
    }
}

/// Resolves reference strings against a fixed pair of effective repository
/// lists.
///
/// The lists are built once and shared read-only between calls.
#[derive(Debug)]
pub struct ArtifactResolver {
    repositories: EffectiveRepositories,
    proxies: Vec<ProxyRule>,
    orchestrator: DownloadOrchestrator,
}

impl ArtifactResolver {
    /// Build the effective repositories from `config`.
    #[must_use]
    pub fn new(config: &ResolverConfig, fetcher: Arc<dyn RepositoryFetcher>) -> Self {
        Self::with_repositories(
            EffectiveRepositories::from_config(config),
            config.proxies.clone(),
            fetcher,
        )
    }

    /// Use already prioritized repositories. `proxies` apply to inline
    /// repositories.
    #[must_use]
    pub fn with_repositories(
        repositories: EffectiveRepositories,
        proxies: Vec<ProxyRule>,
        fetcher: Arc<dyn RepositoryFetcher>,
    ) -> Self {
        Self {
            repositories,
            proxies,
            orchestrator: DownloadOrchestrator::new(fetcher),
        }
    }

    /// The effective repositories.
    #[must_use]
    pub const fn repositories(&self) -> &EffectiveRepositories {
        &self.repositories
    }

    /// Counters.
    #[must_use]
    pub const fn stats(&self) -> &ResolveStats {
        self.orchestrator.stats()
    }

    /// Parse and resolve a reference such as `org.example/lib/1.0` or
    /// `https://repo.example.com/m2!org.example/lib/1.0`.
    ///
    /// # Errors
    /// [`ResolveError::Parse`] for a malformed reference, otherwise see
    /// [`DownloadOrchestrator::resolve`].
    pub fn resolve(&self, reference: &str) -> Result<Artifact> {
        let reference = ArtifactReference::parse(reference)?;
        self.resolve_reference(&reference)
    }

    /// Resolve a parsed reference. An inline repository is searched before
    /// every configured repository.
    ///
    /// # Errors
    /// See [`Self::resolve`].
    pub fn resolve_reference(&self, reference: &ArtifactReference) -> Result<Artifact> {
        let Some(raw) = reference.repository.as_deref() else {
            return self.orchestrator.resolve(
                &reference.coordinate,
                &self.repositories.repositories,
                &self.repositories.default_repositories,
            );
        };

        let inline = self.inline_repository(raw)?;
        debug!(repository = %inline.id, url = %inline.url, "using inline repository");
        let mut repositories = Vec::with_capacity(self.repositories.repositories.len() + 1);
        repositories.push(inline);
        repositories.extend(self.repositories.repositories.iter().cloned());
        self.orchestrator.resolve(
            &reference.coordinate,
            &repositories,
            &self.repositories.default_repositories,
        )
    }

    fn inline_repository(&self, raw: &str) -> Result<RepositorySpec> {
        let mut spec = RepositorySpec::parse(raw)?.with_snapshots(true);
        let named = raw
            .split('@')
            .skip(1)
            .any(|option| option.trim().to_ascii_lowercase().starts_with("id="));
        if !named {
            spec.id = INLINE_REPOSITORY_ID.to_string();
        }
        spec.proxy = select_proxy(&spec, &self.proxies).cloned();
        Ok(spec)
    }
}
