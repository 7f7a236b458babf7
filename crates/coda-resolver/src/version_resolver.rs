//! Turns a requested version into concrete download candidates for one
//! repository.
//!
//! | Requested  | Metadata consulted                 | Repository must allow |
//! |------------|------------------------------------|-----------------------|
//! | exact      | none                               | releases              |
//! | `LATEST`   | artifact-level, last listed entry  | kind of that entry    |
//! | range      | artifact-level, every entry inside | kind of each entry    |
//! | snapshot   | version-level, optional            | snapshots             |

use crate::candidate::DownloadCandidate;
use crate::error::CandidateError;
use coda_config::RepositorySpec;
use coda_core::{Coordinate, SNAPSHOT_SUFFIX, VersionRange, VersionSpec, is_snapshot};
use coda_repository::{Metadata, RepositoryFetcher};
use tracing::{debug, trace};

/// Length of the date part of a `lastUpdated` value (`yyyyMMdd`).
const DATE_LEN: usize = 8;

/// Build number used with a timestamp synthesized from `lastUpdated`.
const SYNTHETIC_BUILD_NUMBER: u32 = 0;

/// Resolves versions against repository metadata.
pub struct VersionResolver<'a> {
    fetcher: &'a dyn RepositoryFetcher,
}

impl<'a> VersionResolver<'a> {
    /// Create a resolver reading metadata through `fetcher`.
    #[must_use]
    pub fn new(fetcher: &'a dyn RepositoryFetcher) -> Self {
        Self { fetcher }
    }

    /// Candidates for `coordinate` in `repository`.
    ///
    /// A range that matches nothing yields an empty list, not an error.
    ///
    /// # Errors
    /// [`CandidateError::Policy`] when the repository does not serve the
    /// requested kind of version, [`CandidateError::VersionResolution`] when
    /// `LATEST` or a range needs metadata that is missing or empty.
    pub fn candidates(
        &self,
        coordinate: &Coordinate,
        repository: &RepositorySpec,
        priority: usize,
    ) -> Result<Vec<DownloadCandidate>, CandidateError> {
        let ctx = Target {
            coordinate,
            repository,
            priority,
        };
        match coordinate.version() {
            VersionSpec::Exact(version) => Ok(vec![ctx.release(version)?]),
            VersionSpec::Snapshot(version) => Ok(vec![self.snapshot(&ctx, version)?]),
            VersionSpec::Latest => self.latest(&ctx).map(|c| vec![c]),
            VersionSpec::Range(range) => self.range(&ctx, range),
        }
    }

    fn latest(&self, ctx: &Target<'_>) -> Result<DownloadCandidate, CandidateError> {
        ctx.require_any()?;
        let metadata = self.artifact_metadata(ctx)?;
        let Some(version) = metadata.latest_version() else {
            return Err(ctx.version_error("metadata lists no versions"));
        };
        debug!(repository = %ctx.repository.id, version, "LATEST resolved");
        if is_snapshot(version) {
            self.snapshot(ctx, version)
        } else {
            ctx.release(version)
        }
    }

    fn range(
        &self,
        ctx: &Target<'_>,
        range: &VersionRange,
    ) -> Result<Vec<DownloadCandidate>, CandidateError> {
        ctx.require_any()?;
        let metadata = self.artifact_metadata(ctx)?;
        let mut candidates = Vec::new();
        for version in metadata.versions.iter().filter(|v| range.contains(v)) {
            let candidate = if is_snapshot(version) {
                self.snapshot(ctx, version)
            } else {
                ctx.release(version)
            };
            match candidate {
                Ok(c) => candidates.push(c),
                Err(e) => trace!(version = %version, error = %e, "range entry skipped"),
            }
        }
        debug!(
            repository = %ctx.repository.id,
            range = %range,
            matched = candidates.len(),
            "range resolved"
        );
        Ok(candidates)
    }

    fn snapshot(&self, ctx: &Target<'_>, version: &str) -> Result<DownloadCandidate, CandidateError> {
        if !ctx.repository.snapshots_enabled {
            return Err(ctx.policy("snapshots"));
        }
        let base = version.strip_suffix(SNAPSHOT_SUFFIX).unwrap_or(version);
        let path = ctx.coordinate.version_metadata_path(version);

        let metadata = match self.fetcher.fetch_metadata(
            &ctx.repository.url,
            &path,
            ctx.repository.proxy.as_ref(),
        ) {
            Ok(metadata) => metadata,
            Err(e) => {
                trace!(repository = %ctx.repository.id, error = %e, "no snapshot metadata, trying literal file");
                return Ok(ctx.candidate(version, version, false));
            }
        };

        match snapshot_build(&metadata) {
            SnapshotBuild::Local => {
                debug!(repository = %ctx.repository.id, version, "local snapshot build");
                Ok(ctx.candidate(version, version, true))
            }
            SnapshotBuild::Timestamped {
                timestamp,
                build_number,
            } => {
                let file_version = format!("{base}-{timestamp}-{build_number}");
                trace!(repository = %ctx.repository.id, file_version = %file_version, "timestamped snapshot");
                Ok(ctx.candidate(version, &file_version, false))
            }
            SnapshotBuild::Unknown => Ok(ctx.candidate(version, version, false)),
        }
    }

    fn artifact_metadata(&self, ctx: &Target<'_>) -> Result<Metadata, CandidateError> {
        self.fetcher
            .fetch_metadata(
                &ctx.repository.url,
                &ctx.coordinate.metadata_path(),
                ctx.repository.proxy.as_ref(),
            )
            .map_err(|e| ctx.version_error(e.to_string()))
    }
}

impl std::fmt::Debug for VersionResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionResolver").finish_non_exhaustive()
    }
}

/// What version-level metadata says about a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotBuild {
    /// Built locally; use the literal `-SNAPSHOT` file.
    Local,
    /// Deployed build with a concrete timestamp.
    Timestamped {
        /// `yyyyMMdd.HHmmss`.
        timestamp: String,
        /// Build number.
        build_number: u32,
    },
    /// Nothing usable; use the literal `-SNAPSHOT` file.
    Unknown,
}

/// Interpret version-level snapshot metadata.
///
/// An explicit timestamp and build number win. Failing that, `lastUpdated`
/// (`yyyyMMddHHmmss`) becomes the timestamp `yyyyMMdd.HHmmss` with build
/// number 0.
#[must_use]
pub fn snapshot_build(metadata: &Metadata) -> SnapshotBuild {
    if let Some(snapshot) = &metadata.snapshot {
        if snapshot.local_copy {
            return SnapshotBuild::Local;
        }
        if let (Some(timestamp), Some(build_number)) = (&snapshot.timestamp, snapshot.build_number) {
            return SnapshotBuild::Timestamped {
                timestamp: timestamp.clone(),
                build_number,
            };
        }
    }
    match metadata.last_updated.as_deref() {
        Some(updated) if updated.len() > DATE_LEN && updated.is_char_boundary(DATE_LEN) => {
            let (date, time) = updated.split_at(DATE_LEN);
            SnapshotBuild::Timestamped {
                timestamp: format!("{date}.{time}"),
                build_number: SYNTHETIC_BUILD_NUMBER,
            }
        }
        _ => SnapshotBuild::Unknown,
    }
}

/// The coordinate and repository a resolution step works on.
struct Target<'a> {
    coordinate: &'a Coordinate,
    repository: &'a RepositorySpec,
    priority: usize,
}

impl Target<'_> {
    fn release(&self, version: &str) -> Result<DownloadCandidate, CandidateError> {
        if !self.repository.releases_enabled {
            return Err(self.policy("releases"));
        }
        Ok(self.candidate(version, version, false))
    }

    fn require_any(&self) -> Result<(), CandidateError> {
        if self.repository.releases_enabled || self.repository.snapshots_enabled {
            Ok(())
        } else {
            Err(self.policy("releases or snapshots"))
        }
    }

    fn candidate(&self, version: &str, file_version: &str, local: bool) -> DownloadCandidate {
        DownloadCandidate {
            resolved_version: version.to_string(),
            file_version: file_version.to_string(),
            repository_priority: self.priority,
            repository_id: self.repository.id.clone(),
            repository_url: self.repository.url.clone(),
            artifact_path: self.coordinate.artifact_path(version, file_version),
            proxy: self.repository.proxy.clone(),
            is_local_snapshot_build: local,
        }
    }

    fn policy(&self, kind: &'static str) -> CandidateError {
        CandidateError::Policy {
            repository: self.repository.id.clone(),
            kind,
        }
    }

    fn version_error(&self, message: impl Into<String>) -> CandidateError {
        CandidateError::VersionResolution {
            repository: self.repository.id.clone(),
            message: message.into(),
        }
    }
}
