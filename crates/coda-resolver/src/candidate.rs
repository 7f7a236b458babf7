//! Download candidates and their attempt order.

use coda_config::ProxyRule;
use std::cmp::Ordering;
use url::Url;

/// One concrete file to try in one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadCandidate {
    /// Version the candidate resolves to (`1.2.0`, `1.0-SNAPSHOT`).
    pub resolved_version: String,
    /// Version embedded in the file name. Differs from
    /// [`Self::resolved_version`] for timestamped snapshots.
    pub file_version: String,
    /// Position of the repository in its list; lower is preferred.
    pub repository_priority: usize,
    /// Repository id.
    pub repository_id: String,
    /// Repository base URL.
    pub repository_url: Url,
    /// Repository-relative path of the file.
    pub artifact_path: String,
    /// Proxy to go through.
    pub proxy: Option<ProxyRule>,
    /// The file comes from a local snapshot build.
    pub is_local_snapshot_build: bool,
}

/// Attempt order: newest version first, then earliest repository.
///
/// Versions compare lexicographically on the raw string, the same ordering
/// metadata listings use.
#[must_use]
pub fn download_order(a: &DownloadCandidate, b: &DownloadCandidate) -> Ordering {
    b.resolved_version
        .cmp(&a.resolved_version)
        .then(a.repository_priority.cmp(&b.repository_priority))
}

/// Sort candidates for attempting. Local snapshot builds go first; the rest
/// follow [`download_order`]. The sort is stable.
pub fn sort_candidates(candidates: &mut [DownloadCandidate]) {
    candidates.sort_by(|a, b| {
        b.is_local_snapshot_build
            .cmp(&a.is_local_snapshot_build)
            .then_with(|| download_order(a, b))
    });
}
