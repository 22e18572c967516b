use std::path::PathBuf;

use async_trait::async_trait;

use super::artifact::Gav;
use crate::core::error::DownloadResult;

/// Everything an external resolver needs to satisfy one download task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub coordinates: Vec<Gav>,
    /// Tried in order.
    pub repositories: Vec<String>,
    pub use_cache: bool,
    /// Bypass the resolver's local cache and re-resolve against the remotes.
    pub fresh: bool,
    pub transitive: bool,
    pub prefer_remote: bool,
}

/// A file produced by the resolver for one coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub gav: Gav,
    pub file: PathBuf,
    /// Expected SHA-1 of `file`, when the resolver knows it.
    pub sha1: Option<String>,
}

impl ResolvedArtifact {
    pub fn new(gav: Gav, file: impl Into<PathBuf>) -> Self {
        Self {
            gav,
            file: file.into(),
            sha1: None,
        }
    }

    pub fn with_sha1(mut self, sha1: impl Into<String>) -> Self {
        self.sha1 = Some(sha1.into());
        self
    }
}

/// Resolves coordinates (and optionally their transitive dependencies) into
/// local files.
///
/// Implementations own version conflict handling, repository metadata and
/// caching; they fail with [`DownloadError::Resolution`] when no repository
/// satisfies a coordinate.
///
/// [`DownloadError::Resolution`]: crate::core::error::DownloadError::Resolution
#[async_trait]
pub trait ArtifactResolver: Send + Sync + 'static {
    async fn resolve(&self, request: ResolveRequest) -> DownloadResult<Vec<ResolvedArtifact>>;
}
