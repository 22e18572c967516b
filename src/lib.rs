// ─── Dependency Downloader ───
// `DependencyDownloader::ensure` makes a Maven coordinate and its transitive
// dependencies loadable by the running process. Resolution is delegated to an
// `ArtifactResolver`; resolved files are registered with a `DynamicClassLoader`
// unless the boot or dynamic classpath already has them.

mod core;

pub use crate::core::classpath::{
    AppendOnlyClassLoader, BootClasspath, ClasspathHit, ClasspathIndex, DynamicClassLoader,
};
pub use crate::core::downloader::{
    verify_all, verify_artifact, DependencyDownloader, DownloadHandle, DownloadListener,
    DownloadPool, DownloadSummary, DownloaderBuilder, EnsureOutcome, ListenerEvent, ListenerSlot,
    RecordingListener, ShutdownReport, TaskResult,
};
pub use crate::core::error::{DownloadError, DownloadResult};
pub use crate::core::logging;
pub use crate::core::maven::{
    is_snapshot_version, split_repositories, ArtifactResolver, Gav, RepositoryListBuilder,
    ResolveRequest, ResolvedArtifact, APACHE_SNAPSHOT_REPO, CAMEL_GROUP_ID, MAVEN_CENTRAL_REPO,
};
pub use crate::core::settings::{default_settings_path, DownloaderSettings};
