use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, error, info, trace};

use super::listener::{DownloadListener, ListenerSlot};
use super::pool::{DownloadPool, ShutdownReport};
use super::verify::verify_all;
use crate::core::classpath::{
    AppendOnlyClassLoader, BootClasspath, ClasspathHit, ClasspathIndex, DynamicClassLoader,
};
use crate::core::error::{DownloadError, DownloadResult};
use crate::core::maven::{
    ArtifactResolver, Gav, RepositoryListBuilder, ResolveRequest, ResolvedArtifact,
};
use crate::core::settings::DownloaderSettings;

/// What a finished download task did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub gav: Gav,
    /// Files registered with the dynamic class loader, in resolver order.
    pub added: Vec<PathBuf>,
    /// Resolved coordinates that were already on a classpath.
    pub already_present: Vec<Gav>,
}

pub type TaskResult = Result<DownloadSummary, Arc<DownloadError>>;

/// Shared view of one in-flight download. Cloning is cheap; every clone
/// observes the same result.
#[derive(Clone)]
pub struct DownloadHandle {
    key: String,
    result: Shared<BoxFuture<'static, TaskResult>>,
}

impl DownloadHandle {
    fn new(key: String, rx: oneshot::Receiver<TaskResult>) -> Self {
        let abandoned = key.clone();
        let result = async move {
            rx.await
                .unwrap_or_else(|_| Err(Arc::new(DownloadError::Cancelled(abandoned))))
        }
        .boxed()
        .shared();
        Self { key, result }
    }

    /// The `group:artifact:version` key of the task.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Wait for the task to finish.
    pub async fn wait(self) -> TaskResult {
        self.result.await
    }

    /// The result, if the task has already finished and been awaited by someone.
    pub fn peek(&self) -> Option<TaskResult> {
        self.result.peek().cloned()
    }
}

impl fmt::Debug for DownloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadHandle")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Result of [`DependencyDownloader::ensure`].
#[derive(Debug, Clone)]
pub enum EnsureOutcome {
    /// Already loadable; nothing was submitted.
    Skipped(ClasspathHit),
    /// A new download task was started.
    Submitted(DownloadHandle),
    /// A download for the same coordinate was already running.
    Joined(DownloadHandle),
}

impl EnsureOutcome {
    pub fn handle(&self) -> Option<&DownloadHandle> {
        match self {
            EnsureOutcome::Skipped(_) => None,
            EnsureOutcome::Submitted(h) | EnsureOutcome::Joined(h) => Some(h),
        }
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self, EnsureOutcome::Submitted(_))
    }

    /// Wait for the underlying task, if any.
    pub async fn wait(self) -> Result<Option<DownloadSummary>, Arc<DownloadError>> {
        match self {
            EnsureOutcome::Skipped(_) => Ok(None),
            EnsureOutcome::Submitted(h) | EnsureOutcome::Joined(h) => h.wait().await.map(Some),
        }
    }
}

struct Inner {
    settings: DownloaderSettings,
    repositories: RepositoryListBuilder,
    custom_repos: Vec<String>,
    task_timeout: Option<Duration>,
    index: ClasspathIndex,
    listener: ListenerSlot,
    resolver: Arc<dyn ArtifactResolver>,
    pool: DownloadPool,
    in_flight: Mutex<HashMap<String, DownloadHandle>>,
}

/// Removes a key from the in-flight registry when its task ends, however it ends.
struct InFlightGuard {
    inner: Arc<Inner>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.in_flight.lock().remove(&self.key);
    }
}

/// Makes coordinates loadable at runtime, fetching each one at most once at a time.
///
/// ```ignore
/// let downloader = DependencyDownloader::builder(resolver)
///     .settings(DownloaderSettings::load_default())
///     .class_loader(loader)
///     .build()?;
///
/// downloader.ensure(&Gav::parse("org.apache.camel:camel-kafka:4.4.0")?)?;
/// ```
#[derive(Clone)]
pub struct DependencyDownloader {
    inner: Arc<Inner>,
}

impl DependencyDownloader {
    pub fn builder(resolver: Arc<dyn ArtifactResolver>) -> DownloaderBuilder {
        DownloaderBuilder::new(resolver)
    }

    /// Make `gav` and its transitive dependencies loadable.
    ///
    /// Returns immediately; the fetch, if one is needed, runs on the worker
    /// pool. Safe to call from any thread.
    pub fn ensure(&self, gav: &Gav) -> DownloadResult<EnsureOutcome> {
        let inner = &self.inner;
        inner.listener.download_requested(gav);

        let key = gav.key();
        let mut in_flight = inner.in_flight.lock();

        if let Some(handle) = in_flight.get(&key) {
            debug!("Download of {} already in progress", key);
            return Ok(EnsureOutcome::Joined(handle.clone()));
        }

        if let Some(hit) = inner.index.lookup(gav) {
            drop(in_flight);
            inner.index.notify_hit(gav, hit);
            return Ok(EnsureOutcome::Skipped(hit));
        }

        if inner.pool.is_closed() {
            return Err(DownloadError::ShuttingDown);
        }

        let (tx, rx) = oneshot::channel();
        let handle = DownloadHandle::new(key.clone(), rx);
        in_flight.insert(key.clone(), handle.clone());
        drop(in_flight);

        let guard = InFlightGuard {
            inner: inner.clone(),
            key: key.clone(),
        };
        let task_inner = inner.clone();
        let task_gav = gav.clone();
        let work = async move {
            let result = run_task(&task_inner, &task_gav).await;
            drop(guard);
            // Failures were logged by the task; waiters get them through the handle.
            let _ = tx.send(result.map_err(Arc::new));
            Ok::<(), DownloadError>(())
        };

        // A rejected spawn drops `work`, which clears the registry entry and
        // fails any joiners with `Cancelled`.
        inner.pool.spawn(key, work)?;
        Ok(EnsureOutcome::Submitted(handle))
    }

    /// Number of download tasks currently registered.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.lock().len()
    }

    pub fn set_listener(&self, listener: Option<Arc<dyn DownloadListener>>) {
        self.inner.listener.set(listener);
    }

    pub fn index(&self) -> &ClasspathIndex {
        &self.inner.index
    }

    pub fn settings(&self) -> &DownloaderSettings {
        &self.inner.settings
    }

    /// Stop accepting work, give running downloads up to `drain` to finish,
    /// then abandon them.
    pub async fn shutdown(&self, drain: Duration) -> ShutdownReport {
        self.inner.pool.shutdown(drain).await
    }
}

impl fmt::Debug for DependencyDownloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyDownloader")
            .field("index", &self.inner.index)
            .field("pool", &self.inner.pool)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

async fn run_task(inner: &Inner, gav: &Gav) -> DownloadResult<DownloadSummary> {
    let started = Instant::now();
    let fetch = AssertUnwindSafe(with_slow_notice(inner, gav, fetch_and_register(inner, gav)))
        .catch_unwind();

    let outcome = match inner.task_timeout {
        Some(limit) => match tokio::time::timeout(limit, fetch).await {
            Ok(outcome) => outcome,
            Err(_) => Ok(Err(DownloadError::Timeout {
                gav: gav.key(),
                after: limit,
            })),
        },
        None => fetch.await,
    };

    let result = outcome.unwrap_or_else(|panic| {
        Err(DownloadError::TaskPanicked {
            gav: gav.key(),
            message: panic_message(panic.as_ref()),
        })
    });

    match &result {
        Ok(summary) => debug!(
            "Downloaded {} in {:?} ({} added, {} already present)",
            gav,
            started.elapsed(),
            summary.added.len(),
            summary.already_present.len()
        ),
        Err(e) => error!("Error downloading {}: {}", gav, e),
    }
    result
}

async fn with_slow_notice<F>(inner: &Inner, gav: &Gav, fut: F) -> F::Output
where
    F: std::future::Future,
{
    let notice = inner.settings.slow_download_notice();
    tokio::pin!(fut);
    tokio::select! {
        out = &mut fut => out,
        _ = tokio::time::sleep(notice) => {
            info!("Downloading {} (still in progress after {:?})", gav, notice);
            fut.await
        }
    }
}

async fn fetch_and_register(inner: &Inner, gav: &Gav) -> DownloadResult<DownloadSummary> {
    debug!("Downloading: {}", gav);
    let request = ResolveRequest {
        coordinates: vec![gav.clone()],
        repositories: inner.repositories.build(
            &gav.group_id,
            gav.version.as_deref(),
            &inner.custom_repos,
        ),
        use_cache: false,
        fresh: inner.settings.fresh,
        transitive: true,
        prefer_remote: true,
    };

    let artifacts = inner.resolver.resolve(request).await?;
    debug!(
        "Resolved {} -> [{}]",
        gav,
        artifacts
            .iter()
            .map(|a| a.gav.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    // File checks and loader mutation touch the filesystem; keep them off the runtime workers.
    let index = inner.index.clone();
    let listener = inner.listener.clone();
    let verify = inner.settings.verify_artifacts;
    let root = gav.clone();
    tokio::task::spawn_blocking(move || register_all(&index, &listener, root, artifacts, verify))
        .await
        .map_err(|e| DownloadError::TaskPanicked {
            gav: gav.key(),
            message: e.to_string(),
        })?
}

fn register_all(
    index: &ClasspathIndex,
    listener: &ListenerSlot,
    gav: Gav,
    artifacts: Vec<ResolvedArtifact>,
    verify: bool,
) -> DownloadResult<DownloadSummary> {
    // Nothing is registered unless every new file checks out.
    if verify {
        let pending: Vec<_> = artifacts
            .iter()
            .filter(|a| index.lookup(&a.gav).is_none())
            .cloned()
            .collect();
        verify_all(&pending)?;
    }

    let mut summary = DownloadSummary {
        gav,
        added: Vec::new(),
        already_present: Vec::new(),
    };
    for artifact in artifacts {
        if index.already_available(&artifact.gav) {
            summary.already_present.push(artifact.gav);
            continue;
        }
        index.loader().add_file(&artifact.file)?;
        trace!("Added classpath: {}", artifact.gav);
        listener.artifact_added(&artifact.gav, &artifact.file);
        summary.added.push(artifact.file);
    }
    Ok(summary)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Assembles a [`DependencyDownloader`].
pub struct DownloaderBuilder {
    resolver: Arc<dyn ArtifactResolver>,
    settings: DownloaderSettings,
    boot: Option<BootClasspath>,
    loader: Option<Arc<dyn DynamicClassLoader>>,
    listener: Option<Arc<dyn DownloadListener>>,
    runtime: Option<Handle>,
    task_timeout: Option<Option<Duration>>,
}

impl DownloaderBuilder {
    fn new(resolver: Arc<dyn ArtifactResolver>) -> Self {
        Self {
            resolver,
            settings: DownloaderSettings::default(),
            boot: None,
            loader: None,
            listener: None,
            runtime: None,
            task_timeout: None,
        }
    }

    pub fn settings(mut self, settings: DownloaderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Defaults to the snapshot in the variable named by
    /// `DownloaderSettings::boot_classpath_env`, captured at build time.
    pub fn boot_classpath(mut self, boot: BootClasspath) -> Self {
        self.boot = Some(boot);
        self
    }

    /// Defaults to a fresh [`AppendOnlyClassLoader`].
    pub fn class_loader(mut self, loader: Arc<dyn DynamicClassLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn listener(mut self, listener: Arc<dyn DownloadListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Defaults to the runtime the builder is called from.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Overrides `DownloaderSettings::task_timeout_secs` with finer granularity.
    pub fn task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> DownloadResult<DependencyDownloader> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| {
                DownloadError::Other(format!("No tokio runtime for download pool: {e}"))
            })?,
        };

        let boot = self
            .boot
            .unwrap_or_else(|| BootClasspath::from_env(&self.settings.boot_classpath_env));
        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(AppendOnlyClassLoader::new()));
        let listener = ListenerSlot::new(self.listener);
        let index = ClasspathIndex::new(boot, loader, listener.clone());

        let pool = DownloadPool::new(runtime, self.settings.worker_limit());
        let task_timeout = self
            .task_timeout
            .unwrap_or_else(|| self.settings.task_timeout());

        info!(
            "Dependency downloader ready ({} boot entries, {} workers, repos: {:?})",
            index.boot().entries().len(),
            pool.max_concurrent(),
            self.settings.repos
        );

        Ok(DependencyDownloader {
            inner: Arc::new(Inner {
                repositories: self.settings.repository_builder(),
                custom_repos: self.settings.custom_repositories(),
                task_timeout,
                settings: self.settings,
                index,
                listener,
                resolver: self.resolver,
                pool,
                in_flight: Mutex::new(HashMap::new()),
            }),
        })
    }
}
