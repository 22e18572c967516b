use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::core::error::{DownloadError, DownloadResult};

/// Outcome of [`DownloadPool::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// True if every task finished inside the drain window.
    pub drained: bool,
    /// Tasks still running when the window closed; they were cancelled.
    pub abandoned: usize,
}

/// Bounded worker pool for download tasks.
///
/// Tasks run on a tokio runtime. A semaphore caps how many of them do work at
/// once, and a [`TaskTracker`] lets shutdown wait for them. A
/// [`CancellationToken`] abandons whatever is left once the drain window closes.
pub struct DownloadPool {
    runtime: Handle,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl DownloadPool {
    /// Create a pool on the given runtime.
    pub fn new(runtime: Handle, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            runtime,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Create a pool on the runtime the caller is running in.
    ///
    /// # Panics
    /// Outside a tokio runtime.
    pub fn current(max_concurrent: usize) -> Self {
        Self::new(Handle::current(), max_concurrent)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Tasks spawned and not yet finished, including those waiting for a permit.
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_closed(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Spawn a download task. The task waits for a worker slot before `work`
    /// starts and is abandoned with [`DownloadError::Cancelled`] if the pool
    /// is torn down first. Never blocks the caller.
    pub fn spawn<F, T>(
        &self,
        name: String,
        work: F,
    ) -> DownloadResult<JoinHandle<DownloadResult<T>>>
    where
        F: Future<Output = DownloadResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        if self.tracker.is_closed() {
            return Err(DownloadError::ShuttingDown);
        }

        let permits = self.permits.clone();
        let cancel = self.cancel.clone();
        let task = async move {
            let _permit: OwnedSemaphorePermit = tokio::select! {
                permit = permits.acquire_owned() => permit
                    .map_err(|_| DownloadError::Cancelled(name.clone()))?,
                _ = cancel.cancelled() => return Err(DownloadError::Cancelled(name)),
            };

            tokio::select! {
                result = work => result,
                _ = cancel.cancelled() => {
                    warn!("Abandoning download of {}", name);
                    Err(DownloadError::Cancelled(name))
                }
            }
        };

        Ok(self.tracker.spawn_on(task, &self.runtime))
    }

    /// Stop accepting tasks, wait up to `drain` for running ones, then cancel
    /// the rest.
    pub async fn shutdown(&self, drain: Duration) -> ShutdownReport {
        self.tracker.close();
        let started = Instant::now();
        info!(
            "Shutting down download pool ({} task(s) in flight)",
            self.tracker.len()
        );

        let drained = tokio::time::timeout(drain, self.tracker.wait())
            .await
            .is_ok();
        let abandoned = if drained { 0 } else { self.tracker.len() };

        self.cancel.cancel();
        self.permits.close();
        if !drained {
            // Cancelled tasks exit at their next await point.
            self.tracker.wait().await;
        }

        debug!(
            "Download pool stopped in {:?} (drained: {}, abandoned: {})",
            started.elapsed(),
            drained,
            abandoned
        );
        ShutdownReport { drained, abandoned }
    }
}

impl std::fmt::Debug for DownloadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadPool")
            .field("max_concurrent", &self.max_concurrent)
            .field("active", &self.tracker.len())
            .field("closed", &self.tracker.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_is_capped() {
        let pool = DownloadPool::current(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let running = running.clone();
                let peak = peak.clone();
                pool.spawn(format!("task-{i}"), async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(i)
                })
                .unwrap()
            })
            .collect();

        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn closed_pool_rejects_new_tasks() {
        let pool = DownloadPool::current(1);
        let report = pool.shutdown(Duration::from_millis(10)).await;
        assert_eq!(report, ShutdownReport { drained: true, abandoned: 0 });

        let err = pool.spawn("late".to_string(), async { Ok(()) }).unwrap_err();
        assert!(matches!(err, DownloadError::ShuttingDown));
    }

    #[tokio::test]
    async fn slow_tasks_are_abandoned_after_drain_window() {
        let pool = DownloadPool::current(1);
        let handle = pool
            .spawn("stuck".to_string(), async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .unwrap();

        let report = pool.shutdown(Duration::from_millis(20)).await;
        assert!(!report.drained);
        assert_eq!(report.abandoned, 1);
        assert!(matches!(
            handle.await.unwrap(),
            Err(DownloadError::Cancelled(name)) if name == "stuck"
        ));
    }
}
