use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::maven::Gav;

/// Observer notified by the downloader. Implemented by the host.
///
/// Callbacks run synchronously on the thread that triggered them (a caller
/// thread or a pool worker) and must not block.
pub trait DownloadListener: Send + Sync {
    /// A coordinate was requested, whether or not a fetch follows.
    fn on_download_requested(&self, gav: &Gav);

    /// A coordinate was found on the boot or dynamic classpath.
    fn on_already_available(&self, gav: &Gav);

    /// A resolved file was registered with the dynamic class loader.
    fn on_artifact_added(&self, _gav: &Gav, _file: &Path) {}
}

/// The single, optional listener shared by the coordinator and the classpath index.
#[derive(Clone, Default)]
pub struct ListenerSlot {
    inner: Arc<RwLock<Option<Arc<dyn DownloadListener>>>>,
}

impl ListenerSlot {
    pub fn new(listener: Option<Arc<dyn DownloadListener>>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(listener)),
        }
    }

    pub fn set(&self, listener: Option<Arc<dyn DownloadListener>>) {
        *self.inner.write() = listener;
    }

    pub fn is_set(&self) -> bool {
        self.inner.read().is_some()
    }

    // The lock is released before the callback runs so listeners may replace themselves.
    fn current(&self) -> Option<Arc<dyn DownloadListener>> {
        self.inner.read().clone()
    }

    pub fn download_requested(&self, gav: &Gav) {
        if let Some(listener) = self.current() {
            listener.on_download_requested(gav);
        }
    }

    pub fn already_available(&self, gav: &Gav) {
        if let Some(listener) = self.current() {
            listener.on_already_available(gav);
        }
    }

    pub fn artifact_added(&self, gav: &Gav, file: &Path) {
        if let Some(listener) = self.current() {
            listener.on_artifact_added(gav, file);
        }
    }
}

impl std::fmt::Debug for ListenerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSlot")
            .field("set", &self.is_set())
            .finish()
    }
}

/// Listener that records every event, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: parking_lot::Mutex<Vec<ListenerEvent>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    Requested(Gav),
    AlreadyAvailable(Gav),
    Added(Gav),
}

impl RecordingListener {
    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&ListenerEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }
}

impl DownloadListener for RecordingListener {
    fn on_download_requested(&self, gav: &Gav) {
        self.events.lock().push(ListenerEvent::Requested(gav.clone()));
    }

    fn on_already_available(&self, gav: &Gav) {
        self.events
            .lock()
            .push(ListenerEvent::AlreadyAvailable(gav.clone()));
    }

    fn on_artifact_added(&self, gav: &Gav, _file: &Path) {
        self.events.lock().push(ListenerEvent::Added(gav.clone()));
    }
}
