mod coordinator;
mod listener;
mod pool;
mod verify;

pub use coordinator::{
    DependencyDownloader, DownloadHandle, DownloadSummary, DownloaderBuilder, EnsureOutcome,
    TaskResult,
};
pub use listener::{DownloadListener, ListenerEvent, ListenerSlot, RecordingListener};
pub use pool::{DownloadPool, ShutdownReport};
pub use verify::{verify_all, verify_artifact};
