use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::trace;

use crate::core::error::{DownloadError, DownloadResult};

/// Append-only code-loading unit that grows at runtime.
///
/// Implemented by the host runtime. Entries are never removed or reordered,
/// and adding a file twice is tolerated.
pub trait DynamicClassLoader: Send + Sync {
    /// Called from a blocking thread, never from a runtime worker, so
    /// implementations may touch the filesystem.
    fn add_file(&self, file: &Path) -> DownloadResult<()>;

    /// Snapshot of the entries added so far, in insertion order.
    fn entries(&self) -> Vec<String>;

    /// True if any entry contains `target` as a substring.
    fn contains(&self, target: &str) -> bool {
        self.entries().iter().any(|e| e.contains(target))
    }
}

/// In-process [`DynamicClassLoader`] backed by a shared, growing path list.
#[derive(Debug, Default)]
pub struct AppendOnlyClassLoader {
    files: RwLock<Vec<PathBuf>>,
}

impl AppendOnlyClassLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    /// Entries as file paths.
    pub fn files(&self) -> Vec<PathBuf> {
        self.files.read().clone()
    }
}

impl DynamicClassLoader for AppendOnlyClassLoader {
    fn add_file(&self, file: &Path) -> DownloadResult<()> {
        // Reject unreadable entries before they become visible to lookups.
        let meta = std::fs::metadata(file).map_err(|e| DownloadError::Io {
            path: file.to_path_buf(),
            source: e,
        })?;
        if !meta.is_file() {
            return Err(DownloadError::Other(format!(
                "Classpath entry is not a file: {}",
                file.display()
            )));
        }

        self.files.write().push(file.to_path_buf());
        trace!("Added classpath entry: {:?}", file);
        Ok(())
    }

    fn entries(&self) -> Vec<String> {
        self.files
            .read()
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect()
    }

    fn contains(&self, target: &str) -> bool {
        self.files
            .read()
            .iter()
            .any(|p| p.to_string_lossy().contains(target))
    }
}
