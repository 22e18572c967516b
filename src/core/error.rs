use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Central error type for the dependency downloader.
/// Every module returns `Result<T, DownloadError>`.
#[derive(Debug, Error)]
pub enum DownloadError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Coordinates ─────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidCoordinate(String),

    // ── Resolution ──────────────────────────────────────
    #[error("Failed to resolve {gav}: {message}")]
    Resolution { gav: String, message: String },

    #[error("Download of {gav} timed out after {after:?}")]
    Timeout { gav: String, after: Duration },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Not a readable archive {path:?}: {source}")]
    InvalidArchive {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    // ── Worker pool ─────────────────────────────────────
    #[error("Downloader is shutting down")]
    ShuttingDown,

    #[error("Download of {0} was abandoned during shutdown")]
    Cancelled(String),

    #[error("Download task for {gav} panicked: {message}")]
    TaskPanicked { gav: String, message: String },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type DownloadResult<T> = Result<T, DownloadError>;

impl DownloadError {
    /// Shorthand for resolver implementations reporting a failed coordinate.
    pub fn resolution(gav: impl ToString, message: impl ToString) -> Self {
        DownloadError::Resolution {
            gav: gav.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(source: std::io::Error) -> Self {
        DownloadError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// ── Serialization for host reporting ────────────────────
// Hosts forwarding failures over IPC or into status documents only need the message.
impl serde::Serialize for DownloadError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
