use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{DownloadError, DownloadResult};
use crate::core::maven::{
    split_repositories, RepositoryListBuilder, APACHE_SNAPSHOT_REPO, CAMEL_GROUP_ID,
    MAVEN_CENTRAL_REPO,
};

const SETTINGS_DIR_NAME: &str = "dependency-downloader";
const SETTINGS_FILE: &str = "settings.json";

/// Configuration consumed by the downloader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DownloaderSettings {
    /// Extra repositories, comma separated, consulted after central.
    pub repos: Option<String>,
    /// Force the resolver to re-resolve against remote repositories.
    pub fresh: bool,
    pub framework_group: String,
    pub central_repository: String,
    pub snapshot_repository: String,
    /// Upper bound on concurrently running download tasks.
    pub max_concurrent_downloads: usize,
    /// `None` disables the per-task timeout.
    pub task_timeout_secs: Option<u64>,
    pub slow_download_notice_secs: u64,
    /// Check checksums and archive structure before registering files.
    pub verify_artifacts: bool,
    /// Environment variable holding the boot classpath.
    pub boot_classpath_env: String,
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        Self {
            repos: None,
            fresh: false,
            framework_group: CAMEL_GROUP_ID.to_string(),
            central_repository: MAVEN_CENTRAL_REPO.to_string(),
            snapshot_repository: APACHE_SNAPSHOT_REPO.to_string(),
            max_concurrent_downloads: 10,
            task_timeout_secs: Some(300),
            slow_download_notice_secs: 5,
            verify_artifacts: true,
            boot_classpath_env: "CLASSPATH".to_string(),
        }
    }
}

impl DownloaderSettings {
    pub fn custom_repositories(&self) -> Vec<String> {
        self.repos
            .as_deref()
            .map(split_repositories)
            .unwrap_or_default()
    }

    pub fn repository_builder(&self) -> RepositoryListBuilder {
        RepositoryListBuilder {
            central: self.central_repository.clone(),
            snapshot: self.snapshot_repository.clone(),
            framework_group: self.framework_group.clone(),
        }
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_secs.map(Duration::from_secs)
    }

    pub fn slow_download_notice(&self) -> Duration {
        Duration::from_secs(self.slow_download_notice_secs)
    }

    /// A pool of zero workers would never run anything.
    pub fn worker_limit(&self) -> usize {
        self.max_concurrent_downloads.max(1)
    }

    /// Read settings from a JSON file. Missing keys take their defaults.
    pub fn load_from(path: &Path) -> DownloadResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| DownloadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load from the per-user config directory, falling back to defaults.
    pub fn load_default() -> Self {
        match default_settings_path() {
            Some(path) => Self::load_or_default(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`, falling back to defaults when the file is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!("No settings at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring unreadable settings {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> DownloadResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DownloadError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| DownloadError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE))
}
