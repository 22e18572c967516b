use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::core::error::{DownloadError, DownloadResult};

/// A dependency coordinate (group, artifact, optional version).
///
/// Supported string formats:
///   `groupId:artifactId`
///   `groupId:artifactId:version`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Gav {
    pub group_id: String,
    /// An empty artifact id carries no identifying information and is
    /// always considered available.
    pub artifact_id: String,
    pub version: Option<String>,
}

impl Gav {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: Option<&str>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.map(str::to_string),
        }
    }

    /// Parse a coordinate string.
    ///
    /// # Examples
    /// ```
    /// use dependency_downloader::Gav;
    ///
    /// let gav = Gav::parse("org.apache.camel:camel-kafka:4.4.0").unwrap();
    /// assert_eq!(gav.artifact_id, "camel-kafka");
    /// ```
    pub fn parse(coord: &str) -> DownloadResult<Self> {
        let parts: Vec<&str> = coord.split(':').collect();

        let gav = match parts.len() {
            2 => Self::new(parts[0], parts[1], None),
            3 => Self::new(
                parts[0],
                parts[1],
                Some(parts[2]).filter(|v| !v.is_empty()),
            ),
            _ => return Err(DownloadError::InvalidCoordinate(coord.to_string())),
        };

        if gav.group_id.is_empty() {
            return Err(DownloadError::InvalidCoordinate(coord.to_string()));
        }
        Ok(gav)
    }

    /// The string searched for on the classpath: `artifactId[-version]`.
    pub fn dedup_target(&self) -> String {
        match &self.version {
            Some(v) => format!("{}-{}", self.artifact_id, v),
            None => self.artifact_id.clone(),
        }
    }

    /// Key identifying the download task for this coordinate.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// True for pre-release builds whose version carries the `SNAPSHOT` marker.
    pub fn is_snapshot(&self) -> bool {
        is_snapshot_version(self.version.as_deref())
    }

    /// Local path relative to a Maven-layout repository root, when a version is known.
    ///
    /// `<group_path>/<artifact_id>/<version>/<artifact_id>-<version>.jar`
    pub fn local_path(&self) -> Option<PathBuf> {
        let version = self.version.as_deref()?;
        Some(
            PathBuf::from(self.group_id.replace('.', "/"))
                .join(&self.artifact_id)
                .join(version)
                .join(format!("{}-{}.jar", self.artifact_id, version)),
        )
    }
}

/// True when `version` is present and carries the `SNAPSHOT` marker.
pub fn is_snapshot_version(version: Option<&str>) -> bool {
    version.is_some_and(|v| v.contains("SNAPSHOT"))
}

impl fmt::Display for Gav {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{}:{}", self.group_id, self.artifact_id, v),
            None => write!(f, "{}:{}", self.group_id, self.artifact_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_coordinate() {
        let gav = Gav::parse("org.apache.camel:camel-kafka:4.4.0").unwrap();
        assert_eq!(gav.group_id, "org.apache.camel");
        assert_eq!(gav.artifact_id, "camel-kafka");
        assert_eq!(gav.version.as_deref(), Some("4.4.0"));
    }

    #[test]
    fn parse_without_version() {
        let gav = Gav::parse("com.example:lib").unwrap();
        assert_eq!(gav.version, None);
        assert_eq!(gav.key(), "com.example:lib");
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        assert!(Gav::parse("just-a-name").is_err());
        assert!(Gav::parse("a:b:c:d").is_err());
        assert!(Gav::parse(":b:1.0").is_err());
    }

    #[test]
    fn dedup_target_omits_missing_version() {
        let with = Gav::new("g", "camel-core", Some("4.0.0"));
        let without = Gav::new("g", "camel-core", None);
        assert_eq!(with.dedup_target(), "camel-core-4.0.0");
        assert_eq!(without.dedup_target(), "camel-core");
    }

    #[test]
    fn snapshot_marker() {
        assert!(Gav::new("g", "a", Some("4.1.0-SNAPSHOT")).is_snapshot());
        assert!(!Gav::new("g", "a", Some("4.1.0")).is_snapshot());
        assert!(!Gav::new("g", "a", None).is_snapshot());
    }

    #[test]
    fn local_path_construction() {
        let gav = Gav::parse("org.apache.camel:camel-core:4.0.0").unwrap();
        assert_eq!(
            gav.local_path(),
            Some(PathBuf::from(
                "org/apache/camel/camel-core/4.0.0/camel-core-4.0.0.jar"
            ))
        );
    }
}
