use super::artifact::is_snapshot_version;
use super::{APACHE_SNAPSHOT_REPO, CAMEL_GROUP_ID, MAVEN_CENTRAL_REPO};

/// Builds the ordered list of remote repositories consulted for a coordinate.
///
/// Order matters: resolvers try repositories in sequence, so central always
/// comes first and the snapshot repository (when applicable) last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryListBuilder {
    pub central: String,
    pub snapshot: String,
    /// Group whose `SNAPSHOT` versions are served from the snapshot repository.
    pub framework_group: String,
}

impl Default for RepositoryListBuilder {
    fn default() -> Self {
        Self {
            central: MAVEN_CENTRAL_REPO.to_string(),
            snapshot: APACHE_SNAPSHOT_REPO.to_string(),
            framework_group: CAMEL_GROUP_ID.to_string(),
        }
    }
}

impl RepositoryListBuilder {
    pub fn build(&self, group_id: &str, version: Option<&str>, custom: &[String]) -> Vec<String> {
        let mut repos = Vec::with_capacity(custom.len() + 2);
        repos.push(self.central.clone());
        repos.extend(custom.iter().cloned());

        if group_id == self.framework_group && is_snapshot_version(version) {
            repos.push(self.snapshot.clone());
        }

        repos
    }
}

/// Split a comma-joined repository setting into individual URLs.
///
/// Segments are not trimmed; empty segments are dropped.
pub fn split_repositories(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
