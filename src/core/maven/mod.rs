mod artifact;
mod repository;
mod resolver;

pub use artifact::{is_snapshot_version, Gav};
pub use repository::{split_repositories, RepositoryListBuilder};
pub use resolver::{ArtifactResolver, ResolveRequest, ResolvedArtifact};

/// Well-known repositories and the framework group used for snapshot lookups.
pub const MAVEN_CENTRAL_REPO: &str = "https://repo1.maven.org/maven2/";
pub const APACHE_SNAPSHOT_REPO: &str = "https://repository.apache.org/snapshots";
pub const CAMEL_GROUP_ID: &str = "org.apache.camel";
