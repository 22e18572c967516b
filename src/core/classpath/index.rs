use std::sync::Arc;

use tracing::debug;

use super::loader::DynamicClassLoader;
use crate::core::downloader::ListenerSlot;
use crate::core::maven::Gav;

/// Immutable snapshot of the classpath the process started with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootClasspath {
    entries: Vec<String>,
}

impl BootClasspath {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a raw classpath string on any of `:`, `|` or `;`.
    pub fn parse(raw: &str) -> Self {
        Self::from_entries(raw.split([':', '|', ';']).filter(|s| !s.is_empty()))
    }

    /// Capture the classpath held in environment variable `var`.
    /// A missing or non-unicode variable yields an empty snapshot.
    pub fn from_env(var: &str) -> Self {
        match std::env::var(var) {
            Ok(raw) => Self::parse(&raw),
            Err(_) => {
                debug!("No boot classpath in ${}", var);
                Self::default()
            }
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn contains(&self, target: &str) -> bool {
        self.entries.iter().any(|e| e.contains(target))
    }
}

/// Where a coordinate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClasspathHit {
    /// No artifact id to look for.
    Trivial,
    Static,
    Dynamic,
}

/// Membership queries over the boot classpath and the dynamic class loader.
///
/// Matching is a substring search for `artifactId[-version]`, so an entry for
/// `foo-1.0-tests` also satisfies `foo:1.0`. Callers rely on this looseness to
/// pick up jars whose paths were produced by other tools.
#[derive(Clone)]
pub struct ClasspathIndex {
    boot: Arc<BootClasspath>,
    loader: Arc<dyn DynamicClassLoader>,
    listener: ListenerSlot,
}

impl ClasspathIndex {
    pub fn new(
        boot: BootClasspath,
        loader: Arc<dyn DynamicClassLoader>,
        listener: ListenerSlot,
    ) -> Self {
        Self {
            boot: Arc::new(boot),
            loader,
            listener,
        }
    }

    pub fn contains_static(&self, target: &str) -> bool {
        self.boot.contains(target)
    }

    pub fn contains_dynamic(&self, target: &str) -> bool {
        self.loader.contains(target)
    }

    /// Presence check without listener side effects.
    pub fn lookup(&self, gav: &Gav) -> Option<ClasspathHit> {
        if gav.artifact_id.is_empty() {
            return Some(ClasspathHit::Trivial);
        }

        let target = gav.dedup_target();
        if self.contains_static(&target) {
            Some(ClasspathHit::Static)
        } else if self.contains_dynamic(&target) {
            Some(ClasspathHit::Dynamic)
        } else {
            None
        }
    }

    /// Presence check that notifies the listener when the coordinate is
    /// found on either classpath.
    pub fn already_available(&self, gav: &Gav) -> bool {
        match self.lookup(gav) {
            Some(hit) => {
                self.notify_hit(gav, hit);
                true
            }
            None => false,
        }
    }

    pub(crate) fn notify_hit(&self, gav: &Gav, hit: ClasspathHit) {
        if hit != ClasspathHit::Trivial {
            debug!("Already on {:?} classpath: {}", hit, gav);
            self.listener.already_available(gav);
        }
    }

    pub fn boot(&self) -> &BootClasspath {
        &self.boot
    }

    pub fn loader(&self) -> &Arc<dyn DynamicClassLoader> {
        &self.loader
    }
}

impl std::fmt::Debug for ClasspathIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClasspathIndex")
            .field("boot_entries", &self.boot.entries().len())
            .field("dynamic_entries", &self.loader.entries().len())
            .finish()
    }
}
