mod index;
mod loader;

pub use index::{BootClasspath, ClasspathHit, ClasspathIndex};
pub use loader::{AppendOnlyClassLoader, DynamicClassLoader};
