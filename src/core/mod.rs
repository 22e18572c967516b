// ─── Dependency Downloader Core ───
// Makes Maven coordinates loadable at runtime without fetching anything twice.
//
// Architecture:
//   core/
//     maven/      — Coordinates, repository list, external resolver contract
//     classpath/  — Boot snapshot, dynamic class loader, presence index
//     downloader/ — Coordinator, bounded worker pool, listener, verification
//     settings    — Configuration surface
//     logging     — Subscriber setup for hosts

pub mod classpath;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod maven;
pub mod settings;
