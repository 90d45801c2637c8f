//! Persistence: editor projects saved as verifiable snapshots.
//!
//! # Invariants
//! - Snapshot files are only ever added, never rewritten.
//! - Every snapshot is hash-chained in the integrity manifest and verified on load.
//! - Unknown schema versions and hash mismatches fail closed.

pub mod snapshot;
pub mod store;

pub use snapshot::ProjectSnapshot;
pub use store::{IntegrityManifest, ManifestEntry, ProjectMeta, ProjectStore, StoreError};
