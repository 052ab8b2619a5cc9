//! Conflict-detection cache for forcebridge
//!
//! This crate records, per `(org, project, metadata type, full name)`, the
//! last time a file was known to match the org. It provides:
//! - a flat key/value `Storage` abstraction with file and memory backends
//! - the canonical `CacheKey` constructor
//! - `ConflictCacheService`, the sole writer of cache entries, with an
//!   optional process-wide accessor
//! - a small cache of the last test-run parameters

pub mod global;
pub mod keys;
pub mod service;
pub mod storage;
pub mod test_run;

pub use global::{initialize, instance};
pub use keys::CacheKey;
pub use service::{
    bolster_companion_files, ConflictCacheService, StaticIdentity, TimestampSource,
    WorkspaceIdentity,
};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use test_run::{TestParamKind, TestRunParamCache};
