//! Shared domain types.
//!
//! These are the values that flow between the command pipeline and the
//! conflict cache: per-file outcomes reported by the CLI tool, the cache
//! entries derived from them, and the environment overlay handed to the
//! spawned process.

pub mod conflict;
pub mod environment;
pub mod outcome;

pub use conflict::{CacheEntry, FileProperties};
pub use environment::EnvironmentVariables;
pub use outcome::FileOutcome;
