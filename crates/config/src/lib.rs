//! Configuration loading for forcebridge
//!
//! Settings come from built-in defaults, an optional `forcebridge.json` in the
//! project root, `FORCEBRIDGE_*` environment variables and explicit overrides,
//! in increasing order of precedence.

pub mod config;
pub mod loader;

pub use config::*;
pub use loader::*;
