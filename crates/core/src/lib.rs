//! Core domain types, errors, and constants for forcebridge.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum and `Result` alias shared by every crate.
//! - **`types`**: per-file outcomes, conflict-cache values and the
//!   environment overlay for spawned processes.
//! - **`constants`**: shared names such as environment variables and the
//!   companion metadata suffix.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result},
    types::*,
};
