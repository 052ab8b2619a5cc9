//! Shared utilities for forcebridge
//!
//! Small helpers used across the workspace: crash-safe file writes, XDG
//! directory resolution and tracing initialisation.

pub mod atomic_file;
pub mod tracing;
pub mod xdg;

pub use atomic_file::*;
pub use xdg::*;
