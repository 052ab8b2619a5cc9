//! Command execution for forcebridge
//!
//! This crate builds CLI commands, runs them as child processes with
//! streamed output and cooperative cancellation, decodes their JSON results
//! and drives whole operations through the `ExecutionOrchestrator`.

pub mod command;
pub mod command_executor;
pub mod operations;
pub mod orchestrator;
pub mod result;

pub use command::*;
pub use command_executor::*;
pub use operations::*;
pub use orchestrator::*;
pub use result::*;
