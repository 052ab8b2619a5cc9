//! Operations the orchestrator can run
//!
//! Each operation knows how to build its command, how to read the tool's
//! stdout and which conflict-cache update a success implies.

mod apex_test;
mod config_set;
mod source;

pub use apex_test::ApexTestRun;
pub use config_set::ConfigSet;
pub use source::{SourceDeploy, SourcePull, SourcePush};

use crate::command::Command;
use crate::result::ParsedResult;
use forcebridge_core::Result;
use std::fmt;

/// Kind tag for logging and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    SourcePull,
    SourcePush,
    SourceDeploy,
    ApexTestRun,
    ConfigSet,
    Custom(&'static str),
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::SourcePull => "source-pull",
            OperationKind::SourcePush => "source-push",
            OperationKind::SourceDeploy => "source-deploy",
            OperationKind::ApexTestRun => "apex-test-run",
            OperationKind::ConfigSet => "config-set",
            OperationKind::Custom(name) => *name,
        };
        f.write_str(name)
    }
}

/// Conflict-cache write that follows a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheUpdate {
    None,
    /// One shared timestamp, with companion metadata files added
    PushPull,
    /// One shared timestamp for exactly the reported files
    Deploy,
}

/// A CLI capability the orchestrator can build, run and interpret
pub trait Operation: Send + Sync {
    fn kind(&self) -> OperationKind;

    /// Build the command for `program`
    fn build(&self, program: &str) -> Result<Command>;

    /// Decode captured stdout. `None` means the command has no structured
    /// output and its exit code alone decides the outcome.
    fn parse(&self, _stdout: &str) -> Option<ParsedResult> {
        None
    }

    fn cache_update(&self) -> CacheUpdate {
        CacheUpdate::None
    }
}
