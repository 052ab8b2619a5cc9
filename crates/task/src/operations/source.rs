use super::{CacheUpdate, Operation, OperationKind};
use crate::command::{Command, CommandBuilder};
use crate::result::{ParsedResult, ResultParser, SourceResultParser};
use forcebridge_core::{Error, Result};

/// `force:source:pull`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePull {
    pub force_overwrite: bool,
}

impl SourcePull {
    pub fn new(force_overwrite: bool) -> Self {
        Self { force_overwrite }
    }
}

impl Operation for SourcePull {
    fn kind(&self) -> OperationKind {
        OperationKind::SourcePull
    }

    fn build(&self, program: &str) -> Result<Command> {
        let mut builder = CommandBuilder::new(program)
            .with_action("force:source:pull")
            .with_switch("--json")
            .with_log_name("force_source_pull_default_scratch_org");
        if self.force_overwrite {
            builder = builder
                .with_switch("--forceoverwrite")
                .with_description("SFDX: Pull Source from Default Scratch Org and Override Conflicts");
        } else {
            builder = builder.with_description("SFDX: Pull Source from Default Scratch Org");
        }
        builder.build()
    }

    fn parse(&self, stdout: &str) -> Option<ParsedResult> {
        Some(SourceResultParser::pull().parse(stdout))
    }

    fn cache_update(&self) -> CacheUpdate {
        CacheUpdate::PushPull
    }
}

/// `force:source:push`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePush {
    pub force_overwrite: bool,
}

impl SourcePush {
    pub fn new(force_overwrite: bool) -> Self {
        Self { force_overwrite }
    }
}

impl Operation for SourcePush {
    fn kind(&self) -> OperationKind {
        OperationKind::SourcePush
    }

    fn build(&self, program: &str) -> Result<Command> {
        let mut builder = CommandBuilder::new(program)
            .with_action("force:source:push")
            .with_switch("--json")
            .with_log_name("force_source_push_default_scratch_org");
        if self.force_overwrite {
            builder = builder
                .with_switch("--forceoverwrite")
                .with_description("SFDX: Push Source to Default Scratch Org and Override Conflicts");
        } else {
            builder = builder.with_description("SFDX: Push Source to Default Scratch Org");
        }
        builder.build()
    }

    fn parse(&self, stdout: &str) -> Option<ParsedResult> {
        Some(SourceResultParser::push().parse(stdout))
    }

    fn cache_update(&self) -> CacheUpdate {
        CacheUpdate::PushPull
    }
}

/// `force:source:deploy` for explicit source paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDeploy {
    pub source_paths: Vec<String>,
}

impl SourceDeploy {
    pub fn new<I, S>(source_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source_paths: source_paths.into_iter().map(Into::into).collect(),
        }
    }
}

impl Operation for SourceDeploy {
    fn kind(&self) -> OperationKind {
        OperationKind::SourceDeploy
    }

    fn build(&self, program: &str) -> Result<Command> {
        if self.source_paths.is_empty() {
            return Err(Error::invalid_command("deploy needs at least one source path"));
        }
        CommandBuilder::new(program)
            .with_action("force:source:deploy")
            .with_flag("--sourcepath", self.source_paths.join(","))
            .with_switch("--json")
            .with_description("SFDX: Deploy Source to Org")
            .with_log_name("force_source_deploy_with_sourcepath_beta")
            .build()
    }

    fn parse(&self, stdout: &str) -> Option<ParsedResult> {
        Some(SourceResultParser::deploy().parse(stdout))
    }

    fn cache_update(&self) -> CacheUpdate {
        CacheUpdate::Deploy
    }
}
