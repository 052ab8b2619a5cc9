use super::{Operation, OperationKind};
use crate::command::{Command, CommandBuilder};
use forcebridge_core::Result;

/// Sets the project's default org. Only the first comma-separated entry of
/// the given username or alias is used; an empty value unsets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSet {
    username_or_alias: String,
}

impl ConfigSet {
    pub fn new(username_or_alias: &str) -> Self {
        let first = username_or_alias.split(',').next().unwrap_or_default();
        Self {
            username_or_alias: first.trim().to_string(),
        }
    }

    pub fn username_or_alias(&self) -> &str {
        &self.username_or_alias
    }
}

impl Operation for ConfigSet {
    fn kind(&self) -> OperationKind {
        OperationKind::ConfigSet
    }

    fn build(&self, program: &str) -> Result<Command> {
        CommandBuilder::new(program)
            .with_action("force:config:set")
            .with_arg(format!("defaultusername={}", self.username_or_alias))
            .with_description("SFDX: Set a Default Org")
            .with_log_name("force_config_set_org")
            .build()
    }
}
