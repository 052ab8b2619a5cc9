use super::{Operation, OperationKind};
use crate::command::{Command, CommandBuilder};
use forcebridge_core::Result;
use std::path::PathBuf;

/// `force:apex:test:run` with human-readable results written to `output_dir`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApexTestRun {
    /// Class or `Class.method` names, comma separated
    pub tests: Option<String>,
    pub code_coverage: bool,
    pub output_dir: Option<PathBuf>,
}

impl ApexTestRun {
    pub fn new(tests: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            tests: Some(tests.into()),
            code_coverage: false,
            output_dir: Some(output_dir.into()),
        }
    }

    pub fn with_code_coverage(mut self, code_coverage: bool) -> Self {
        self.code_coverage = code_coverage;
        self
    }
}

impl Operation for ApexTestRun {
    fn kind(&self) -> OperationKind {
        OperationKind::ApexTestRun
    }

    fn build(&self, program: &str) -> Result<Command> {
        let mut builder = CommandBuilder::new(program)
            .with_action("force:apex:test:run")
            .with_flag_value("--tests", self.tests.clone())
            .with_flag("--resultformat", "human")
            .with_flag_value(
                "--outputdir",
                self.output_dir
                    .as_ref()
                    .map(|dir| dir.to_string_lossy().into_owned()),
            )
            .with_flag("--loglevel", "error")
            .with_description("SFDX: Run Apex Tests")
            .with_log_name("force_apex_test_run_code_action");
        if self.code_coverage {
            builder = builder.with_switch("--codecoverage");
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::CacheUpdate;
    use forcebridge_core::Error;

    #[test]
    fn renders_test_run_flags_in_order() {
        let command = ApexTestRun::new("FooTest", "/tmp/tests/apex")
            .with_code_coverage(true)
            .build("sfdx")
            .unwrap();
        assert_eq!(
            command.to_command_line(),
            "sfdx force:apex:test:run --tests FooTest --resultformat human --outputdir /tmp/tests/apex --loglevel error --codecoverage"
        );
        assert_eq!(command.log_name(), "force_apex_test_run_code_action");
    }

    #[test]
    fn missing_output_dir_is_invalid() {
        let run = ApexTestRun {
            tests: Some("FooTest".to_string()),
            code_coverage: false,
            output_dir: None,
        };
        assert!(matches!(run.build("sfdx"), Err(Error::InvalidCommand { .. })));
    }

    #[test]
    fn has_no_structured_output() {
        let run = ApexTestRun::new("FooTest", "/tmp");
        assert!(run.parse("{\"status\":0}").is_none());
        assert_eq!(run.cache_update(), CacheUpdate::None);
    }
}
