//! Command construction for the external CLI
//!
//! A `Command` is an immutable value: program, action and an ordered list of
//! arguments. It does not execute anything. Building is pure and
//! deterministic, so the same inputs always render the same argument vector.

use forcebridge_core::{Error, Result};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;

/// One rendered argument after the action
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Argument {
    /// `--name value`
    Flag { name: String, value: String },
    /// `--name` without a value
    Switch(String),
    /// A bare positional argument
    Positional(String),
}

/// Immutable description of one CLI invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    program: String,
    action: String,
    arguments: Vec<Argument>,
    description: String,
    log_name: String,
}

impl Command {
    /// Build a command from an ordered flag mapping.
    ///
    /// A `None` value is an absent required value and fails the build.
    pub fn build(
        program: &str,
        action: &str,
        flags: &IndexMap<String, Option<String>>,
        description: &str,
        log_name: &str,
    ) -> Result<Self> {
        CommandBuilder::new(program)
            .with_action(action)
            .with_flags(flags.clone())
            .with_description(description)
            .with_log_name(log_name)
            .build()
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn log_name(&self) -> &str {
        &self.log_name
    }

    /// Arguments passed to the program: the action followed by every
    /// argument in insertion order.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(1 + self.arguments.len() * 2);
        argv.push(self.action.clone());
        for argument in &self.arguments {
            match argument {
                Argument::Flag { name, value } => {
                    argv.push(name.clone());
                    argv.push(value.clone());
                }
                Argument::Switch(name) => argv.push(name.clone()),
                Argument::Positional(value) => argv.push(value.clone()),
            }
        }
        argv
    }

    /// Single-line rendering for logs and output channels
    pub fn to_command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in self.argv() {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

#[derive(Debug, Clone)]
enum PendingArgument {
    Flag { name: String, value: Option<String> },
    Switch(String),
    Positional(String),
}

/// Builder for `Command` values.
///
/// Validation is deferred to `build`, so a chain of `with_*` calls never
/// panics and reports the first problem found.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: String,
    action: Option<String>,
    arguments: Vec<PendingArgument>,
    description: Option<String>,
    log_name: Option<String>,
}

impl CommandBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            action: None,
            arguments: Vec::new(),
            description: None,
            log_name: None,
        }
    }

    /// Set the sub-action, e.g. `force:source:pull`
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Add `--name value`
    pub fn with_flag(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_flag_value(name, Some(value.into()))
    }

    /// Add a flag whose value may be missing; a missing value fails `build`
    pub fn with_flag_value(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.arguments.push(PendingArgument::Flag {
            name: name.into(),
            value,
        });
        self
    }

    /// Add every flag of an ordered mapping, in order
    pub fn with_flags(mut self, flags: IndexMap<String, Option<String>>) -> Self {
        self.arguments.extend(
            flags
                .into_iter()
                .map(|(name, value)| PendingArgument::Flag { name, value }),
        );
        self
    }

    /// Add a value-less flag such as `--json`
    pub fn with_switch(mut self, name: impl Into<String>) -> Self {
        self.arguments.push(PendingArgument::Switch(name.into()));
        self
    }

    /// Add a positional argument
    pub fn with_arg(mut self, value: impl Into<String>) -> Self {
        self.arguments.push(PendingArgument::Positional(value.into()));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_log_name(mut self, log_name: impl Into<String>) -> Self {
        self.log_name = Some(log_name.into());
        self
    }

    /// Validate and assemble the command
    pub fn build(self) -> Result<Command> {
        if self.program.trim().is_empty() {
            return Err(Error::invalid_command("program must not be empty"));
        }
        let action = self
            .action
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| Error::invalid_command("action must not be empty"))?;

        let mut seen: HashMap<String, String> = HashMap::new();
        let mut arguments = Vec::with_capacity(self.arguments.len());
        for pending in self.arguments {
            let argument = match pending {
                PendingArgument::Flag { name, value } => {
                    let name = register_flag(&mut seen, &name)?;
                    let value = value.ok_or_else(|| {
                        Error::invalid_command(format!("flag {name} requires a value"))
                    })?;
                    Argument::Flag { name, value }
                }
                PendingArgument::Switch(name) => Argument::Switch(register_flag(&mut seen, &name)?),
                PendingArgument::Positional(value) => Argument::Positional(value),
            };
            arguments.push(argument);
        }

        let log_name = self
            .log_name
            .unwrap_or_else(|| action.replace([':', ' '], "_"));
        let description = self.description.unwrap_or_else(|| action.clone());

        Ok(Command {
            program: self.program,
            action,
            arguments,
            description,
            log_name,
        })
    }
}

/// Normalize a flag name, reject collisions and return its rendered form
fn register_flag(seen: &mut HashMap<String, String>, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let normalized = trimmed.trim_start_matches('-').to_ascii_lowercase();
    if normalized.is_empty() {
        return Err(Error::invalid_command(format!("invalid flag name '{raw}'")));
    }
    let rendered = if trimmed.starts_with('-') {
        trimmed.to_string()
    } else {
        format!("--{trimmed}")
    };
    if let Some(previous) = seen.insert(normalized, rendered.clone()) {
        return Err(Error::invalid_command(format!(
            "flag {rendered} collides with {previous}"
        )));
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn renders_action_then_arguments_in_order() -> Result<()> {
        let command = CommandBuilder::new("sfdx")
            .with_action("force:apex:test:run")
            .with_flag("--tests", "FooTest")
            .with_flag("--resultformat", "human")
            .with_switch("--codecoverage")
            .with_description("SFDX: Run Apex Tests")
            .with_log_name("force_apex_test_run_code_action")
            .build()?;

        assert_eq!(
            command.argv(),
            vec![
                "force:apex:test:run",
                "--tests",
                "FooTest",
                "--resultformat",
                "human",
                "--codecoverage"
            ]
        );
        assert_eq!(
            command.to_command_line(),
            "sfdx force:apex:test:run --tests FooTest --resultformat human --codecoverage"
        );
        assert_eq!(command.to_string(), "SFDX: Run Apex Tests");
        assert_eq!(command.log_name(), "force_apex_test_run_code_action");
        Ok(())
    }

    #[test]
    fn bare_flag_names_get_double_dash() -> Result<()> {
        let command = CommandBuilder::new("sfdx")
            .with_action("force:source:deploy")
            .with_flag("sourcepath", "force-app")
            .build()?;
        assert_eq!(command.argv(), vec!["force:source:deploy", "--sourcepath", "force-app"]);
        Ok(())
    }

    #[test]
    fn missing_flag_value_is_invalid() {
        let err = CommandBuilder::new("sfdx")
            .with_action("force:apex:test:run")
            .with_flag_value("--outputdir", None)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCommand { .. }));
        assert!(err.to_string().contains("--outputdir"));
    }

    #[test]
    fn normalized_flag_collision_is_invalid() {
        let err = CommandBuilder::new("sfdx")
            .with_action("force:source:pull")
            .with_switch("--forceoverwrite")
            .with_flag("-ForceOverwrite", "true")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCommand { .. }));
    }

    #[test]
    fn missing_action_is_invalid() {
        let err = CommandBuilder::new("sfdx").build().unwrap_err();
        assert!(matches!(err, Error::InvalidCommand { .. }));
    }

    #[test]
    fn defaults_for_description_and_log_name() -> Result<()> {
        let command = CommandBuilder::new("sfdx")
            .with_action("force:source:pull")
            .build()?;
        assert_eq!(command.description(), "force:source:pull");
        assert_eq!(command.log_name(), "force_source_pull");
        Ok(())
    }

    #[test]
    fn build_from_mapping() -> Result<()> {
        let mut flags = IndexMap::new();
        flags.insert("--sourcepath".to_string(), Some("a,b".to_string()));
        flags.insert("--wait".to_string(), Some("10".to_string()));

        let command = Command::build("sfdx", "force:source:deploy", &flags, "Deploy", "deploy")?;
        assert_eq!(
            command.argv(),
            vec!["force:source:deploy", "--sourcepath", "a,b", "--wait", "10"]
        );
        Ok(())
    }

    fn flag_mapping() -> impl Strategy<Value = IndexMap<String, Option<String>>> {
        prop::collection::vec(("[a-z]{1,10}", "[a-zA-Z0-9_,./-]{0,12}"), 0..8).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(name, value)| (format!("--{name}"), Some(value)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn building_is_deterministic_and_order_preserving(flags in flag_mapping()) {
            let first = Command::build("sfdx", "force:source:push", &flags, "Push", "push").unwrap();
            let second = Command::build("sfdx", "force:source:push", &flags, "Push", "push").unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.argv(), second.argv());

            let expected: Vec<String> = std::iter::once("force:source:push".to_string())
                .chain(flags.iter().flat_map(|(name, value)| {
                    [name.clone(), value.clone().unwrap_or_default()]
                }))
                .collect();
            prop_assert_eq!(first.argv(), expected);
        }
    }
}
