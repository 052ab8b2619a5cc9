//! Resolved configuration for forcebridge
//!
//! `BridgeConfig` is immutable after loading and cheap to clone, so it can be
//! handed to every orchestrator invocation.

use forcebridge_core::{
    EnvironmentVariables, DEFAULT_CLI_PROGRAM, DEFAULT_STDOUT_CHANNEL_CAPACITY,
    JSON_TO_STDOUT_VAR,
};
use forcebridge_utils::XdgPaths;
use serde::Deserialize;
use std::path::PathBuf;

/// Runtime settings for driving the external CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Program spawned for every command
    pub cli_program: String,

    /// Environment variable that asks the tool for JSON on stdout
    pub json_env_var: String,

    /// Active project root, used as the working directory and in cache keys
    pub project_root: PathBuf,

    /// Username or alias of the org the project targets
    pub org_identity: Option<String>,

    /// Durable conflict cache location
    pub cache_file: PathBuf,

    /// Capacity of the live stdout broadcast
    pub stdout_channel_capacity: usize,

    /// Additional variables layered over the parent environment
    pub extra_env: EnvironmentVariables,
}

impl BridgeConfig {
    /// Defaults for a project rooted at `project_root`
    pub fn with_project_root(project_root: impl Into<PathBuf>) -> Self {
        Self {
            cli_program: DEFAULT_CLI_PROGRAM.to_string(),
            json_env_var: JSON_TO_STDOUT_VAR.to_string(),
            project_root: project_root.into(),
            org_identity: None,
            cache_file: XdgPaths::conflict_cache_file(),
            stdout_channel_capacity: DEFAULT_STDOUT_CHANNEL_CAPACITY,
            extra_env: EnvironmentVariables::new(),
        }
    }

    /// Environment overlay for spawned processes: extra variables plus the
    /// JSON-output request, which always wins.
    pub fn process_environment(&self) -> EnvironmentVariables {
        let mut env = self.extra_env.clone();
        env.insert(self.json_env_var.clone(), "true");
        env
    }

    pub(crate) fn apply_file(&mut self, file: ConfigFile) {
        if let Some(program) = file.cli_program {
            self.cli_program = program;
        }
        if let Some(var) = file.json_env_var {
            self.json_env_var = var;
        }
        if let Some(org) = file.org_identity {
            self.org_identity = Some(org);
        }
        if let Some(cache_file) = file.cache_file {
            self.cache_file = if cache_file.is_absolute() {
                cache_file
            } else {
                self.project_root.join(cache_file)
            };
        }
        if let Some(capacity) = file.stdout_channel_capacity {
            self.stdout_channel_capacity = capacity;
        }
        if let Some(env) = file.env {
            self.extra_env.merge(env);
        }
    }
}

/// On-disk shape of `forcebridge.json`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub cli_program: Option<String>,
    pub json_env_var: Option<String>,
    pub org_identity: Option<String>,
    pub cache_file: Option<PathBuf>,
    pub stdout_channel_capacity: Option<usize>,
    pub env: Option<EnvironmentVariables>,
}
