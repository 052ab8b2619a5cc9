//! Configuration loader for forcebridge
//!
//! Resolves the project root, reads `forcebridge.json` when present, then
//! applies environment variables and explicit overrides on top.

use crate::config::{BridgeConfig, ConfigFile};
use forcebridge_core::{
    Error, Result, CONFIG_FILENAME, FORCEBRIDGE_CACHE_FILE_VAR, FORCEBRIDGE_CLI_VAR,
    FORCEBRIDGE_ORG_VAR,
};
use std::path::{Path, PathBuf};

/// Configuration loader that handles all startup configuration
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Optional project directory (defaults to current directory)
    directory: Option<PathBuf>,
    org_identity: Option<String>,
    cli_program: Option<String>,
    cache_file: Option<PathBuf>,
    /// Whether `FORCEBRIDGE_*` variables are consulted
    read_environment: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            read_environment: true,
            ..Self::default()
        }
    }

    /// Set the project directory to load configuration from
    pub fn directory(mut self, dir: PathBuf) -> Self {
        self.directory = Some(dir);
        self
    }

    /// Override the org identity
    pub fn org_identity(mut self, org: Option<String>) -> Self {
        self.org_identity = org;
        self
    }

    /// Override the CLI program
    pub fn cli_program(mut self, program: Option<String>) -> Self {
        self.cli_program = program;
        self
    }

    /// Override the cache file location
    pub fn cache_file(mut self, path: Option<PathBuf>) -> Self {
        self.cache_file = path;
        self
    }

    /// Set whether environment variables are consulted
    pub fn read_environment(mut self, read: bool) -> Self {
        self.read_environment = read;
        self
    }

    /// Load the configuration
    pub fn load(self) -> Result<BridgeConfig> {
        let project_root = self
            .directory
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .ok_or_else(|| Error::configuration("Failed to determine project directory"))?;
        // Cache keys embed the root, so it must not depend on how it was spelled
        let project_root = std::path::absolute(&project_root)
            .map_err(|e| Error::file_system(&project_root, "resolve project directory", e))?;

        let mut config = BridgeConfig::with_project_root(project_root.clone());

        if let Some(file) = Self::read_config_file(&project_root)? {
            config.apply_file(file);
        }

        if self.read_environment {
            if let Ok(program) = std::env::var(FORCEBRIDGE_CLI_VAR) {
                config.cli_program = program;
            }
            if let Ok(org) = std::env::var(FORCEBRIDGE_ORG_VAR) {
                config.org_identity = Some(org);
            }
            if let Ok(cache_file) = std::env::var(FORCEBRIDGE_CACHE_FILE_VAR) {
                config.cache_file = PathBuf::from(cache_file);
            }
        }

        if let Some(program) = self.cli_program {
            config.cli_program = program;
        }
        if let Some(org) = self.org_identity {
            config.org_identity = Some(org);
        }
        if let Some(cache_file) = self.cache_file {
            config.cache_file = cache_file;
        }

        if config.cli_program.trim().is_empty() {
            return Err(Error::configuration("cli program must not be empty"));
        }
        if config.stdout_channel_capacity == 0 {
            return Err(Error::configuration(
                "stdoutChannelCapacity must be greater than zero",
            ));
        }

        tracing::debug!(
            project_root = %config.project_root.display(),
            cli_program = %config.cli_program,
            cache_file = %config.cache_file.display(),
            "configuration loaded"
        );

        Ok(config)
    }

    fn read_config_file(project_root: &Path) -> Result<Option<ConfigFile>> {
        let path = project_root.join(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::file_system(&path, "read config file", e))?;
        let file = serde_json::from_str(&content).map_err(|e| {
            Error::configuration(format!("invalid {}: {e}", path.display()))
        })?;
        Ok(Some(file))
    }
}
