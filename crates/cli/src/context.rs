use forcebridge_cache::{ConflictCacheService, FileStorage, StaticIdentity, TestRunParamCache};
use forcebridge_config::{BridgeConfig, ConfigLoader};
use forcebridge_core::Result;
use forcebridge_task::{ExecutionOrchestrator, SystemProcessExecutor};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a command needs, wired once at startup
pub struct Context {
    pub config: BridgeConfig,
    pub storage: Arc<FileStorage>,
    pub orchestrator: ExecutionOrchestrator,
}

impl Context {
    pub fn load(
        project: Option<PathBuf>,
        org: Option<String>,
        cli: Option<String>,
    ) -> Result<Self> {
        let mut loader = ConfigLoader::new().org_identity(org).cli_program(cli);
        if let Some(project) = project {
            loader = loader.directory(project);
        }
        let config = loader.load()?;

        let storage = Arc::new(FileStorage::open(&config.cache_file)?);
        let identity = Arc::new(StaticIdentity::new(
            config.org_identity.clone(),
            config.project_root.clone(),
        ));
        forcebridge_cache::initialize(ConflictCacheService::new(storage.clone(), identity))?;

        let orchestrator = ExecutionOrchestrator::from_global(
            config.clone(),
            Arc::new(SystemProcessExecutor::new()),
        )?;

        Ok(Self {
            config,
            storage,
            orchestrator,
        })
    }

    pub fn test_params(&self) -> TestRunParamCache {
        TestRunParamCache::new(self.storage.clone())
    }
}
