//! Process-wide conflict cache accessor
//!
//! Callers that can pass an `Arc<ConflictCacheService>` explicitly should do
//! so. This accessor exists for call sites where threading the handle
//! through would be excessive. It must be initialized exactly once.

use crate::service::ConflictCacheService;
use forcebridge_core::{Error, Result};
use std::sync::{Arc, OnceLock};

const COMPONENT: &str = "conflict cache";

static CONFLICT_CACHE: OnceLock<Arc<ConflictCacheService>> = OnceLock::new();

/// Install the process-wide conflict cache
pub fn initialize(service: ConflictCacheService) -> Result<Arc<ConflictCacheService>> {
    let service = Arc::new(service);
    CONFLICT_CACHE
        .set(Arc::clone(&service))
        .map_err(|_| Error::AlreadyInitialized { component: COMPONENT })?;
    tracing::debug!("conflict cache initialized");
    Ok(service)
}

/// The process-wide conflict cache, if it has been initialized
pub fn instance() -> Result<Arc<ConflictCacheService>> {
    CONFLICT_CACHE
        .get()
        .cloned()
        .ok_or_else(|| Error::not_initialized(COMPONENT))
}
