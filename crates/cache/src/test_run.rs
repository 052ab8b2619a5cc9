//! Last-used test-run parameters
//!
//! Re-running a test class or method without naming it falls back to the
//! last one that was run. The values live in the same durable storage as
//! the conflict cache, under keys that never contain the cache separator.

use crate::storage::Storage;
use forcebridge_core::Result;
use serde_json::Value;
use std::sync::Arc;

/// Which kind of test parameter is being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestParamKind {
    Class,
    Method,
}

impl TestParamKind {
    fn storage_key(self) -> &'static str {
        match self {
            TestParamKind::Class => "forcebridge.testRun.lastClass",
            TestParamKind::Method => "forcebridge.testRun.lastMethod",
        }
    }
}

pub struct TestRunParamCache {
    storage: Arc<dyn Storage>,
}

impl TestRunParamCache {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn last(&self, kind: TestParamKind) -> Result<Option<String>> {
        Ok(self
            .storage
            .get(kind.storage_key())?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    /// A non-empty `param` is remembered and returned; an empty or missing
    /// one resolves to the remembered value, if any.
    pub fn resolve(&self, kind: TestParamKind, param: Option<&str>) -> Result<Option<String>> {
        match param.map(str::trim).filter(|p| !p.is_empty()) {
            Some(param) => {
                self.storage
                    .update(kind.storage_key(), Some(Value::String(param.to_string())))?;
                Ok(Some(param.to_string()))
            }
            None => self.last(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn empty_param_resolves_to_last_used() -> Result<()> {
        let cache = TestRunParamCache::new(Arc::new(MemoryStorage::new()));

        assert_eq!(cache.resolve(TestParamKind::Class, None)?, None);
        assert_eq!(
            cache.resolve(TestParamKind::Class, Some("FooTest"))?,
            Some("FooTest".to_string())
        );
        assert_eq!(
            cache.resolve(TestParamKind::Class, Some("  "))?,
            Some("FooTest".to_string())
        );
        // Classes and methods are remembered separately
        assert_eq!(cache.resolve(TestParamKind::Method, None)?, None);
        Ok(())
    }
}
