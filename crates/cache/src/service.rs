//! Conflict cache service
//!
//! `ConflictCacheService` is the only component that writes cache entries.
//! Everything else reads through it or hands it a batch of outcomes to
//! record. Writes are per key and last-writer-wins; entries are advisory,
//! so two batches racing on the same key need no coordination.

use crate::keys::CacheKey;
use crate::storage::Storage;
use chrono::{SecondsFormat, Utc};
use forcebridge_core::{
    CacheEntry, Error, FileOutcome, FileProperties, Result, COMPANION_SOURCE_EXTENSIONS,
    META_FILE_SUFFIX,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Supplies the org and project a cache key is scoped to
pub trait WorkspaceIdentity: Send + Sync {
    /// Username or alias of the active org, if one is configured
    fn org_identity(&self) -> Option<String>;

    /// Absolute root of the active project
    fn project_root(&self) -> PathBuf;
}

/// Identity fixed for the lifetime of the process
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    org_identity: Option<String>,
    project_root: PathBuf,
}

impl StaticIdentity {
    pub fn new(org_identity: Option<String>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            org_identity,
            project_root: project_root.into(),
        }
    }
}

impl WorkspaceIdentity for StaticIdentity {
    fn org_identity(&self) -> Option<String> {
        self.org_identity.clone()
    }

    fn project_root(&self) -> PathBuf {
        self.project_root.clone()
    }
}

/// Where the timestamps of a recorded batch come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampSource {
    /// One "now" shared by the whole batch (push, pull, deploy)
    Now,
    /// A timestamp reported by the org for the whole batch
    Fixed(String),
}

impl TimestampSource {
    fn resolve(&self) -> String {
        match self {
            TimestampSource::Now => now_iso8601(),
            TimestampSource::Fixed(ts) => ts.clone(),
        }
    }
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2024-01-02T03:04:05.678Z`
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Keyed store of last-modified timestamps used for conflict detection
pub struct ConflictCacheService {
    storage: Arc<dyn Storage>,
    identity: Arc<dyn WorkspaceIdentity>,
}

impl ConflictCacheService {
    pub fn new(storage: Arc<dyn Storage>, identity: Arc<dyn WorkspaceIdentity>) -> Self {
        Self { storage, identity }
    }

    /// Canonical key for a file in the active org and project
    pub fn make_key(&self, metadata_type: &str, full_name: &str) -> Result<CacheKey> {
        let org = self.identity.org_identity().ok_or_else(|| {
            Error::configuration("no org identity is configured for conflict detection")
        })?;
        Ok(CacheKey::new(
            &org,
            &self.identity.project_root(),
            metadata_type,
            full_name,
        ))
    }

    pub fn get(&self, metadata_type: &str, full_name: &str) -> Result<Option<CacheEntry>> {
        let key = self.make_key(metadata_type, full_name)?;
        self.get_by_key(&key)
    }

    /// Store `entry` for the file; `None` clears it
    pub fn set(
        &self,
        metadata_type: &str,
        full_name: &str,
        entry: Option<CacheEntry>,
    ) -> Result<()> {
        let key = self.make_key(metadata_type, full_name)?;
        self.set_by_key(&key, entry)
    }

    pub fn get_by_key(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        match self.storage.get(key.as_str())? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::storage(key.as_str(), format!("malformed entry: {e}"))),
            None => Ok(None),
        }
    }

    pub fn set_by_key(&self, key: &CacheKey, entry: Option<CacheEntry>) -> Result<()> {
        let value = entry.map(serde_json::to_value).transpose()?;
        self.storage.update(key.as_str(), value)
    }

    /// Write one entry per outcome, all with the batch timestamp.
    ///
    /// Outcomes without a full name cannot be keyed and are skipped.
    /// Returns the number of entries written.
    pub fn record_batch(&self, outcomes: &[FileOutcome], timestamps: TimestampSource) -> Result<usize> {
        let last_modified_date = timestamps.resolve();
        let entry = serde_json::to_value(CacheEntry::new(last_modified_date.clone()))?;
        let mut updates = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let Some(full_name) = outcome.full_name.as_deref() else {
                tracing::warn!(
                    file_path = %outcome.file_path,
                    metadata_type = %outcome.metadata_type,
                    "skipping cache update for outcome without a full name"
                );
                continue;
            };
            let key = self.make_key(&outcome.metadata_type, full_name)?;
            updates.push((key.into_string(), Some(entry.clone())));
        }
        let written = updates.len();
        self.storage.update_many(updates)?;
        tracing::debug!(written, last_modified_date = %last_modified_date, "recorded cache batch");
        Ok(written)
    }

    /// Refresh entries after a push or pull, including companion
    /// `-meta.xml` descriptors the tool does not report on its own.
    pub fn update_after_push_pull(&self, outcomes: &[FileOutcome]) -> Result<usize> {
        let bolstered = bolster_companion_files(outcomes);
        self.record_batch(&bolstered, TimestampSource::Now)
    }

    /// Refresh entries after a deploy. The org reports at most one timestamp
    /// for the whole deployment; without it, "now" is used.
    pub fn update_after_deploy(
        &self,
        outcomes: &[FileOutcome],
        last_modified_date: Option<String>,
    ) -> Result<usize> {
        let timestamps = match last_modified_date {
            Some(ts) => TimestampSource::Fixed(ts),
            None => TimestampSource::Now,
        };
        self.record_batch(outcomes, timestamps)
    }

    /// Record the per-file remote timestamps returned by a retrieve
    pub fn record_retrieve(&self, files: &[FileProperties]) -> Result<usize> {
        let updates = files
            .iter()
            .map(|file| -> Result<(String, Option<serde_json::Value>)> {
                let key = self.make_key(&file.metadata_type, &file.full_name)?;
                let entry = serde_json::to_value(CacheEntry::new(file.last_modified_date.clone()))?;
                Ok((key.into_string(), Some(entry)))
            })
            .collect::<Result<Vec<_>>>()?;
        let written = updates.len();
        self.storage.update_many(updates)?;
        Ok(written)
    }
}

/// Append a `-meta.xml` sibling right after every class or component source
/// outcome, with the same metadata type. Outcomes without a file path are
/// not tied to a local file and are dropped.
pub fn bolster_companion_files(outcomes: &[FileOutcome]) -> Vec<FileOutcome> {
    let mut bolstered = Vec::with_capacity(outcomes.len() * 2);
    for outcome in outcomes.iter().filter(|o| !o.file_path.is_empty()) {
        bolstered.push(outcome.clone());
        let has_companion = COMPANION_SOURCE_EXTENSIONS
            .iter()
            .any(|ext| outcome.file_path.ends_with(ext));
        if has_companion {
            bolstered.push(FileOutcome {
                file_path: format!("{}{META_FILE_SUFFIX}", outcome.file_path),
                metadata_type: outcome.metadata_type.clone(),
                full_name: outcome
                    .full_name
                    .as_ref()
                    .map(|name| format!("{name}{META_FILE_SUFFIX}")),
                ..FileOutcome::default()
            });
        }
    }
    bolstered
}
