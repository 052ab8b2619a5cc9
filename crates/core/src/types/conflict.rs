//! Conflict-detection cache values

use serde::{Deserialize, Serialize};

/// Value stored per file in the conflict cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// ISO-8601 timestamp of the last known remote modification
    pub last_modified_date: String,
}

impl CacheEntry {
    #[must_use]
    pub fn new(last_modified_date: impl Into<String>) -> Self {
        Self {
            last_modified_date: last_modified_date.into(),
        }
    }
}

/// Remote file properties returned by a retrieve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProperties {
    #[serde(rename = "type")]
    pub metadata_type: String,
    pub full_name: String,
    pub last_modified_date: String,
}
