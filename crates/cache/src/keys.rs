//! Canonical conflict-cache keys
//!
//! Keys have the shape `<org>#<project path>#<metadata type>#<full name>`.
//! A `#` inside a component is escaped with a backslash. Backslashes are
//! doubled only when they run up to a `#` or to the end of a component, so
//! Windows paths such as `C:\proj` render unchanged while the mapping from
//! tuples to keys stays injective.

use forcebridge_core::CACHE_KEY_SEPARATOR;
use std::fmt;
use std::path::Path;

/// Key of one file's entry in the conflict cache
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build the key for a file of `metadata_type`/`full_name` in the project
    /// at `project_path`, as seen from the org `org_identity`.
    pub fn new(
        org_identity: &str,
        project_path: &Path,
        metadata_type: &str,
        full_name: &str,
    ) -> Self {
        let project_path = project_path.to_string_lossy();
        let mut key = String::with_capacity(
            org_identity.len() + project_path.len() + metadata_type.len() + full_name.len() + 3,
        );
        for (i, part) in [org_identity, project_path.as_ref(), metadata_type, full_name]
            .into_iter()
            .enumerate()
        {
            if i > 0 {
                key.push(CACHE_KEY_SEPARATOR);
            }
            push_escaped(&mut key, part);
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn push_escaped(out: &mut String, part: &str) {
    // Backslashes seen but not yet written
    let mut run = 0;
    for c in part.chars() {
        match c {
            '\\' => run += 1,
            CACHE_KEY_SEPARATOR => {
                push_backslashes(out, run * 2 + 1);
                out.push(c);
                run = 0;
            }
            _ => {
                push_backslashes(out, run);
                out.push(c);
                run = 0;
            }
        }
    }
    push_backslashes(out, run * 2);
}

fn push_backslashes(out: &mut String, count: usize) {
    out.extend(std::iter::repeat('\\').take(count));
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
