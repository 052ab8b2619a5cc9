//! Crash-safe replacement of the conflict cache file

use forcebridge_core::{Error, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Replace `path` with `content` so readers see either the old or the new
/// file, never a torn write. Missing parent directories are created.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .map_err(|e| Error::file_system(dir.to_path_buf(), "create parent directory", e))?;

    let staged = staging_path(dir);
    if let Err(err) = stage(&staged, content) {
        let _ = fs::remove_file(&staged);
        return Err(err);
    }

    if let Err(e) = fs::rename(&staged, path) {
        let _ = fs::remove_file(&staged);
        return Err(Error::file_system(path.to_path_buf(), "replace file", e));
    }
    Ok(())
}

/// Same as [`write_atomic`] for text content
pub fn write_atomic_string(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

// Sibling of the target so the rename never crosses filesystems
fn staging_path(dir: &Path) -> PathBuf {
    dir.join(format!(".forcebridge-{}.tmp", Uuid::new_v4().simple()))
}

fn stage(staged: &Path, content: &[u8]) -> Result<()> {
    let mut file =
        File::create(staged).map_err(|e| Error::file_system(staged, "create staging file", e))?;
    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| Error::file_system(staged, "write staging file", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn staging_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    #[test]
    fn creates_missing_state_directory() {
        let temp_dir = TempDir::new().unwrap();
        let cache_file = temp_dir.path().join("state").join("conflict-cache.json");

        write_atomic_string(&cache_file, "{}").unwrap();

        assert_eq!(fs::read_to_string(&cache_file).unwrap(), "{}");
    }

    #[test]
    fn replaces_previous_cache_without_leftovers() {
        let temp_dir = TempDir::new().unwrap();
        let cache_file = temp_dir.path().join("conflict-cache.json");
        fs::write(&cache_file, r#"{"old":1}"#).unwrap();

        write_atomic(&cache_file, br#"{"new":2}"#).unwrap();

        assert_eq!(fs::read_to_string(&cache_file).unwrap(), r#"{"new":2}"#);
        assert_eq!(staging_files(temp_dir.path()), 0);
    }

    #[test]
    fn failed_replace_cleans_up_staging_file() {
        let temp_dir = TempDir::new().unwrap();
        // A directory cannot be replaced by a file
        let target = temp_dir.path().join("occupied");
        fs::create_dir_all(target.join("child")).unwrap();

        let err = write_atomic_string(&target, "{}").unwrap_err();

        assert!(matches!(err, Error::FileSystem { .. }));
        assert_eq!(staging_files(temp_dir.path()), 0);
    }
}
