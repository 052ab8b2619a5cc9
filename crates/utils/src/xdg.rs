use std::env;
use std::path::PathBuf;

/// XDG Base Directory paths for forcebridge
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_STATE_HOME/forcebridge or fallback
    pub fn state_dir() -> PathBuf {
        env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".local/state"))
                    .unwrap_or_else(|| PathBuf::from(".local/state"))
            })
            .join("forcebridge")
    }

    /// Default location of the durable conflict cache
    pub fn conflict_cache_file() -> PathBuf {
        Self::state_dir().join(forcebridge_core::CACHE_FILENAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn state_dir_honours_xdg_override() {
        let previous = env::var("XDG_STATE_HOME").ok();
        env::set_var("XDG_STATE_HOME", "/tmp/xdg-state");

        assert_eq!(XdgPaths::state_dir(), PathBuf::from("/tmp/xdg-state/forcebridge"));
        assert_eq!(
            XdgPaths::conflict_cache_file(),
            PathBuf::from("/tmp/xdg-state/forcebridge/conflict-cache.json")
        );

        match previous {
            Some(value) => env::set_var("XDG_STATE_HOME", value),
            None => env::remove_var("XDG_STATE_HOME"),
        }
    }
}
