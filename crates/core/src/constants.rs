/// Constants used throughout the forcebridge codebase
// External CLI
pub const DEFAULT_CLI_PROGRAM: &str = "sfdx";
pub const JSON_TO_STDOUT_VAR: &str = "SFDX_JSON_TO_STDOUT";

// Environment variable names
pub const FORCEBRIDGE_CLI_VAR: &str = "FORCEBRIDGE_CLI";
pub const FORCEBRIDGE_ORG_VAR: &str = "FORCEBRIDGE_ORG";
pub const FORCEBRIDGE_CACHE_FILE_VAR: &str = "FORCEBRIDGE_CACHE_FILE";
pub const FORCEBRIDGE_LOG_VAR: &str = "FORCEBRIDGE_LOG";

// Project configuration
pub const CONFIG_FILENAME: &str = "forcebridge.json";
pub const CACHE_FILENAME: &str = "conflict-cache.json";

// Companion metadata descriptors
pub const META_FILE_SUFFIX: &str = "-meta.xml";
pub const COMPANION_SOURCE_EXTENSIONS: &[&str] = &[".cls", ".cmp"];

// Cache key separator
pub const CACHE_KEY_SEPARATOR: char = '#';

// Live-tail broadcast capacity
pub const DEFAULT_STDOUT_CHANNEL_CAPACITY: usize = 256;
