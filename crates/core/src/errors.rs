use std::path::PathBuf;

/// Result type alias for forcebridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for forcebridge operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A command could not be assembled from the given parameters
    #[error("invalid command: {reason}")]
    InvalidCommand { reason: String },

    /// The external program could not be started
    #[error("{}", format_spawn_error(.program, .args, .message))]
    Spawn {
        program: String,
        args: Vec<String>,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// A running process could not be supervised to completion
    #[error("process supervision failed for '{command}': {message}")]
    Supervision { command: String, message: String },

    /// Captured output did not contain a usable JSON payload
    #[error("failed to parse command output: {message}")]
    ParseFailure { message: String },

    /// The external tool ran but reported a failure
    #[error("{message}")]
    ToolReported { message: String, stack: Option<String> },

    /// The caller cancelled a running command before it exited
    #[error("'{command}' was cancelled")]
    Cancelled { command: String },

    /// A process-wide component was used before being initialized
    #[error("{component} has not been initialized")]
    NotInitialized { component: &'static str },

    /// A process-wide component was initialized twice
    #[error("{component} has already been initialized")]
    AlreadyInitialized { component: &'static str },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Durable storage errors
    #[error("storage error for key '{key}': {message}")]
    Storage { key: String, message: String },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

fn format_spawn_error(program: &str, args: &[String], message: &str) -> String {
    let args_str = args.join(" ");
    if args_str.is_empty() {
        format!("failed to spawn '{program}': {message}")
    } else {
        format!("failed to spawn '{program} {args_str}': {message}")
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create an invalid command error
    #[must_use]
    pub fn invalid_command(reason: impl Into<String>) -> Self {
        Error::InvalidCommand {
            reason: reason.into(),
        }
    }

    /// Create a spawn error from the underlying I/O failure
    #[must_use]
    pub fn spawn(program: impl Into<String>, args: Vec<String>, source: std::io::Error) -> Self {
        Error::Spawn {
            program: program.into(),
            args,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a supervision error
    #[must_use]
    pub fn supervision(command: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Supervision {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a parse failure error
    #[must_use]
    pub fn parse_failure(message: impl Into<String>) -> Self {
        Error::ParseFailure {
            message: message.into(),
        }
    }

    /// Create a tool-reported error
    #[must_use]
    pub fn tool_reported(message: impl Into<String>, stack: Option<String>) -> Self {
        Error::ToolReported {
            message: message.into(),
            stack,
        }
    }

    /// Create a not-initialized error
    #[must_use]
    pub fn not_initialized(component: &'static str) -> Self {
        Error::NotInitialized { component }
    }

    #[must_use]
    pub fn cancelled(command: impl Into<String>) -> Self {
        Error::Cancelled {
            command: command.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a storage error
    #[must_use]
    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Storage {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Whether the caller can recover by showing output and moving on
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ParseFailure { .. }
                | Error::ToolReported { .. }
                | Error::Spawn { .. }
                | Error::Cancelled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_error_renders_command_line() {
        let err = Error::spawn(
            "sfdx",
            vec!["force:source:pull".to_string(), "--json".to_string()],
            std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(
            err.to_string(),
            "failed to spawn 'sfdx force:source:pull --json': No such file or directory"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn cancellation_is_its_own_kind() {
        let err = Error::cancelled("sfdx force:source:push --json");
        assert_eq!(err.to_string(), "'sfdx force:source:push --json' was cancelled");
        assert!(!matches!(err, Error::ToolReported { .. }));
    }

    #[test]
    fn not_initialized_is_not_recoverable() {
        let err = Error::not_initialized("conflict cache");
        assert_eq!(err.to_string(), "conflict cache has not been initialized");
        assert!(!err.is_recoverable());
    }
}
