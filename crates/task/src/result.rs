//! Typed results decoded from CLI output

mod json;
mod source;

pub use json::{extract_json_object, extract_json_value};
pub use source::{ResultParser, SourceResultParser};

use forcebridge_core::{Error, FileOutcome, Result};

/// Typed outcome of one CLI invocation's stdout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResult {
    /// Status 0 with the operation's item list
    Success { items: Vec<FileOutcome> },
    /// Status 0 without an item list but with `partialSuccess` entries
    PartialSuccess { items: Vec<FileOutcome> },
    /// Status 1; `items` are the per-file failures
    Error {
        message: String,
        name: Option<String>,
        stack: Option<String>,
        items: Vec<FileOutcome>,
        /// `partialSuccess` entries reported alongside the failure
        partial_success: Vec<FileOutcome>,
    },
    /// No recognizable payload
    ParseFailure { raw_text: String },
}

impl ParsedResult {
    /// Per-file outcomes reported by the tool, whatever the variant
    pub fn items(&self) -> &[FileOutcome] {
        match self {
            ParsedResult::Success { items }
            | ParsedResult::PartialSuccess { items }
            | ParsedResult::Error { items, .. } => items.as_slice(),
            ParsedResult::ParseFailure { .. } => &[],
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ParsedResult::Success { .. } | ParsedResult::PartialSuccess { .. }
        )
    }

    /// Outcomes that may be recorded in the conflict cache after a process
    /// exited with `exit_code`.
    ///
    /// A clean exit commits every successful item. After a non-zero exit only
    /// entries the tool positively marked as partial successes are kept.
    pub fn committable(&self, exit_code: i32) -> &[FileOutcome] {
        match (self, exit_code) {
            (ParsedResult::Success { items }, 0) => items.as_slice(),
            (ParsedResult::PartialSuccess { items }, _) => items.as_slice(),
            (
                ParsedResult::Error {
                    partial_success, ..
                },
                code,
            ) if code != 0 => partial_success.as_slice(),
            _ => &[],
        }
    }

    /// The failure this result describes, if any
    pub fn error(&self) -> Option<Error> {
        match self {
            ParsedResult::Error { message, stack, .. } => {
                Some(Error::tool_reported(message.clone(), stack.clone()))
            }
            ParsedResult::ParseFailure { raw_text } => Some(Error::parse_failure(format!(
                "no JSON payload in {} bytes of output",
                raw_text.len()
            ))),
            _ => None,
        }
    }

    /// Successful items, or the failure as an error
    pub fn into_result(self) -> Result<Vec<FileOutcome>> {
        if let Some(error) = self.error() {
            return Err(error);
        }
        match self {
            ParsedResult::Success { items } | ParsedResult::PartialSuccess { items } => Ok(items),
            _ => Ok(Vec::new()),
        }
    }
}
