//! Decoding of the pull/push/deploy JSON contract
//!
//! Payload shape, by status:
//! - `0`: `result.<items field>` holds the per-file list. When the field is
//!   absent a top-level `partialSuccess` list marks incomplete work; with
//!   neither present the command acknowledged silently.
//! - `1`: `message`, `name`, `stack` and the failed items under `data`
//!   (preferred when non-empty) or the legacy `result`.

use super::{extract_json_object, ParsedResult};
use forcebridge_core::FileOutcome;
use serde::Deserialize;
use serde_json::Value;

/// Turns captured stdout into a typed result
pub trait ResultParser: Send + Sync {
    fn parse(&self, stdout: &str) -> ParsedResult;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    status: i64,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    stack: Option<String>,
    #[serde(default)]
    partial_success: Option<Vec<FileOutcome>>,
}

/// Parser for the source commands; they differ only in the name of the
/// success item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceResultParser {
    items_field: &'static str,
}

impl SourceResultParser {
    pub const fn new(items_field: &'static str) -> Self {
        Self { items_field }
    }

    pub const fn pull() -> Self {
        Self::new("pulledSource")
    }

    pub const fn push() -> Self {
        Self::new("pushedSource")
    }

    pub const fn deploy() -> Self {
        Self::new("deployedSource")
    }

    pub fn items_field(&self) -> &'static str {
        self.items_field
    }

    fn decode(&self, payload: Value) -> Option<ParsedResult> {
        let envelope: Envelope = serde_json::from_value(payload).ok()?;
        match envelope.status {
            0 => self.decode_success(envelope),
            1 => decode_error(envelope),
            other => {
                tracing::debug!(status = other, "unrecognized status in CLI payload");
                None
            }
        }
    }

    fn decode_success(&self, envelope: Envelope) -> Option<ParsedResult> {
        let listed = envelope
            .result
            .as_ref()
            .and_then(|result| result.get(self.items_field))
            .filter(|items| !items.is_null());
        if let Some(items) = listed {
            return Some(ParsedResult::Success {
                items: decode_items(items.clone())?,
            });
        }
        match envelope.partial_success {
            Some(items) => Some(ParsedResult::PartialSuccess { items }),
            None => Some(ParsedResult::Success { items: Vec::new() }),
        }
    }
}

fn decode_error(envelope: Envelope) -> Option<ParsedResult> {
    let data = match envelope.data {
        Some(Value::Array(items)) if !items.is_empty() => Some(items),
        _ => None,
    };
    let items = match (data, envelope.result) {
        (Some(items), _) => decode_items(Value::Array(items))?,
        (None, Some(result @ Value::Array(_))) => decode_items(result)?,
        _ => Vec::new(),
    };
    Some(ParsedResult::Error {
        message: envelope.message.unwrap_or_default(),
        name: envelope.name,
        stack: envelope.stack,
        items,
        partial_success: envelope.partial_success.unwrap_or_default(),
    })
}

fn decode_items(items: Value) -> Option<Vec<FileOutcome>> {
    serde_json::from_value(items)
        .map_err(|e| tracing::debug!(error = %e, "per-file items did not decode"))
        .ok()
}

impl ResultParser for SourceResultParser {
    fn parse(&self, stdout: &str) -> ParsedResult {
        extract_json_object(stdout)
            .and_then(|payload| self.decode(payload))
            .unwrap_or_else(|| ParsedResult::ParseFailure {
                raw_text: stdout.to_string(),
            })
    }
}
