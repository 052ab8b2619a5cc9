//! Locating the JSON payload inside mixed CLI output

use serde_json::Value;

/// First complete JSON object or array in `text`.
///
/// The CLI may print warnings or progress lines around its JSON payload,
/// so every `{` or `[` is tried as a start position until one decodes.
pub fn extract_json_value(text: &str) -> Option<Value> {
    extract_starting_at(text, &['{', '['])
}

/// First complete JSON object in `text`
pub fn extract_json_object(text: &str) -> Option<Value> {
    extract_starting_at(text, &['{'])
}

fn extract_starting_at(text: &str, openers: &[char]) -> Option<Value> {
    text.char_indices()
        .filter(|(_, c)| openers.contains(c))
        .find_map(|(start, _)| {
            serde_json::Deserializer::from_str(&text[start..])
                .into_iter::<Value>()
                .next()
                .and_then(|decoded| decoded.ok())
        })
}
